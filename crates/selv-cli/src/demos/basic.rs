//! Scalar, map, list, set and tuple fields on one model

use selv_core::{Observed, TrackedList, TrackedMap, TrackedSet, TrackedType, Tracker, Value};

use super::{DemoOptions, DemoResult};

struct DataModel {
    tracker: Tracker,
    name: Observed<String>,
    count: Observed<i64>,
    settings: Observed<TrackedMap<String, Value>>,
    tasks: Observed<TrackedList<String>>,
    tags: Observed<TrackedSet<String>>,
    coordinates: Observed<(i64, i64)>,
}

impl DataModel {
    fn new(ty: &TrackedType, name: &str) -> selv_core::Result<Self> {
        let tracker = ty.instance();
        Ok(Self {
            name: tracker.field("name", name.to_string())?,
            count: tracker.field("count", 0)?,
            settings: tracker.field(
                "settings",
                TrackedMap::from([
                    ("theme".to_string(), Value::from("light")),
                    ("notifications".to_string(), Value::from(true)),
                ]),
            )?,
            tasks: tracker.field("tasks", TrackedList::new())?,
            tags: tracker.field("tags", TrackedSet::new())?,
            coordinates: tracker.field("coordinates", (0, 0))?,
            tracker,
        })
    }
}

pub fn execute(options: &DemoOptions) -> DemoResult {
    let ty = TrackedType::new("DataModel", options.builder()?.build()?)?;
    let mut model = DataModel::new(&ty, "Test Model")?;

    model.name.set("Updated Model".to_string())?;
    model.count.update(|c| c + 5)?;

    model.settings.insert("theme".to_string(), Value::from("dark"))?;
    model.settings.insert("language".to_string(), Value::from("en"))?;
    model.settings.remove("notifications")?;

    model.tasks.push("Task 1".to_string())?;
    model.tasks.push("Task 2".to_string())?;
    model.tasks.replace(0, "Updated Task 1".to_string())?;

    model.tags.insert("important".to_string())?;
    model.tags.insert("urgent".to_string())?;
    model.tags.discard("urgent")?;

    model.coordinates.set((10, 20))?;

    options.narrate(format!(
        "\nFinal state: name={}, count={}, {} settings, {} tasks, {} tags, coordinates={:?}",
        *model.name,
        *model.count,
        model.settings.get().len(),
        model.tasks.get().len(),
        model.tags.get().len(),
        *model.coordinates,
    ));

    options.report(&model.tracker)
}
