//! Every container mutator, one recorded change each

use selv_core::{Observed, TrackedList, TrackedMap, TrackedSet, TrackedType, Tracker};

use super::{DemoOptions, DemoResult};

struct Workspace {
    tracker: Tracker,
    scores: Observed<TrackedMap<String, i64>>,
    queue: Observed<TrackedList<i64>>,
    labels: Observed<TrackedSet<String>>,
}

fn labels<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn execute(options: &DemoOptions) -> DemoResult {
    let ty = TrackedType::new("Workspace", options.builder()?.build()?)?;
    let tracker = ty.instance();
    let mut ws = Workspace {
        scores: tracker.field("scores", TrackedMap::new())?,
        queue: tracker.field("queue", TrackedList::from([5, 3, 8]))?,
        labels: tracker.field("labels", TrackedSet::from_iter(labels(["red", "green"])))?,
        tracker,
    };

    ws.scores.insert("alice".to_string(), 3)?;
    ws.scores.extend([("bob".to_string(), 7), ("carol".to_string(), 1)])?;
    ws.scores.retain(|_, score| *score > 1)?;
    let (last, score) = ws.scores.pop()?;
    options.narrate(format!("popped {last}={score}"));
    ws.scores.remove("alice")?;
    ws.scores.clear()?;

    ws.queue.push(1)?;
    ws.queue.sort()?;
    ws.queue.reverse()?;
    ws.queue.insert(1, 4)?;
    ws.queue.replace(0, 9)?;
    ws.queue.remove(2)?;
    ws.queue.truncate(3)?;
    ws.queue.extend([2, 6])?;
    ws.queue.sort_by(|a, b| b.cmp(a))?;
    ws.queue.pop()?;

    ws.labels.insert("blue".to_string())?;
    ws.labels.extend(labels(["yellow", "black"]))?;
    ws.labels.intersection_update(labels(["red", "blue", "yellow", "black"]))?;
    ws.labels.difference_update(labels(["black"]))?;
    ws.labels.symmetric_difference_update(labels(["blue", "white"]))?;
    ws.labels.remove("white")?;
    ws.labels.discard("purple")?;
    ws.labels.pop()?;

    options.narrate(format!(
        "scores={:?} queue={:?} labels={:?}",
        ws.scores.get(),
        ws.queue.get(),
        ws.labels.get()
    ));

    options.report(&ws.tracker)
}
