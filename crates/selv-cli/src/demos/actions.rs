//! Field action recomputing a total after every inventory change

use selv_core::{Observed, TrackedMap, TrackedType, Tracker};

use super::{DemoOptions, DemoResult};

type Inventory = TrackedMap<String, i64>;

struct Store {
    tracker: Tracker,
    inventory: Observed<Inventory>,
}

pub fn execute(options: &DemoOptions) -> DemoResult {
    let config = options
        .builder()?
        .action::<Inventory, _>("inventory", |inventory| {
            let total: i64 = inventory.values().sum();
            println!("Total items in inventory: {total}");
            Ok(())
        })
        .build()?;
    let ty = TrackedType::new("Store", config)?;

    let tracker = ty.instance();
    let mut store = Store {
        inventory: tracker.field(
            "inventory",
            Inventory::from([("apples".to_string(), 10), ("bananas".to_string(), 5)]),
        )?,
        tracker,
    };

    store.inventory.insert("oranges".to_string(), 8)?;
    store.inventory.insert("apples".to_string(), 7)?;
    store.inventory.remove("bananas")?;

    options.report(&store.tracker)
}
