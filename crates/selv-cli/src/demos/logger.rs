//! Change lines routed through a caller-supplied logger

use chrono::Local;
use selv_core::{Observed, TrackedType, Tracker};

use super::{DemoOptions, DemoResult};

struct Counter {
    tracker: Tracker,
    value: Observed<i64>,
}

impl Counter {
    fn increment(&mut self) -> selv_core::Result<()> {
        self.value.update(|v| v + 1)
    }
}

pub fn execute(options: &DemoOptions) -> DemoResult {
    let config = options
        .builder()?
        .logger_fn(|line| {
            println!("[{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), line);
            Ok(())
        })
        .build()?;
    let ty = TrackedType::new("Counter", config)?;

    let tracker = ty.instance();
    let mut counter = Counter {
        value: tracker.field("value", 0)?,
        tracker,
    };

    counter.increment()?;
    counter.increment()?;

    options.report(&counter.tracker)
}
