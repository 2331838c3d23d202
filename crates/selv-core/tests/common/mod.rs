use std::sync::Arc;

use parking_lot::Mutex;
use selv_core::{
    BoxError, MemorySink, Observed, Result, TrackConfig, TrackConfigBuilder, Tracked, TrackedMap,
    TrackedType, Tracker,
};

/// Builder with change lines captured in `sink`
#[allow(dead_code)]
pub fn capturing(sink: &MemorySink) -> TrackConfigBuilder {
    TrackConfig::builder().logger(sink.clone())
}

/// Tracked type that records but never logs
#[allow(dead_code)]
pub fn quiet_type(name: &str) -> TrackedType {
    TrackedType::new(name, TrackConfig::builder().no_logger().build().unwrap()).unwrap()
}

/// Shared list of values seen by an action
#[allow(dead_code)]
pub fn recorder<T>() -> Arc<Mutex<Vec<T>>> {
    Arc::new(Mutex::new(Vec::new()))
}

/// Action error with a concrete type, for downcast assertions
#[allow(dead_code)]
#[derive(Debug, PartialEq)]
pub struct Rejected(pub String);

impl std::fmt::Display for Rejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rejected: {}", self.0)
    }
}

impl std::error::Error for Rejected {}

#[allow(dead_code)]
pub fn reject(reason: &str) -> BoxError {
    Box::new(Rejected(reason.to_string()))
}

/// Wrapped type with one integer field
#[allow(dead_code)]
pub struct Counter {
    tracker: Tracker,
    pub value: Observed<i64>,
}

#[allow(dead_code)]
impl Counter {
    pub fn new(ty: &TrackedType, start: i64) -> Result<Self> {
        let tracker = ty.instance();
        let value = tracker.field("value", start)?;
        Ok(Self { tracker, value })
    }

    pub fn increment(&mut self) -> Result<()> {
        self.value.update(|v| v + 1)
    }

    pub fn decrement(&mut self) -> Result<()> {
        self.value.update(|v| v - 1)
    }
}

impl Tracked for Counter {
    fn tracker(&self) -> &Tracker {
        &self.tracker
    }
}

/// Wrapped type holding a change-aware map
#[allow(dead_code)]
pub struct Shop {
    tracker: Tracker,
    pub name: Observed<String>,
    pub inventory: Observed<TrackedMap<String, i64>>,
}

#[allow(dead_code)]
impl Shop {
    pub fn new(ty: &TrackedType) -> Result<Self> {
        let tracker = ty.instance();
        let name = tracker.field("name", "corner".to_string())?;
        let inventory = tracker.field(
            "inventory",
            TrackedMap::from([("a".to_string(), 10), ("b".to_string(), 5)]),
        )?;
        Ok(Self {
            tracker,
            name,
            inventory,
        })
    }
}

impl Tracked for Shop {
    fn tracker(&self) -> &Tracker {
        &self.tracker
    }
}
