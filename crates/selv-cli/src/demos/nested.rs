//! A tracked struct stored in a field of another tracked struct
//!
//! The child records into its own ledger; the parent records the child once,
//! as an opaque value, when the field is declared.

use selv_core::{impl_trackable_opaque, Observed, SelfTracking, TrackedType, Tracker};

use super::{DemoOptions, DemoResult};

struct Child {
    tracker: Tracker,
    value: Observed<i64>,
}

impl_trackable_opaque!(Child);
impl SelfTracking for Child {}

struct Parent {
    tracker: Tracker,
    child: Observed<Child>,
}

pub fn execute(options: &DemoOptions) -> DemoResult {
    let config = options.builder()?.build()?;
    let child_type = TrackedType::new("Child", config.clone())?;
    let parent_type = TrackedType::new("Parent", config)?;

    let child_tracker = child_type.instance();
    let child = Child {
        value: child_tracker.field("value", 100)?,
        tracker: child_tracker,
    };

    let parent_tracker = parent_type.instance();
    let mut parent = Parent {
        child: parent_tracker.field("child", child)?,
        tracker: parent_tracker,
    };

    parent.child.value.set(200)?;

    options.report(&parent.tracker)?;
    options.report(&parent.child.tracker)
}
