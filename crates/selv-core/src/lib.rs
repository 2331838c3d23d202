//! selv core - change observation for struct fields
//!
//! This crate records every write to the tracked fields of an instance:
//! - Value snapshots that can never alias the live value
//! - A per-instance, time-ordered change ledger with flat and grouped views
//! - Change-aware map, list and set containers whose in-place mutations are
//!   recorded against the field holding them
//! - Per-type configuration: change sink, exclusions, private-field policy
//!   and per-field actions
//!
//! # Example
//!
//! ```
//! use selv_core::{HistoryFormat, MemorySink, TrackConfig, TrackedType};
//!
//! let sink = MemorySink::new();
//! let counter = TrackedType::new(
//!     "Counter",
//!     TrackConfig::builder().logger(sink.clone()).build()?,
//! )?;
//!
//! let tracker = counter.instance();
//! let mut value = tracker.field("value", 0)?;
//! value.update(|v| v + 1)?;
//!
//! assert_eq!(sink.lines()[1], "[Counter] value: 0 -> 1");
//! assert_eq!(tracker.query(None, HistoryFormat::Flat)?.len(), 2);
//! # Ok::<(), selv_core::SelvError>(())
//! ```

pub mod config;
pub mod containers;
pub mod errors;
pub mod history;
pub mod logging_facility;
pub mod observed;
pub mod render;
pub mod sink;
pub mod snapshot;
pub mod tracker;

pub use selv_core_types::schema;
pub use selv_core_types::{InstanceId, Sensitive};

pub use config::{FieldAction, LogTarget, TrackConfig, TrackConfigBuilder, TrackOptions};
pub use containers::{TrackedList, TrackedMap, TrackedSet};
pub use errors::{BoxError, Result, SelvError, SelvErrorKind};
pub use history::{ChangeHistory, ChangeRecord, FieldChange, History, HistoryFormat, HistoryQuery};
pub use observed::{Observed, SelfTracking};
pub use render::{change_line, render_history};
pub use sink::{ChangeSink, MemorySink, StdoutSink, TracingSink};
pub use snapshot::{Trackable, Value};
pub use tracker::{FieldBinding, Tracked, TrackedType, Tracker};
