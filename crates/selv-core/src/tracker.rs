//! Interception layer
//!
//! A [`TrackedType`] holds the shared configuration for one wrapped type.
//! Each instance of that type owns a [`Tracker`], which records every write
//! to the instance's fields in its own [`ChangeHistory`].
//!
//! Recording a write is a fixed sequence:
//!
//! 1. snapshot the new value and append `{from, to}` under the instance lock
//! 2. bind change-aware containers to the field
//! 3. release the lock, then emit the change line through the sink
//! 4. run the field's action with the stored value
//!
//! Sink and action failures surface to the writer after the record exists.

use std::any::{type_name, Any};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use selv_core_types::schema::{OP_DISPATCH_ACTION, OP_EMIT_LINE, OP_MUTATE, OP_SET};
use selv_core_types::InstanceId;

use crate::config::{validate_field_name, TrackConfig};
use crate::errors::{Result, SelvError};
use crate::history::{ChangeHistory, ChangeRecord, FieldChange, History, HistoryFormat, HistoryQuery};
use crate::observed::Observed;
use crate::render;
use crate::snapshot::{Trackable, Value};
use crate::{log_change, log_op_error, log_skip};

/// Shared tracking setup for one wrapped type
#[derive(Debug, Clone)]
pub struct TrackedType {
    name: Arc<str>,
    config: Arc<TrackConfig>,
}

impl TrackedType {
    /// Register a wrapped type under `name` (used in change lines)
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `name` is empty.
    pub fn new(name: impl Into<String>, config: TrackConfig) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SelvError::configuration("tracked type name must not be empty"));
        }
        Ok(Self {
            name: Arc::from(name),
            config: Arc::new(config),
        })
    }

    /// Register a wrapped type with the default configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `name` is empty.
    pub fn with_defaults(name: impl Into<String>) -> Result<Self> {
        Self::new(name, TrackConfig::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    /// Start recording for a new instance
    pub fn instance(&self) -> Tracker {
        Tracker {
            inner: Arc::new(TrackerInner {
                id: InstanceId::new(),
                type_name: Arc::clone(&self.name),
                config: Arc::clone(&self.config),
                state: Mutex::new(TrackerState::default()),
            }),
        }
    }
}

#[derive(Default)]
struct TrackerState {
    history: ChangeHistory,
    declared: HashSet<String>,
}

struct TrackerInner {
    id: InstanceId,
    type_name: Arc<str>,
    config: Arc<TrackConfig>,
    state: Mutex<TrackerState>,
}

/// Per-instance recorder; clones share the same ledger
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<TrackerInner>,
}

impl Tracker {
    pub fn id(&self) -> &InstanceId {
        &self.inner.id
    }

    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    pub fn config(&self) -> &TrackConfig {
        &self.inner.config
    }

    /// Declare a field and perform its initial write
    ///
    /// Excluded fields and (when private tracking is off) fields starting
    /// with `_` come back as plain holders that never record.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` if the name is not an identifier or was
    ///   already declared on this instance
    /// - `ActionTypeMismatch` if the field's action expects another type
    /// - `SinkFailed` / `ActionFailed` if the initial write's callbacks fail
    pub fn field<T: Trackable + 'static>(&self, name: &str, value: T) -> Result<Observed<T>> {
        validate_field_name(name)?;

        let tracked = self.config().is_tracked(name);
        if tracked {
            if let Some(action) = self.config().action(name) {
                if !action.accepts::<T>() {
                    return Err(SelvError::ActionTypeMismatch {
                        field: name.to_string(),
                        expected: action.expected_type(),
                        actual: type_name::<T>(),
                    });
                }
            }
        }

        if !self.inner.state.lock().declared.insert(name.to_string()) {
            return Err(SelvError::configuration(format!(
                "field '{name}' declared twice on {}",
                self.type_name()
            )));
        }

        let name: Arc<str> = Arc::from(name);
        if !tracked {
            log_skip!(
                OP_SET,
                instance_id = %self.id(),
                type_name = self.type_name(),
                field = &*name,
            );
            return Ok(Observed::untracked(name, value));
        }

        let mut value = value;
        let record = self.store(&name, &mut value);
        let observed = Observed::tracked(Arc::clone(&name), value, self.clone());
        self.notify(&record, observed.get())?;
        Ok(observed)
    }

    /// Append a direct write and bind the value to its field
    pub(crate) fn store<T: Trackable>(&self, field: &Arc<str>, value: &mut T) -> ChangeRecord {
        let to = value.snapshot();
        let record = self.append(OP_SET, field, to, |history| {
            history.latest(field).map(|latest| latest.to.clone())
        });
        value.attach(FieldBinding {
            field: Arc::clone(field),
            tracker: self.clone(),
        });
        record
    }

    fn append<F>(&self, op: &'static str, field: &str, to: Value, from: F) -> ChangeRecord
    where
        F: FnOnce(&ChangeHistory) -> Option<Value>,
    {
        let record = {
            let mut state = self.inner.state.lock();
            let from = from(&state.history);
            state.history.record(field, from, to).clone()
        };

        log_change!(
            op,
            instance_id = %self.id(),
            type_name = self.type_name(),
            field = field,
            seq = record.seq,
            initial = record.is_initial(),
        );
        record
    }

    /// Emit the change line, then run the field's action
    ///
    /// Called with the instance lock released.
    pub(crate) fn notify(&self, record: &ChangeRecord, raw: &dyn Any) -> Result<()> {
        let config = self.config();

        if let Some(sink) = config.logger() {
            let line = render::change_line(self.type_name(), record);
            if let Err(source) = sink.emit(&line) {
                let err = SelvError::SinkFailed {
                    field: record.field.clone(),
                    source,
                };
                log_op_error!(OP_EMIT_LINE, err, type_name = self.type_name(), field = %record.field);
                return Err(err);
            }
        }

        if let Some(action) = config.action(&record.field) {
            if let Err(source) = action.invoke(raw) {
                let err = SelvError::ActionFailed {
                    field: record.field.clone(),
                    source,
                };
                log_op_error!(
                    OP_DISPATCH_ACTION,
                    err,
                    type_name = self.type_name(),
                    field = %record.field
                );
                return Err(err);
            }
        }

        Ok(())
    }

    // ===== Queries =====

    /// Query the ledger
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `field` is combined with
    /// [`HistoryFormat::Grouped`].
    pub fn query(&self, field: Option<&str>, format: HistoryFormat) -> Result<History> {
        let mut query = HistoryQuery::new().format(format);
        if let Some(field) = field {
            query = query.field(field);
        }
        self.run_query(&query)
    }

    /// Run a prepared query against the ledger
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for contradictory selectors.
    pub fn run_query(&self, query: &HistoryQuery) -> Result<History> {
        self.inner.state.lock().history.query(query)
    }

    /// Every record, oldest first
    pub fn history(&self) -> Vec<ChangeRecord> {
        self.inner.state.lock().history.records().to_vec()
    }

    /// Records of one field, oldest first
    pub fn history_of(&self, field: &str) -> Vec<ChangeRecord> {
        self.inner
            .state
            .lock()
            .history
            .for_field(field)
            .cloned()
            .collect()
    }

    /// Records grouped by field, fields in first-seen order
    pub fn grouped(&self) -> IndexMap<String, Vec<FieldChange>> {
        self.inner.state.lock().history.grouped()
    }

    /// Most recent record of a field
    pub fn latest(&self, field: &str) -> Option<ChangeRecord> {
        self.inner.state.lock().history.latest(field).cloned()
    }

    /// Fields with at least one record
    pub fn fields(&self) -> Vec<String> {
        self.inner
            .state
            .lock()
            .history
            .fields()
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("id", &self.inner.id)
            .field("type_name", &self.inner.type_name)
            .field("records", &self.len())
            .finish()
    }
}

/// A container's link to the field and instance it is stored in
#[derive(Clone)]
pub struct FieldBinding {
    field: Arc<str>,
    tracker: Tracker,
}

impl FieldBinding {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Record an in-place mutation of the bound value
    ///
    /// `raw` is the value after the mutation; it is handed to the field's
    /// action.
    ///
    /// # Errors
    ///
    /// Returns `SinkFailed` or `ActionFailed`; the record is appended either
    /// way.
    pub fn record_mutation(&self, before: Value, after: Value, raw: &dyn Any) -> Result<()> {
        let record = self.tracker.append(OP_MUTATE, &self.field, after, |_| Some(before));
        self.tracker.notify(&record, raw)
    }
}

impl fmt::Debug for FieldBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("field", &self.field)
            .field("type_name", &self.tracker.type_name())
            .finish()
    }
}

/// Implemented by wrapped structs to expose their change history
pub trait Tracked {
    fn tracker(&self) -> &Tracker;

    /// Query the instance's change history
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `field` is combined with
    /// [`HistoryFormat::Grouped`].
    fn change_history(&self, field: Option<&str>, format: HistoryFormat) -> Result<History> {
        self.tracker().query(field, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn quiet(name: &str) -> TrackedType {
        TrackedType::new(name, TrackConfig::builder().no_logger().build().unwrap()).unwrap()
    }

    #[test]
    fn test_empty_type_name_is_rejected() {
        let err = TrackedType::new("  ", TrackConfig::default()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_instances_have_independent_ledgers() {
        let ty = quiet("Point");
        let a = ty.instance();
        let b = ty.instance();

        let mut x = a.field("x", 1).unwrap();
        let _y = b.field("x", 5).unwrap();
        x.set(2).unwrap();

        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 1);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_duplicate_declaration_is_rejected() {
        let tracker = quiet("Dup").instance();
        let _first = tracker.field("x", 1).unwrap();
        let err = tracker.field("x", 2).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_action_type_mismatch_on_declaration() {
        let config = TrackConfig::builder()
            .no_logger()
            .action::<String, _>("count", |_| Ok(()))
            .build()
            .unwrap();
        let tracker = TrackedType::new("Typed", config).unwrap().instance();

        let err = tracker.field("count", 3i64).unwrap_err();
        assert!(matches!(err, SelvError::ActionTypeMismatch { .. }));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_initial_write_emits_initialized_line() {
        let sink = MemorySink::new();
        let config = TrackConfig::builder().logger(sink.clone()).build().unwrap();
        let tracker = TrackedType::new("Counter", config).unwrap().instance();

        let mut value = tracker.field("value", 0).unwrap();
        value.set(1).unwrap();

        assert_eq!(
            sink.lines(),
            vec!["[Counter] value = 0 (initialized)", "[Counter] value: 0 -> 1"]
        );
    }

    #[test]
    fn test_query_convenience_methods() {
        let tracker = quiet("Q").instance();
        let mut a = tracker.field("a", 1).unwrap();
        let _b = tracker.field("b", true).unwrap();
        a.set(2).unwrap();

        assert_eq!(tracker.history_of("a").len(), 2);
        assert_eq!(tracker.latest("a").unwrap().to, Value::Int(2));
        assert_eq!(tracker.fields(), vec!["a", "b"]);
        assert_eq!(tracker.grouped()["b"].len(), 1);
        assert!(tracker.query(Some("a"), HistoryFormat::Grouped).is_err());
    }
}
