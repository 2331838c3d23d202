//! Observable field holder

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use selv_core_types::schema::OP_SET;

use crate::errors::Result;
use crate::log_skip;
use crate::snapshot::Trackable;
use crate::tracker::Tracker;

/// Nested tracked structs reachable by `&mut` through a parent's field
///
/// The nested struct records into its own ledger and holds no binding to
/// the parent, so the parent records nothing for its in-place changes.
/// Change-aware containers do not implement it: their mutators are reached
/// through the forwarding methods on `Observed<TrackedMap<..>>` and friends,
/// which never hand out the bound container itself.
pub trait SelfTracking: Trackable {}

/// A field of a tracked instance
///
/// Reads go through `Deref`. Writes go through [`set`](Self::set), which
/// records the change before storing the value.
///
/// The holder's own methods shadow same-named methods of the value; call
/// e.g. `field.get().get(key)` to reach a map's `get`.
///
/// A container field is mutated through forwarding methods such as
/// `field.insert(k, v)`; it cannot be overwritten in place:
///
/// ```compile_fail
/// use selv_core::{TrackConfig, TrackedMap, TrackedType};
///
/// let ty = TrackedType::new("Shop", TrackConfig::builder().no_logger().build().unwrap()).unwrap();
/// let tracker = ty.instance();
/// let mut stock = tracker.field("stock", TrackedMap::from([("a", 1)])).unwrap();
/// *stock = TrackedMap::new();
/// ```
///
/// nor exchanged with another field's container:
///
/// ```compile_fail
/// use selv_core::{TrackConfig, TrackedList, TrackedType};
///
/// let ty = TrackedType::new("Queue", TrackConfig::builder().no_logger().build().unwrap()).unwrap();
/// let tracker = ty.instance();
/// let mut a = tracker.field("a", TrackedList::from([1])).unwrap();
/// let mut b = tracker.field("b", TrackedList::from([2])).unwrap();
/// std::mem::swap(&mut *a, &mut *b);
/// ```
pub struct Observed<T> {
    name: Arc<str>,
    current: T,
    tracker: Option<Tracker>,
}

impl<T> Observed<T> {
    pub(crate) fn tracked(name: Arc<str>, value: T, tracker: Tracker) -> Self {
        Self {
            name,
            current: value,
            tracker: Some(tracker),
        }
    }

    pub(crate) fn untracked(name: Arc<str>, value: T) -> Self {
        Self {
            name,
            current: value,
            tracker: None,
        }
    }

    pub fn get(&self) -> &T {
        &self.current
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// False for excluded fields and untracked private fields
    pub fn is_tracked(&self) -> bool {
        self.tracker.is_some()
    }

    pub fn tracker(&self) -> Option<&Tracker> {
        self.tracker.as_ref()
    }

    /// Bound value, for the container forwarding methods only
    pub(crate) fn current_mut(&mut self) -> &mut T {
        &mut self.current
    }
}

impl<T: Trackable + 'static> Observed<T> {
    /// Assign a new value
    ///
    /// The record is appended and the value stored before the change line
    /// is emitted and the field's action runs.
    ///
    /// # Errors
    ///
    /// Returns `SinkFailed` or `ActionFailed` if a callback fails; the new
    /// value is kept and recorded either way.
    pub fn set(&mut self, value: T) -> Result<()> {
        let Some(tracker) = &self.tracker else {
            log_skip!(OP_SET, field = &*self.name);
            self.current = value;
            return Ok(());
        };

        let mut value = value;
        let record = tracker.store(&self.name, &mut value);
        self.current = value;
        tracker.notify(&record, &self.current)
    }

    /// Move the value out of the field
    ///
    /// A change-aware container loses its binding, so later mutations of
    /// the returned value are not recorded.
    pub fn into_inner(mut self) -> T {
        self.current.detach();
        self.current
    }

    /// Assign `f(current)`
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set).
    pub fn update<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.current);
        self.set(next)
    }
}

impl<T> Deref for Observed<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.current
    }
}

impl<T: SelfTracking> DerefMut for Observed<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.current
    }
}

impl<T: fmt::Debug> fmt::Debug for Observed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observed")
            .field("name", &self.name)
            .field("value", &self.current)
            .field("tracked", &self.is_tracked())
            .finish()
    }
}

impl<T: fmt::Display> fmt::Display for Observed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.current.fmt(f)
    }
}

impl<T: PartialEq> PartialEq<T> for Observed<T> {
    fn eq(&self, other: &T) -> bool {
        self.current == *other
    }
}
