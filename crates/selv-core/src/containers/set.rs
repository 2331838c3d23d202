use std::fmt;
use std::hash::Hash;

use indexmap::{Equivalent, IndexSet};

use super::{before, commit, field_name};
use crate::errors::{Result, SelvError};
use crate::observed::Observed;
use crate::snapshot::{Trackable, Value};
use crate::tracker::FieldBinding;

/// Set whose mutations are recorded against its field
///
/// Iteration follows insertion order; snapshots are in canonical order, so
/// recorded values never depend on it.
pub struct TrackedSet<T> {
    inner: IndexSet<T>,
    binding: Option<FieldBinding>,
}

impl<T> TrackedSet<T> {
    pub fn new() -> Self {
        Self {
            inner: IndexSet::new(),
            binding: None,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> indexmap::set::Iter<'_, T> {
        self.inner.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.inner.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.inner.last()
    }

    pub fn as_inner(&self) -> &IndexSet<T> {
        &self.inner
    }

    pub fn into_inner(self) -> IndexSet<T> {
        self.inner
    }

    /// The field this set is stored in, if any
    pub fn binding(&self) -> Option<&FieldBinding> {
        self.binding.as_ref()
    }
}

impl<T: Hash + Eq> TrackedSet<T> {
    pub fn contains<Q>(&self, item: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        self.inner.contains(item)
    }

    pub fn is_subset(&self, other: &TrackedSet<T>) -> bool {
        self.inner.is_subset(&other.inner)
    }

    pub fn is_superset(&self, other: &TrackedSet<T>) -> bool {
        self.inner.is_superset(&other.inner)
    }
}

impl<T: Hash + Eq + Trackable + 'static> TrackedSet<T> {
    fn record(&self, before: Option<Value>) -> Result<()> {
        commit(self, self.binding.as_ref(), before)
    }

    fn before(&self) -> Option<Value> {
        before(self, self.binding.as_ref())
    }

    /// Add an item; returns false if it was already present
    ///
    /// A repeated insert is still recorded.
    ///
    /// # Errors
    ///
    /// Returns a callback error.
    pub fn insert(&mut self, item: T) -> Result<bool> {
        let before = self.before();
        let added = self.inner.insert(item);
        self.record(before)?;
        Ok(added)
    }

    /// Remove an item that must be present
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if the item is absent, or a callback error.
    pub fn remove<Q>(&mut self, item: &Q) -> Result<()>
    where
        Q: ?Sized + Hash + Equivalent<T> + fmt::Debug,
    {
        if !self.inner.contains(item) {
            return Err(SelvError::KeyNotFound {
                field: field_name(self.binding.as_ref()),
                key: format!("{item:?}"),
            });
        }
        let before = self.before();
        self.inner.shift_remove(item);
        self.record(before)
    }

    /// Remove an item if present; returns whether it was
    ///
    /// Recorded even when the item was absent.
    ///
    /// # Errors
    ///
    /// Returns a callback error.
    pub fn discard<Q>(&mut self, item: &Q) -> Result<bool>
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        let before = self.before();
        let removed = self.inner.shift_remove(item);
        self.record(before)?;
        Ok(removed)
    }

    /// Remove and return the most recently inserted item
    ///
    /// # Errors
    ///
    /// Returns `EmptyContainer` if the set is empty, or a callback error.
    pub fn pop(&mut self) -> Result<T> {
        let before = self.before();
        let Some(item) = self.inner.pop() else {
            return Err(SelvError::EmptyContainer {
                field: field_name(self.binding.as_ref()),
            });
        };
        self.record(before)?;
        Ok(item)
    }

    /// # Errors
    ///
    /// Returns a callback error.
    pub fn clear(&mut self) -> Result<()> {
        let before = self.before();
        self.inner.clear();
        self.record(before)
    }

    /// Add every item of `items` as one recorded change
    ///
    /// # Errors
    ///
    /// Returns a callback error.
    pub fn extend<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let before = self.before();
        self.inner.extend(items);
        self.record(before)
    }

    /// Keep only items also in `other`
    ///
    /// # Errors
    ///
    /// Returns a callback error.
    pub fn intersection_update<I>(&mut self, other: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let other: IndexSet<T> = other.into_iter().collect();
        let before = self.before();
        self.inner.retain(|item| other.contains(item));
        self.record(before)
    }

    /// Remove every item that is in `other`
    ///
    /// # Errors
    ///
    /// Returns a callback error.
    pub fn difference_update<I>(&mut self, other: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let other: IndexSet<T> = other.into_iter().collect();
        let before = self.before();
        self.inner.retain(|item| !other.contains(item));
        self.record(before)
    }

    /// Keep items in exactly one of `self` and `other`
    ///
    /// # Errors
    ///
    /// Returns a callback error.
    pub fn symmetric_difference_update<I>(&mut self, other: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let other: IndexSet<T> = other.into_iter().collect();
        let before = self.before();
        for item in other {
            if !self.inner.shift_remove(&item) {
                self.inner.insert(item);
            }
        }
        self.record(before)
    }
}

impl<T: Trackable> Trackable for TrackedSet<T> {
    fn snapshot(&self) -> Value {
        Value::set(self.inner.iter())
    }

    fn attach(&mut self, binding: FieldBinding) {
        self.binding = Some(binding);
    }

    fn detach(&mut self) {
        self.binding = None;
    }
}

/// Mutators of a set stored in a tracked field
impl<T: Hash + Eq + Trackable + 'static> Observed<TrackedSet<T>> {
    /// # Errors
    ///
    /// Same as [`TrackedSet::insert`].
    pub fn insert(&mut self, item: T) -> Result<bool> {
        self.current_mut().insert(item)
    }

    /// # Errors
    ///
    /// Same as [`TrackedSet::remove`].
    pub fn remove<Q>(&mut self, item: &Q) -> Result<()>
    where
        Q: ?Sized + Hash + Equivalent<T> + fmt::Debug,
    {
        self.current_mut().remove(item)
    }

    /// # Errors
    ///
    /// Same as [`TrackedSet::discard`].
    pub fn discard<Q>(&mut self, item: &Q) -> Result<bool>
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        self.current_mut().discard(item)
    }

    /// # Errors
    ///
    /// Same as [`TrackedSet::pop`].
    pub fn pop(&mut self) -> Result<T> {
        self.current_mut().pop()
    }

    /// # Errors
    ///
    /// Same as [`TrackedSet::clear`].
    pub fn clear(&mut self) -> Result<()> {
        self.current_mut().clear()
    }

    /// # Errors
    ///
    /// Same as [`TrackedSet::extend`].
    pub fn extend<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        self.current_mut().extend(items)
    }

    /// # Errors
    ///
    /// Same as [`TrackedSet::intersection_update`].
    pub fn intersection_update<I>(&mut self, other: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        self.current_mut().intersection_update(other)
    }

    /// # Errors
    ///
    /// Same as [`TrackedSet::difference_update`].
    pub fn difference_update<I>(&mut self, other: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        self.current_mut().difference_update(other)
    }

    /// # Errors
    ///
    /// Same as [`TrackedSet::symmetric_difference_update`].
    pub fn symmetric_difference_update<I>(&mut self, other: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        self.current_mut().symmetric_difference_update(other)
    }
}

impl<T> Default for TrackedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones are unbound
impl<T: Clone> Clone for TrackedSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            binding: None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for TrackedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T: Hash + Eq> PartialEq for TrackedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Hash + Eq> PartialEq<IndexSet<T>> for TrackedSet<T> {
    fn eq(&self, other: &IndexSet<T>) -> bool {
        self.inner == *other
    }
}

impl<T> From<IndexSet<T>> for TrackedSet<T> {
    fn from(inner: IndexSet<T>) -> Self {
        Self {
            inner,
            binding: None,
        }
    }
}

impl<T: Hash + Eq, const N: usize> From<[T; N]> for TrackedSet<T> {
    fn from(items: [T; N]) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Hash + Eq> FromIterator<T> for TrackedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<IndexSet<T>>())
    }
}

impl<'a, T> IntoIterator for &'a TrackedSet<T> {
    type Item = &'a T;
    type IntoIter = indexmap::set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackConfig;
    use crate::tracker::{TrackedType, Tracker};

    fn tracker() -> Tracker {
        TrackedType::new("Tags", TrackConfig::builder().no_logger().build().unwrap())
            .unwrap()
            .instance()
    }

    #[test]
    fn test_set_updates_follow_set_algebra() {
        let mut set = TrackedSet::from([1, 2, 3]);
        set.intersection_update([2, 3, 4]).unwrap();
        assert_eq!(set, TrackedSet::from([2, 3]));

        set.symmetric_difference_update([3, 5]).unwrap();
        assert_eq!(set, TrackedSet::from([2, 5]));

        set.difference_update([5]).unwrap();
        assert_eq!(set, TrackedSet::from([2]));
    }

    #[test]
    fn test_discard_missing_is_recorded_remove_missing_is_not() {
        let t = tracker();
        let mut tags = t.field("tags", TrackedSet::from(["a"])).unwrap();

        assert!(!tags.discard("z").unwrap());
        assert_eq!(t.len(), 2);

        let err = tags.remove("z").unwrap_err();
        assert_eq!(err.code(), "ERR_NOT_FOUND");
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_snapshot_is_canonical() {
        let t = tracker();
        let mut tags = t.field("tags", TrackedSet::from(["b"])).unwrap();
        tags.insert("a").unwrap();

        let last = t.latest("tags").unwrap();
        assert_eq!(last.from, Some(Value::set(["b"])));
        assert_eq!(last.to, Value::set(["a", "b"]));
        assert_eq!(last.to.to_string(), "{'a', 'b'}");
    }

    #[test]
    fn test_pop_empty_records_nothing() {
        let t = tracker();
        let mut tags = t.field("tags", TrackedSet::<i32>::new()).unwrap();
        assert!(tags.pop().is_err());
        assert_eq!(t.len(), 1);
    }
}
