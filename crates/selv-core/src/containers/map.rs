use std::fmt;
use std::hash::Hash;
use std::ops::Index;

use indexmap::{Equivalent, IndexMap};

use super::{before, commit, field_name};
use crate::errors::{Result, SelvError};
use crate::observed::Observed;
use crate::snapshot::{Trackable, Value};
use crate::tracker::FieldBinding;

/// Insertion-ordered map whose mutations are recorded against its field
pub struct TrackedMap<K, V> {
    inner: IndexMap<K, V>,
    binding: Option<FieldBinding>,
}

impl<K, V> TrackedMap<K, V> {
    pub fn new() -> Self {
        Self {
            inner: IndexMap::new(),
            binding: None,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.inner.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, K, V> {
        self.inner.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, K, V> {
        self.inner.values()
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.inner.first()
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.inner.last()
    }

    pub fn as_inner(&self) -> &IndexMap<K, V> {
        &self.inner
    }

    pub fn into_inner(self) -> IndexMap<K, V> {
        self.inner
    }

    /// The field this map is stored in, if any
    pub fn binding(&self) -> Option<&FieldBinding> {
        self.binding.as_ref()
    }
}

impl<K: Hash + Eq, V> TrackedMap<K, V> {
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.inner.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.inner.contains_key(key)
    }
}

impl<K, V> TrackedMap<K, V>
where
    K: Hash + Eq + Trackable + 'static,
    V: Trackable + 'static,
{
    fn record(&self, before: Option<Value>) -> Result<()> {
        commit(self, self.binding.as_ref(), before)
    }

    fn before(&self) -> Option<Value> {
        before(self, self.binding.as_ref())
    }

    /// Insert or replace an entry; returns the replaced value
    ///
    /// # Errors
    ///
    /// Returns `SinkFailed` or `ActionFailed` from the bound field's
    /// callbacks; the entry is inserted either way.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let before = self.before();
        let previous = self.inner.insert(key, value);
        self.record(before)?;
        Ok(previous)
    }

    /// Remove an entry, keeping the order of the others
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if the key is absent, or a callback error.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        Q: ?Sized + Hash + Equivalent<K> + fmt::Debug,
    {
        if !self.inner.contains_key(key) {
            return Err(SelvError::KeyNotFound {
                field: field_name(self.binding.as_ref()),
                key: format!("{key:?}"),
            });
        }

        let before = self.before();
        let removed = self.inner.shift_remove(key);
        self.record(before)?;
        removed.ok_or_else(|| SelvError::KeyNotFound {
            field: field_name(self.binding.as_ref()),
            key: format!("{key:?}"),
        })
    }

    /// Remove and return the most recently inserted entry
    ///
    /// # Errors
    ///
    /// Returns `EmptyContainer` if the map is empty, or a callback error.
    pub fn pop(&mut self) -> Result<(K, V)> {
        let before = self.before();
        let Some(entry) = self.inner.pop() else {
            return Err(SelvError::EmptyContainer {
                field: field_name(self.binding.as_ref()),
            });
        };
        self.record(before)?;
        Ok(entry)
    }

    /// Insert every entry of `entries` as one recorded change
    ///
    /// # Errors
    ///
    /// Returns a callback error.
    pub fn extend<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let before = self.before();
        self.inner.extend(entries);
        self.record(before)
    }

    /// Remove every entry
    ///
    /// # Errors
    ///
    /// Returns a callback error.
    pub fn clear(&mut self) -> Result<()> {
        let before = self.before();
        self.inner.clear();
        self.record(before)
    }

    /// Keep only the entries for which `keep` returns true
    ///
    /// # Errors
    ///
    /// Returns a callback error.
    pub fn retain<F>(&mut self, keep: F) -> Result<()>
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let before = self.before();
        self.inner.retain(keep);
        self.record(before)
    }
}

impl<K: Trackable, V: Trackable> Trackable for TrackedMap<K, V> {
    fn snapshot(&self) -> Value {
        Value::map(self.inner.iter())
    }

    fn attach(&mut self, binding: FieldBinding) {
        self.binding = Some(binding);
    }

    fn detach(&mut self) {
        self.binding = None;
    }
}

/// Mutators of a map stored in a tracked field
///
/// The bound map is never handed out by `&mut`, so it cannot be replaced or
/// swapped without going through [`Observed::set`].
impl<K, V> Observed<TrackedMap<K, V>>
where
    K: Hash + Eq + Trackable + 'static,
    V: Trackable + 'static,
{
    /// # Errors
    ///
    /// Same as [`TrackedMap::insert`].
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        self.current_mut().insert(key, value)
    }

    /// # Errors
    ///
    /// Same as [`TrackedMap::remove`].
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        Q: ?Sized + Hash + Equivalent<K> + fmt::Debug,
    {
        self.current_mut().remove(key)
    }

    /// # Errors
    ///
    /// Same as [`TrackedMap::pop`].
    pub fn pop(&mut self) -> Result<(K, V)> {
        self.current_mut().pop()
    }

    /// # Errors
    ///
    /// Same as [`TrackedMap::extend`].
    pub fn extend<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.current_mut().extend(entries)
    }

    /// # Errors
    ///
    /// Same as [`TrackedMap::clear`].
    pub fn clear(&mut self) -> Result<()> {
        self.current_mut().clear()
    }

    /// # Errors
    ///
    /// Same as [`TrackedMap::retain`].
    pub fn retain<F>(&mut self, keep: F) -> Result<()>
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.current_mut().retain(keep)
    }
}

impl<K, V> Default for TrackedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones are unbound
impl<K: Clone, V: Clone> Clone for TrackedMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            binding: None,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TrackedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for TrackedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq<IndexMap<K, V>> for TrackedMap<K, V> {
    fn eq(&self, other: &IndexMap<K, V>) -> bool {
        self.inner == *other
    }
}

impl<K, V> From<IndexMap<K, V>> for TrackedMap<K, V> {
    fn from(inner: IndexMap<K, V>) -> Self {
        Self {
            inner,
            binding: None,
        }
    }
}

impl<K: Hash + Eq, V, const N: usize> From<[(K, V); N]> for TrackedMap<K, V> {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for TrackedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<IndexMap<K, V>>())
    }
}

impl<'a, K, V> IntoIterator for &'a TrackedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<K, V, Q> Index<&Q> for TrackedMap<K, V>
where
    K: Hash + Eq,
    Q: ?Sized + Hash + Equivalent<K>,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        &self.inner[key]
    }
}
