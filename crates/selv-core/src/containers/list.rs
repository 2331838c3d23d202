use std::fmt;
use std::ops::Deref;

use super::{before, commit, field_name};
use crate::errors::{Result, SelvError};
use crate::observed::Observed;
use crate::snapshot::{Trackable, Value};
use crate::tracker::FieldBinding;

/// Growable sequence whose mutations are recorded against its field
///
/// Reads go through `Deref<Target = [T]>`.
pub struct TrackedList<T> {
    inner: Vec<T>,
    binding: Option<FieldBinding>,
}

impl<T> TrackedList<T> {
    pub fn new() -> Self {
        Self {
            inner: Vec::new(),
            binding: None,
        }
    }

    pub fn as_inner(&self) -> &Vec<T> {
        &self.inner
    }

    pub fn into_inner(self) -> Vec<T> {
        self.inner
    }

    /// The field this list is stored in, if any
    pub fn binding(&self) -> Option<&FieldBinding> {
        self.binding.as_ref()
    }

    fn out_of_range(&self, index: usize) -> SelvError {
        SelvError::IndexOutOfRange {
            field: field_name(self.binding.as_ref()),
            index,
            len: self.inner.len(),
        }
    }
}

impl<T: Trackable + 'static> TrackedList<T> {
    fn record(&self, before: Option<Value>) -> Result<()> {
        commit(self, self.binding.as_ref(), before)
    }

    fn before(&self) -> Option<Value> {
        before(self, self.binding.as_ref())
    }

    /// Append an item
    ///
    /// # Errors
    ///
    /// Returns a callback error; the item is appended either way.
    pub fn push(&mut self, item: T) -> Result<()> {
        let before = self.before();
        self.inner.push(item);
        self.record(before)
    }

    /// Remove and return the last item
    ///
    /// # Errors
    ///
    /// Returns `EmptyContainer` if the list is empty, or a callback error.
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

    /// Insert an item at `index`, shifting later items right
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index > len`, or a callback error.
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        if index > self.inner.len() {
            return Err(self.out_of_range(index));
        }
        let before = self.before();
        self.inner.insert(index, item);
        self.record(before)
    }

    /// Replace the item at `index`; returns the old item
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index >= len`, or a callback error.
    pub fn replace(&mut self, index: usize, item: T) -> Result<T> {
        if index >= self.inner.len() {
            return Err(self.out_of_range(index));
        }
        let before = self.before();
        let old = std::mem::replace(&mut self.inner[index], item);
        self.record(before)?;
        Ok(old)
    }

    /// Remove and return the item at `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index >= len`, or a callback error.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        if index >= self.inner.len() {
            return Err(self.out_of_range(index));
        }
        let before = self.before();
        let item = self.inner.remove(index);
        self.record(before)?;
        Ok(item)
    }

    /// Append every item of `items` as one recorded change
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

    /// # Errors
    ///
    /// Returns a callback error.
    pub fn clear(&mut self) -> Result<()> {
        let before = self.before();
        self.inner.clear();
        self.record(before)
    }

    /// Keep the first `len` items
    ///
    /// # Errors
    ///
    /// Returns a callback error.
    pub fn truncate(&mut self, len: usize) -> Result<()> {
        let before = self.before();
        self.inner.truncate(len);
        self.record(before)
    }

    /// # Errors
    ///
    /// Returns a callback error.
    pub fn sort(&mut self) -> Result<()>
    where
        T: Ord,
    {
        let before = self.before();
        self.inner.sort();
        self.record(before)
    }

    /// Stable sort with a comparator
    ///
    /// # Errors
    ///
    /// Returns a callback error.
    pub fn sort_by<F>(&mut self, compare: F) -> Result<()>
    where
        F: FnMut(&T, &T) -> std::cmp::Ordering,
    {
        let before = self.before();
        self.inner.sort_by(compare);
        self.record(before)
    }

    /// # Errors
    ///
    /// Returns a callback error.
    pub fn reverse(&mut self) -> Result<()> {
        let before = self.before();
        self.inner.reverse();
        self.record(before)
    }
}

impl<T> Deref for TrackedList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.inner
    }
}

impl<T: Trackable> Trackable for TrackedList<T> {
    fn snapshot(&self) -> Value {
        Value::list(self.inner.iter())
    }

    fn attach(&mut self, binding: FieldBinding) {
        self.binding = Some(binding);
    }

    fn detach(&mut self) {
        self.binding = None;
    }
}

/// Mutators of a list stored in a tracked field
impl<T: Trackable + 'static> Observed<TrackedList<T>> {
    /// # Errors
    ///
    /// Same as [`TrackedList::push`].
    pub fn push(&mut self, item: T) -> Result<()> {
        self.current_mut().push(item)
    }

    /// # Errors
    ///
    /// Same as [`TrackedList::pop`].
    pub fn pop(&mut self) -> Result<T> {
        self.current_mut().pop()
    }

    /// # Errors
    ///
    /// Same as [`TrackedList::insert`].
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        self.current_mut().insert(index, item)
    }

    /// # Errors
    ///
    /// Same as [`TrackedList::replace`].
    pub fn replace(&mut self, index: usize, item: T) -> Result<T> {
        self.current_mut().replace(index, item)
    }

    /// # Errors
    ///
    /// Same as [`TrackedList::remove`].
    pub fn remove(&mut self, index: usize) -> Result<T> {
        self.current_mut().remove(index)
    }

    /// # Errors
    ///
    /// Same as [`TrackedList::extend`].
    pub fn extend<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        self.current_mut().extend(items)
    }

    /// # Errors
    ///
    /// Same as [`TrackedList::clear`].
    pub fn clear(&mut self) -> Result<()> {
        self.current_mut().clear()
    }

    /// # Errors
    ///
    /// Same as [`TrackedList::truncate`].
    pub fn truncate(&mut self, len: usize) -> Result<()> {
        self.current_mut().truncate(len)
    }

    /// # Errors
    ///
    /// Same as [`TrackedList::sort`].
    pub fn sort(&mut self) -> Result<()>
    where
        T: Ord,
    {
        self.current_mut().sort()
    }

    /// # Errors
    ///
    /// Same as [`TrackedList::sort_by`].
    pub fn sort_by<F>(&mut self, compare: F) -> Result<()>
    where
        F: FnMut(&T, &T) -> std::cmp::Ordering,
    {
        self.current_mut().sort_by(compare)
    }

    /// # Errors
    ///
    /// Same as [`TrackedList::reverse`].
    pub fn reverse(&mut self) -> Result<()> {
        self.current_mut().reverse()
    }
}

impl<T> Default for TrackedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones are unbound
impl<T: Clone> Clone for TrackedList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            binding: None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for TrackedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T: PartialEq> PartialEq for TrackedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: PartialEq> PartialEq<Vec<T>> for TrackedList<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.inner == *other
    }
}

impl<T: PartialEq> PartialEq<[T]> for TrackedList<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.inner.as_slice() == other
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for TrackedList<T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.inner.as_slice() == other.as_slice()
    }
}

impl<T> From<Vec<T>> for TrackedList<T> {
    fn from(inner: Vec<T>) -> Self {
        Self {
            inner,
            binding: None,
        }
    }
}

impl<T, const N: usize> From<[T; N]> for TrackedList<T> {
    fn from(items: [T; N]) -> Self {
        Vec::from(items).into()
    }
}

impl<T> FromIterator<T> for TrackedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<T>>().into()
    }
}

impl<'a, T> IntoIterator for &'a TrackedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
