//! Value snapshots
//!
//! A [`Value`] is an alias-free copy of a field's value taken at the moment
//! it is stored. History entries hold snapshots rather than references to the
//! live value, so mutating the live value later can never rewrite history.
//!
//! ## Equality Rules
//!
//! - Different variants are never equal (`Int(1)` != `Float(1.0)`)
//! - Floats use IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//! - `Map` equality ignores entry order, like the collections it captures
//! - `Set` members are stored in canonical order, so equality ignores the
//!   order the source set iterated in

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use selv_core_types::Sensitive;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::tracker::FieldBinding;

/// Snapshot of a tracked value
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value inside a field (e.g. `Option::None`, `()`)
    None,
    /// Boolean
    Bool(bool),
    /// Any integer type, widened
    Int(i128),
    /// Any float type, widened
    Float(f64),
    /// Strings and chars
    Str(String),
    /// Fixed-size sequences (tuples, arrays)
    Tuple(Vec<Value>),
    /// Growable sequences
    List(Vec<Value>),
    /// Key-value pairs in the source map's iteration order
    Map(Vec<(Value, Value)>),
    /// Set members in canonical order
    Set(Vec<Value>),
    /// A value with no structural snapshot, identified by type name only
    Opaque(String),
    /// A value that must never be rendered
    Redacted,
}

impl Value {
    /// Snapshot of any trackable value
    pub fn of<T: Trackable + ?Sized>(value: &T) -> Value {
        value.snapshot()
    }

    /// Opaque snapshot for a value identified only by its type name
    pub fn opaque(type_name: impl Into<String>) -> Value {
        Value::Opaque(type_name.into())
    }

    /// Build a `Map` snapshot from pairs, keeping their order
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Value
    where
        K: Trackable,
        V: Trackable,
    {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.snapshot(), v.snapshot()))
                .collect(),
        )
    }

    /// Build a `List` snapshot
    pub fn list<T: Trackable>(items: impl IntoIterator<Item = T>) -> Value {
        Value::List(items.into_iter().map(|item| item.snapshot()).collect())
    }

    /// Build a `Tuple` snapshot
    pub fn tuple<T: Trackable>(items: impl IntoIterator<Item = T>) -> Value {
        Value::Tuple(items.into_iter().map(|item| item.snapshot()).collect())
    }

    /// Build a `Set` snapshot; members are put in canonical order
    pub fn set<T: Trackable>(items: impl IntoIterator<Item = T>) -> Value {
        Value::Set(canonical(
            items.into_iter().map(|item| item.snapshot()).collect(),
        ))
    }

    /// Returns the variant name (for error messages)
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "Str",
            Value::Tuple(_) => "Tuple",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Set(_) => "Set",
            Value::Opaque(_) => "Opaque",
            Value::Redacted => "Redacted",
        }
    }

    /// Check if this value is `None`
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Members of a tuple, list or set
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Entries of a map
    pub fn as_pairs(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Look up a map entry by string key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_pairs()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Membership: an item of a sequence or set, or a key of a map
    pub fn contains(&self, item: &Value) -> bool {
        match self {
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => {
                items.iter().any(|v| v == item)
            }
            Value::Map(pairs) => pairs.iter().any(|(k, _)| k == item),
            Value::Str(s) => item.as_str().is_some_and(|needle| s.contains(needle)),
            _ => false,
        }
    }

    /// Number of members of a container snapshot
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => Some(items.len()),
            Value::Map(pairs) => Some(pairs.len()),
            Value::Str(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::None => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::Tuple(_) => 4,
            Value::List(_) => 5,
            Value::Map(_) => 6,
            Value::Set(_) => 7,
            Value::Opaque(_) => 8,
            Value::Redacted => 9,
        }
    }

    /// Total order used to put set members and hash-map keys in canonical order
    ///
    /// Numbers compare by magnitude across `Int` and `Float`; other variants
    /// compare within their kind and by a fixed kind rank across kinds.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
            (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)).then(Ordering::Greater),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Opaque(a), Value::Opaque(b)) => a.cmp(b),
            (Value::Tuple(a), Value::Tuple(b))
            | (Value::List(a), Value::List(b))
            | (Value::Set(a), Value::Set(b)) => cmp_seq(a, b),
            (Value::Map(a), Value::Map(b)) => {
                a.len().cmp(&b.len()).then_with(|| {
                    a.iter()
                        .zip(b.iter())
                        .map(|((ka, va), (kb, vb))| ka.total_cmp(kb).then_with(|| va.total_cmp(vb)))
                        .find(|o| *o != Ordering::Equal)
                        .unwrap_or(Ordering::Equal)
                })
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn cmp_seq(a: &[Value], b: &[Value]) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

fn canonical(mut items: Vec<Value>) -> Vec<Value> {
    items.sort_by(Value::total_cmp);
    items.dedup();
    items
}

fn canonical_pairs(mut pairs: Vec<(Value, Value)>) -> Vec<(Value, Value)> {
    pairs.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    pairs
}

/// Entries ordered by key, then value, for order-free comparison
fn sorted_pairs(pairs: &[(Value, Value)]) -> Vec<&(Value, Value)> {
    let mut sorted: Vec<_> = pairs.iter().collect();
    sorted.sort_by(|(ka, va), (kb, vb)| ka.total_cmp(kb).then_with(|| va.total_cmp(vb)));
    sorted
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Redacted, Value::Redacted) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && sorted_pairs(a)
                        .into_iter()
                        .zip(sorted_pairs(b))
                        .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
            }
            // Different variants: never equal
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i.into())
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// JSON-friendly serialization: maps with string keys become objects, other
/// maps become arrays of `[key, value]` pairs, opaque and redacted values
/// become their rendered text.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::None => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => match i64::try_from(*i) {
                Ok(small) => serializer.serialize_i64(small),
                Err(_) => serializer.serialize_i128(*i),
            },
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(pairs) if pairs.iter().all(|(k, _)| k.as_str().is_some()) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Map(pairs) => {
                let mut seq = serializer.serialize_seq(Some(pairs.len()))?;
                for pair in pairs {
                    seq.serialize_element(&[&pair.0, &pair.1])?;
                }
                seq.end()
            }
            Value::Opaque(_) | Value::Redacted => serializer.serialize_str(&self.to_string()),
        }
    }
}

// ============================================================================
// Trackable
// ============================================================================

/// A value that can be stored in a tracked field
///
/// `snapshot` captures the value's current state. `attach` is called when
/// the value is stored into a tracked field; change-aware containers keep the
/// binding so their in-place mutations are recorded against that field.
/// `detach` drops it again when the value leaves the field. Plain values
/// ignore both.
pub trait Trackable {
    /// Capture the current state of the value
    fn snapshot(&self) -> Value;

    /// Bind the value to the field it is being stored into
    fn attach(&mut self, binding: FieldBinding) {
        let _ = binding;
    }

    /// Forget the field the value was stored in
    fn detach(&mut self) {}
}

/// Implement [`Trackable`] for types that should be recorded by identity only
///
/// Their snapshots render as `TypeName instance`.
///
/// ```
/// struct Engine;
/// selv_core::impl_trackable_opaque!(Engine);
///
/// use selv_core::Trackable;
/// assert_eq!(Engine.snapshot().to_string(), "Engine instance");
/// ```
#[macro_export]
macro_rules! impl_trackable_opaque {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Trackable for $ty {
                fn snapshot(&self) -> $crate::Value {
                    $crate::Value::opaque(stringify!($ty))
                }
            }
        )+
    };
}

macro_rules! int_trackable {
    ($($t:ty),*) => {
        $(
            impl Trackable for $t {
                fn snapshot(&self) -> Value {
                    Value::Int(*self as i128)
                }
            }
        )*
    };
}

int_trackable!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

macro_rules! tuple_trackable {
    ($($name:ident),+) => {
        impl<$($name: Trackable),+> Trackable for ($($name,)+) {
            #[allow(non_snake_case)]
            fn snapshot(&self) -> Value {
                let ($($name,)+) = self;
                Value::Tuple(vec![$($name.snapshot()),+])
            }
        }
    };
}

tuple_trackable!(A);
tuple_trackable!(A, B);
tuple_trackable!(A, B, C);
tuple_trackable!(A, B, C, D);
tuple_trackable!(A, B, C, D, E);
tuple_trackable!(A, B, C, D, E, F);

impl Trackable for bool {
    fn snapshot(&self) -> Value {
        Value::Bool(*self)
    }
}

impl Trackable for f64 {
    fn snapshot(&self) -> Value {
        Value::Float(*self)
    }
}

impl Trackable for f32 {
    fn snapshot(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl Trackable for char {
    fn snapshot(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl Trackable for str {
    fn snapshot(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl Trackable for String {
    fn snapshot(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl Trackable for () {
    fn snapshot(&self) -> Value {
        Value::None
    }
}

impl Trackable for Value {
    fn snapshot(&self) -> Value {
        self.clone()
    }
}

impl<T: Trackable> Trackable for Option<T> {
    fn snapshot(&self) -> Value {
        match self {
            Some(value) => value.snapshot(),
            None => Value::None,
        }
    }
}

impl<T: Trackable + ?Sized> Trackable for &T {
    fn snapshot(&self) -> Value {
        (**self).snapshot()
    }
}

impl<T: Trackable + ?Sized> Trackable for Box<T> {
    fn snapshot(&self) -> Value {
        (**self).snapshot()
    }

    fn attach(&mut self, binding: FieldBinding) {
        (**self).attach(binding)
    }

    fn detach(&mut self) {
        (**self).detach()
    }
}

impl<T: Trackable + ?Sized> Trackable for Rc<T> {
    fn snapshot(&self) -> Value {
        (**self).snapshot()
    }
}

impl<T: Trackable + ?Sized> Trackable for Arc<T> {
    fn snapshot(&self) -> Value {
        (**self).snapshot()
    }
}

impl<T> Trackable for Sensitive<T> {
    fn snapshot(&self) -> Value {
        Value::Redacted
    }
}

impl<T: Trackable, const N: usize> Trackable for [T; N] {
    fn snapshot(&self) -> Value {
        Value::Tuple(self.iter().map(Trackable::snapshot).collect())
    }
}

impl<T: Trackable> Trackable for Vec<T> {
    fn snapshot(&self) -> Value {
        Value::List(self.iter().map(Trackable::snapshot).collect())
    }
}

impl<T: Trackable> Trackable for VecDeque<T> {
    fn snapshot(&self) -> Value {
        Value::List(self.iter().map(Trackable::snapshot).collect())
    }
}

impl<K: Trackable, V: Trackable, S: BuildHasher> Trackable for HashMap<K, V, S> {
    fn snapshot(&self) -> Value {
        Value::Map(canonical_pairs(
            self.iter().map(|(k, v)| (k.snapshot(), v.snapshot())).collect(),
        ))
    }
}

impl<K: Trackable, V: Trackable> Trackable for BTreeMap<K, V> {
    fn snapshot(&self) -> Value {
        Value::map(self.iter())
    }
}

impl<K: Trackable, V: Trackable, S> Trackable for IndexMap<K, V, S> {
    fn snapshot(&self) -> Value {
        Value::map(self.iter())
    }
}

impl<T: Trackable, S: BuildHasher> Trackable for HashSet<T, S> {
    fn snapshot(&self) -> Value {
        Value::set(self.iter())
    }
}

impl<T: Trackable> Trackable for BTreeSet<T> {
    fn snapshot(&self) -> Value {
        Value::set(self.iter())
    }
}

impl<T: Trackable, S> Trackable for IndexSet<T, S> {
    fn snapshot(&self) -> Value {
        Value::set(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_snapshots() {
        assert_eq!(5u8.snapshot(), Value::Int(5));
        assert_eq!((-3i64).snapshot(), Value::Int(-3));
        assert_eq!(true.snapshot(), Value::Bool(true));
        assert_eq!("hi".snapshot(), Value::Str("hi".to_string()));
        assert_eq!(Option::<i32>::None.snapshot(), Value::None);
        assert_eq!(Some(2).snapshot(), Value::Int(2));
    }

    #[test]
    fn test_no_type_coercion() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::List(vec![]), Value::Tuple(vec![]));
        assert_ne!(Value::None, Value::Str(String::new()));
    }

    #[test]
    fn test_float_equality_is_ieee() {
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_eq!(Value::Float(-0.0), Value::Float(0.0));
    }

    #[test]
    fn test_snapshot_is_alias_free() {
        let mut items = vec![1, 2, 3];
        let before = items.snapshot();
        items.push(4);
        assert_eq!(before, Value::list([1, 2, 3]));
        assert_eq!(items.snapshot(), Value::list([1, 2, 3, 4]));
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let a = Value::map([("a", 10), ("b", 5)]);
        let b = Value::map([("b", 5), ("a", 10)]);
        assert_eq!(a, b);
        assert_ne!(a, Value::map([("a", 10)]));
    }

    #[test]
    fn test_map_equality_compares_every_entry() {
        let repeated = Value::map([("a", 1), ("a", 1)]);
        let distinct = Value::map([("a", 1), ("b", 2)]);
        assert_ne!(repeated, distinct);
        assert_ne!(distinct, repeated);
        assert_ne!(Value::map([("a", 1), ("b", 1)]), Value::map([("a", 1), ("b", 2)]));
    }

    #[test]
    fn test_set_snapshot_is_canonical() {
        let set: HashSet<i32> = [3, 1, 2].into_iter().collect();
        assert_eq!(set.snapshot(), Value::Set(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn test_hash_map_snapshot_sorted_by_key() {
        let map: HashMap<&str, i32> = [("b", 2), ("a", 1)].into_iter().collect();
        let pairs = map.snapshot();
        let keys: Vec<_> = pairs
            .as_pairs()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_tuple_and_array_snapshots() {
        assert_eq!((1, "x").snapshot(), Value::Tuple(vec![Value::Int(1), Value::from("x")]));
        assert_eq!([1, 2, 3].snapshot(), Value::tuple([1, 2, 3]));
    }

    #[test]
    fn test_sensitive_snapshot_is_redacted() {
        let secret = Sensitive::new("hunter2".to_string());
        assert_eq!(secret.snapshot(), Value::Redacted);
    }

    #[test]
    fn test_map_get_and_contains() {
        let v = Value::map([("a", 10), ("b", 5)]);
        assert_eq!(v.get("a"), Some(&Value::Int(10)));
        assert!(v.contains(&Value::from("b")));
        assert!(!v.contains(&Value::from("c")));
        assert_eq!(v.len(), Some(2));
    }

    #[test]
    fn test_total_cmp_orders_numbers_across_kinds() {
        let mut items = vec![Value::Float(2.5), Value::Int(3), Value::Int(1)];
        items.sort_by(Value::total_cmp);
        assert_eq!(items, vec![Value::Int(1), Value::Float(2.5), Value::Int(3)]);
    }

    #[test]
    fn test_serialize_string_keyed_map_as_object() {
        let v = Value::map([("a", 1)]);
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_serialize_non_string_keyed_map_as_pairs() {
        let v = Value::map([(1, "one")]);
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"[[1,"one"]]"#);
    }
}
