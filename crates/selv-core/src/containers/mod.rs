//! Change-aware containers
//!
//! [`TrackedMap`], [`TrackedList`] and [`TrackedSet`] read exactly like the
//! collections they wrap. Once stored in a tracked field they hold a
//! [`FieldBinding`], and every mutating method appends one record for that
//! field with the container's state before and after the call.
//!
//! A mutator whose precondition fails (missing key, bad index, empty
//! container) returns an error without touching the collection and records
//! nothing. Unbound containers, including clones, are plain collections.
//!
//! Observation is one level deep: mutating a collection nested inside a
//! tracked container is not seen.

mod list;
mod map;
mod set;

pub use list::TrackedList;
pub use map::TrackedMap;
pub use set::TrackedSet;

use std::any::Any;

use crate::errors::Result;
use crate::snapshot::{Trackable, Value};
use crate::tracker::FieldBinding;

const UNBOUND: &str = "<unbound>";

/// Snapshot taken before a mutation, only when the container is bound
fn before<C: Trackable>(container: &C, binding: Option<&FieldBinding>) -> Option<Value> {
    binding.map(|_| container.snapshot())
}

/// Record the mutation that happened since `before` was taken
fn commit<C: Trackable + Any>(
    container: &C,
    binding: Option<&FieldBinding>,
    before: Option<Value>,
) -> Result<()> {
    match (binding, before) {
        (Some(binding), Some(before)) => {
            binding.record_mutation(before, container.snapshot(), container)
        }
        _ => Ok(()),
    }
}

/// Field name used in container errors
fn field_name(binding: Option<&FieldBinding>) -> String {
    binding.map_or(UNBOUND, FieldBinding::field).to_string()
}
