//! Core types shared across the selv crates
//!
//! This crate provides foundational types used by the tracking core,
//! its logging facility and the CLI:
//!
//! - **Identity types**: InstanceId for tracked instances
//! - **Sensitive data**: Sensitive<T> marker for automatic redaction
//! - **Schema constants**: Canonical field keys and event names

pub mod identity;
pub mod schema;
pub mod sensitive;

pub use identity::InstanceId;
pub use sensitive::Sensitive;
