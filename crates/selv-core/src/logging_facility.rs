//! Structured logging facility for selv
//!
//! This module provides:
//! - Single initialization point via `init(profile)`
//! - Structured logging macros (`log_change!`, `log_skip!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! The tracking core only emits `tracing` events; it never installs a
//! subscriber itself. Binaries call `init` once at startup.
//!
//! # Usage
//!
//! ```rust
//! use selv_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
