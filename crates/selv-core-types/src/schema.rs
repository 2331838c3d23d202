//! Canonical schema constants for structured logging
//!
//! These constants keep the structured events emitted by the tracking core
//! consistent, so tests and log consumers can match on them.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_INSTANCE_ID: &str = "instance_id";
pub const FIELD_TYPE_NAME: &str = "type_name";

// Change identifiers
pub const FIELD_FIELD: &str = "field";
pub const FIELD_SEQ: &str = "seq";
pub const FIELD_INITIAL: &str = "initial";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_RECORDED: &str = "recorded";
pub const EVENT_SKIPPED: &str = "skipped";
pub const EVENT_LINE: &str = "line";
pub const EVENT_END_ERROR: &str = "end_error";

// Canonical operation names
pub const OP_SET: &str = "set";
pub const OP_MUTATE: &str = "mutate";
pub const OP_DISPATCH_ACTION: &str = "dispatch_action";
pub const OP_EMIT_LINE: &str = "emit_line";
