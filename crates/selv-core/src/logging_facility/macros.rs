//! Canonical logging macros
//!
//! Every event carries `component`, `op` and `event` so log consumers and
//! tests can match on them.

/// Log a recorded change
///
/// # Example
///
/// ```
/// # use selv_core::log_change;
/// log_change!("set", type_name = "Counter", field = "value", seq = 0u64);
/// ```
#[macro_export]
macro_rules! log_change {
    ($op:expr) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_RECORDED,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_RECORDED,
            $($field)*
        );
    };
}

/// Log a write that was not recorded (excluded or private field)
///
/// # Example
///
/// ```
/// # use selv_core::log_skip;
/// log_skip!("set", field = "_cache");
/// ```
#[macro_export]
macro_rules! log_skip {
    ($op:expr) => {
        tracing::trace!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_SKIPPED,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::trace!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_SKIPPED,
            $($field)*
        );
    };
}

/// Log an operation error with its kind and stable code
///
/// # Example
///
/// ```
/// # use selv_core::{log_op_error, SelvError};
/// let err = SelvError::EmptyContainer { field: "items".to_string() };
/// log_op_error!("mutate", err, field = "items");
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr) => {{
        let err: &$crate::errors::SelvError = &$err;
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            err.kind = ?err.kind(),
            err.code = err.code(),
            "{}",
            err
        );
    }};
    ($op:expr, $err:expr, $($field:tt)*) => {{
        let err: &$crate::errors::SelvError = &$err;
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            err.kind = ?err.kind(),
            err.code = err.code(),
            $($field)*,
            "{}",
            err
        );
    }};
}
