use thiserror::Error;

/// Result type alias using SelvError
pub type Result<T> = std::result::Result<T, SelvError>;

/// Error type returned by caller-supplied callbacks (actions and sinks)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling and in tests, independent of the message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelvErrorKind {
    /// Invalid wrapping options, field declarations or query selectors
    Configuration,
    /// A registered field action returned an error
    Action,
    /// The configured change sink returned an error
    Logging,
    /// A container removal named a key or element that is not present
    NotFound,
    /// A container index was out of range, or the container was empty
    OutOfRange,
    /// I/O failure while loading configuration
    Io,
}

impl SelvErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            SelvErrorKind::Configuration => "ERR_CONFIGURATION",
            SelvErrorKind::Action => "ERR_ACTION",
            SelvErrorKind::Logging => "ERR_LOGGING",
            SelvErrorKind::NotFound => "ERR_NOT_FOUND",
            SelvErrorKind::OutOfRange => "ERR_OUT_OF_RANGE",
            SelvErrorKind::Io => "ERR_IO",
        }
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for tracking operations
#[derive(Error, Debug)]
pub enum SelvError {
    // ===== Configuration Errors =====
    /// Invalid wrapping options, duplicate field declaration or contradictory query
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// An action was registered for a different value type than the field holds
    #[error("Action for field '{field}' expects {expected}, but the field holds {actual}")]
    ActionTypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {reason}")]
    ConfigParse { reason: String },

    // ===== Callback Errors =====
    /// A field action failed; `source` is the callback's own error
    #[error("Action for field '{field}' failed: {source}")]
    ActionFailed {
        field: String,
        #[source]
        source: BoxError,
    },

    /// The change sink failed to accept a change line
    #[error("Change sink failed while logging field '{field}': {source}")]
    SinkFailed {
        field: String,
        #[source]
        source: BoxError,
    },

    // ===== Container Errors =====
    /// Removal of a key or element that is not in the container
    #[error("Key not found in field '{field}': {key}")]
    KeyNotFound { field: String, key: String },

    /// Index outside the bounds of a sequence
    #[error("Index {index} out of range for field '{field}' (len {len})")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },

    /// Pop from an empty container
    #[error("Cannot pop from empty container in field '{field}'")]
    EmptyContainer { field: String },

    // ===== IO =====
    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SelvError {
    /// Shorthand for an `InvalidConfiguration` error
    pub fn configuration(reason: impl Into<String>) -> Self {
        SelvError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> SelvErrorKind {
        match self {
            SelvError::InvalidConfiguration { .. }
            | SelvError::ActionTypeMismatch { .. }
            | SelvError::ConfigParse { .. } => SelvErrorKind::Configuration,
            SelvError::ActionFailed { .. } => SelvErrorKind::Action,
            SelvError::SinkFailed { .. } => SelvErrorKind::Logging,
            SelvError::KeyNotFound { .. } => SelvErrorKind::NotFound,
            SelvError::IndexOutOfRange { .. } | SelvError::EmptyContainer { .. } => {
                SelvErrorKind::OutOfRange
            }
            SelvError::Io(_) => SelvErrorKind::Io,
        }
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Field the error is attributed to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            SelvError::ActionTypeMismatch { field, .. }
            | SelvError::ActionFailed { field, .. }
            | SelvError::SinkFailed { field, .. }
            | SelvError::KeyNotFound { field, .. }
            | SelvError::IndexOutOfRange { field, .. }
            | SelvError::EmptyContainer { field } => Some(field),
            _ => None,
        }
    }

    /// The error returned by a failing action or sink callback, unmodified
    ///
    /// Use `downcast_ref` on the result to recover the callback's concrete
    /// error type.
    pub fn callback_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            SelvError::ActionFailed { source, .. } | SelvError::SinkFailed { source, .. } => {
                Some(source.as_ref())
            }
            _ => None,
        }
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        self.kind() == SelvErrorKind::Configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom")
        }
    }

    impl std::error::Error for Boom {}

    #[test]
    fn test_kind_code_mapping() {
        let kinds = vec![
            (SelvErrorKind::Configuration, "ERR_CONFIGURATION"),
            (SelvErrorKind::Action, "ERR_ACTION"),
            (SelvErrorKind::Logging, "ERR_LOGGING"),
            (SelvErrorKind::NotFound, "ERR_NOT_FOUND"),
            (SelvErrorKind::OutOfRange, "ERR_OUT_OF_RANGE"),
            (SelvErrorKind::Io, "ERR_IO"),
        ];

        for (kind, expected_code) in kinds {
            assert_eq!(kind.code(), expected_code);
        }
    }

    #[test]
    fn test_type_mismatch_is_configuration() {
        let err = SelvError::ActionTypeMismatch {
            field: "x".to_string(),
            expected: "i64",
            actual: "String",
        };
        assert!(err.is_configuration());
        assert_eq!(err.field(), Some("x"));
    }

    #[test]
    fn test_callback_error_is_downcastable() {
        let err = SelvError::ActionFailed {
            field: "x".to_string(),
            source: Box::new(Boom),
        };

        assert_eq!(err.code(), "ERR_ACTION");
        let source = err.callback_error().expect("callback error present");
        assert!(source.downcast_ref::<Boom>().is_some());
        assert_eq!(err.to_string(), "Action for field 'x' failed: boom");
    }

    #[test]
    fn test_container_errors_have_out_of_range_kind() {
        let empty = SelvError::EmptyContainer {
            field: "items".to_string(),
        };
        let index = SelvError::IndexOutOfRange {
            field: "items".to_string(),
            index: 4,
            len: 2,
        };
        assert_eq!(empty.kind(), SelvErrorKind::OutOfRange);
        assert_eq!(index.kind(), SelvErrorKind::OutOfRange);
        assert!(index.to_string().contains("len 2"));
    }
}
