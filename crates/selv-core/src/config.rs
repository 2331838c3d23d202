//! Wrapping configuration
//!
//! [`TrackConfig`] is built once per tracked type and shared read-only by all
//! of its instances. [`TrackOptions`] is the serializable subset (everything
//! except callbacks) that binaries load from TOML.

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{BoxError, Result, SelvError};
use crate::sink::{ChangeSink, StdoutSink, TracingSink};

type ActionCallback = dyn Fn(&dyn Any) -> std::result::Result<(), BoxError> + Send + Sync;

/// A per-field reaction callback, typed by the value it expects
#[derive(Clone)]
pub struct FieldAction {
    value_type: TypeId,
    type_name: &'static str,
    callback: Arc<ActionCallback>,
}

impl FieldAction {
    /// Wrap a typed callback
    pub fn new<T, F>(f: F) -> Self
    where
        T: 'static,
        F: Fn(&T) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        let callback = move |raw: &dyn Any| match raw.downcast_ref::<T>() {
            Some(value) => f(value),
            None => Err(format!("action expected a value of type {}", type_name::<T>()).into()),
        };

        Self {
            value_type: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            callback: Arc::new(callback),
        }
    }

    /// True if the callback takes values of type `T`
    pub fn accepts<T: 'static>(&self) -> bool {
        self.value_type == TypeId::of::<T>()
    }

    /// Name of the value type the callback takes
    pub fn expected_type(&self) -> &'static str {
        self.type_name
    }

    /// Run the callback against a stored value
    ///
    /// # Errors
    ///
    /// Returns the callback's own error, or a type error if `raw` is not the
    /// expected type.
    pub fn invoke(&self, raw: &dyn Any) -> std::result::Result<(), BoxError> {
        (self.callback)(raw)
    }
}

impl fmt::Debug for FieldAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAction")
            .field("expects", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// True for fields whose name marks them private (leading underscore)
pub fn is_private(name: &str) -> bool {
    name.starts_with('_')
}

/// Check that a field name is a plain identifier
///
/// # Errors
///
/// Returns `InvalidConfiguration` for empty names or names containing
/// anything but ASCII letters, digits and underscores (or starting with a
/// digit).
pub fn validate_field_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(SelvError::configuration(format!(
            "'{name}' is not a valid field name"
        )))
    }
}

/// Immutable per-type tracking configuration
#[derive(Clone)]
pub struct TrackConfig {
    track_private: bool,
    logger: Option<Arc<dyn ChangeSink>>,
    exclude: BTreeSet<String>,
    actions: HashMap<String, FieldAction>,
}

impl Default for TrackConfig {
    /// Private fields tracked, lines printed to stdout, nothing excluded
    fn default() -> Self {
        Self {
            track_private: true,
            logger: Some(Arc::new(StdoutSink)),
            exclude: BTreeSet::new(),
            actions: HashMap::new(),
        }
    }
}

impl TrackConfig {
    pub fn builder() -> TrackConfigBuilder {
        TrackConfigBuilder::default()
    }

    /// Build a configuration from a deserialized options record
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if an excluded name is not a valid
    /// field name.
    pub fn from_options(options: &TrackOptions) -> Result<Self> {
        Self::builder().with_options(options).build()
    }

    pub fn track_private(&self) -> bool {
        self.track_private
    }

    pub fn logger(&self) -> Option<&Arc<dyn ChangeSink>> {
        self.logger.as_ref()
    }

    pub fn excluded(&self) -> impl Iterator<Item = &str> {
        self.exclude.iter().map(String::as_str)
    }

    pub fn is_excluded(&self, field: &str) -> bool {
        self.exclude.contains(field)
    }

    /// True if writes to `field` are recorded
    pub fn is_tracked(&self, field: &str) -> bool {
        !self.is_excluded(field) && (self.track_private || !is_private(field))
    }

    pub fn action(&self, field: &str) -> Option<&FieldAction> {
        self.actions.get(field)
    }
}

impl fmt::Debug for TrackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<_> = self.actions.keys().collect();
        actions.sort();
        f.debug_struct("TrackConfig")
            .field("track_private", &self.track_private)
            .field("logger", &self.logger.is_some())
            .field("exclude", &self.exclude)
            .field("actions", &actions)
            .finish()
    }
}

/// Builder for [`TrackConfig`]; all checks happen in [`build`](Self::build)
pub struct TrackConfigBuilder {
    track_private: bool,
    logger: Option<Arc<dyn ChangeSink>>,
    exclude: Vec<String>,
    actions: Vec<(String, FieldAction)>,
}

impl Default for TrackConfigBuilder {
    fn default() -> Self {
        Self {
            track_private: true,
            logger: Some(Arc::new(StdoutSink)),
            exclude: Vec::new(),
            actions: Vec::new(),
        }
    }
}

impl TrackConfigBuilder {
    /// Whether fields starting with `_` are recorded (default true)
    pub fn track_private(mut self, track: bool) -> Self {
        self.track_private = track;
        self
    }

    /// Send change lines to `sink`
    pub fn logger<S: ChangeSink + 'static>(mut self, sink: S) -> Self {
        self.logger = Some(Arc::new(sink));
        self
    }

    /// Send change lines to a closure
    pub fn logger_fn<F>(self, f: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.logger(f)
    }

    /// Send change lines to an already shared sink
    pub fn shared_logger(mut self, sink: Arc<dyn ChangeSink>) -> Self {
        self.logger = Some(sink);
        self
    }

    /// Do not emit change lines at all
    pub fn no_logger(mut self) -> Self {
        self.logger = None;
        self
    }

    /// Never record the named fields
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn exclude_field(mut self, field: impl Into<String>) -> Self {
        self.exclude.push(field.into());
        self
    }

    /// Run `f` with the stored value after every recorded write to `field`
    pub fn action<T, F>(mut self, field: impl Into<String>, f: F) -> Self
    where
        T: 'static,
        F: Fn(&T) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.actions.push((field.into(), FieldAction::new(f)));
        self
    }

    /// Apply a deserialized options record on top of the current settings
    pub fn with_options(mut self, options: &TrackOptions) -> Self {
        self.track_private = options.track_private;
        self.exclude.extend(options.exclude.iter().cloned());
        self.logger = options.log.sink();
        self
    }

    /// Validate and freeze the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when an excluded or action field name
    /// is not an identifier, when a field has two actions, or when an action
    /// targets a field that would never be recorded.
    pub fn build(self) -> Result<TrackConfig> {
        let mut exclude = BTreeSet::new();
        for field in self.exclude {
            validate_field_name(&field)?;
            exclude.insert(field);
        }

        let mut actions = HashMap::new();
        for (field, action) in self.actions {
            validate_field_name(&field)?;
            if exclude.contains(&field) {
                return Err(SelvError::configuration(format!(
                    "action registered for excluded field '{field}'"
                )));
            }
            if !self.track_private && is_private(&field) {
                return Err(SelvError::configuration(format!(
                    "action registered for private field '{field}' while private fields are not tracked"
                )));
            }
            if actions.insert(field.clone(), action).is_some() {
                return Err(SelvError::configuration(format!(
                    "more than one action registered for field '{field}'"
                )));
            }
        }

        Ok(TrackConfig {
            track_private: self.track_private,
            logger: self.logger,
            exclude,
            actions,
        })
    }
}

/// Where change lines go when configured from options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Stdout,
    Tracing,
    None,
}

impl LogTarget {
    fn sink(self) -> Option<Arc<dyn ChangeSink>> {
        match self {
            LogTarget::Stdout => Some(Arc::new(StdoutSink)),
            LogTarget::Tracing => Some(Arc::new(TracingSink)),
            LogTarget::None => None,
        }
    }
}

impl FromStr for LogTarget {
    type Err = SelvError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stdout" => Ok(LogTarget::Stdout),
            "tracing" => Ok(LogTarget::Tracing),
            "none" => Ok(LogTarget::None),
            other => Err(SelvError::configuration(format!(
                "log target must be 'stdout', 'tracing' or 'none', got '{other}'"
            ))),
        }
    }
}

/// Serializable tracking options
///
/// ```toml
/// track_private = false
/// exclude = ["secret"]
/// log = "tracing"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackOptions {
    pub track_private: bool,
    pub exclude: Vec<String>,
    pub log: LogTarget,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            track_private: true,
            exclude: Vec::new(),
            log: LogTarget::Stdout,
        }
    }
}

impl TrackOptions {
    /// Parse options from TOML text
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` on malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SelvError::ConfigParse {
            reason: e.to_string(),
        })
    }

    /// Read and parse a TOML options file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `ConfigParse` if it cannot
    /// be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
