//! Change sinks
//!
//! A sink receives one rendered change line per recorded write. The default
//! sink prints to standard output; [`TracingSink`] forwards lines into the
//! structured logging pipeline and [`MemorySink`] keeps them for inspection.
//! Any `Fn(&str) -> Result<(), BoxError>` closure is also a sink.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use selv_core_types::schema::{EVENT_LINE, OP_EMIT_LINE};

use crate::errors::BoxError;

/// Destination for rendered change lines
pub trait ChangeSink: Send + Sync {
    /// Accept one change line
    ///
    /// # Errors
    ///
    /// Any error is surfaced to the writer as `SinkFailed`.
    fn emit(&self, line: &str) -> Result<(), BoxError>;
}

impl<F> ChangeSink for F
where
    F: Fn(&str) -> Result<(), BoxError> + Send + Sync,
{
    fn emit(&self, line: &str) -> Result<(), BoxError> {
        self(line)
    }
}

/// Writes each line to standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl ChangeSink for StdoutSink {
    fn emit(&self, line: &str) -> Result<(), BoxError> {
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")?;
        Ok(())
    }
}

/// Emits each line as an info-level `tracing` event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ChangeSink for TracingSink {
    fn emit(&self, line: &str) -> Result<(), BoxError> {
        tracing::info!(
            component = module_path!(),
            op = OP_EMIT_LINE,
            event = EVENT_LINE,
            "{line}"
        );
        Ok(())
    }
}

/// Collects lines in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines received so far, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl ChangeSink for MemorySink {
    fn emit(&self, line: &str) -> Result<(), BoxError> {
        self.lines.lock().push(line.to_string());
        Ok(())
    }
}
