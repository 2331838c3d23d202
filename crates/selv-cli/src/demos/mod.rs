//! Demonstration commands
//!
//! Every demo builds its tracked types from the shared options, runs a short
//! scripted sequence of writes, then prints the resulting history.

use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use selv_core::{
    render_history, HistoryFormat, LogTarget, TrackConfig, TrackConfigBuilder, TrackOptions,
    Tracker,
};

pub mod actions;
pub mod basic;
pub mod containers;
pub mod history;
pub mod logger;
pub mod nested;

pub type DemoResult = Result<(), Box<dyn Error>>;

/// Flags shared by every demo
#[derive(Debug, Args)]
pub struct DemoOptions {
    /// History layout: flat or grouped
    #[arg(long, global = true, default_value = "flat")]
    pub format: HistoryFormat,

    /// Only show history for this field (flat layout only)
    #[arg(long, global = true)]
    pub field: Option<String>,

    /// Print history as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Do not track fields whose name starts with `_`
    #[arg(long, global = true)]
    pub no_private: bool,

    /// Fields never to track (comma separated or repeated)
    #[arg(long, global = true, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Where change lines go: stdout, tracing or none
    #[arg(long, global = true)]
    pub log: Option<LogTarget>,

    /// TOML file with tracking options; flags override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit debug tracing on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl DemoOptions {
    /// Options file merged with command-line overrides
    pub fn track_options(&self) -> selv_core::Result<TrackOptions> {
        let mut options = match &self.config {
            Some(path) => TrackOptions::load(path)?,
            None => TrackOptions::default(),
        };

        if self.no_private {
            options.track_private = false;
        }
        options.exclude.extend(self.exclude.iter().cloned());
        if let Some(log) = self.log {
            options.log = log;
        }
        Ok(options)
    }

    /// Configuration builder seeded from the merged options
    pub fn builder(&self) -> selv_core::Result<TrackConfigBuilder> {
        Ok(TrackConfig::builder().with_options(&self.track_options()?))
    }

    /// Print a progress line; suppressed when printing JSON
    pub fn narrate(&self, line: impl std::fmt::Display) {
        if !self.json {
            println!("{line}");
        }
    }

    /// Print an instance's history in the requested layout
    pub fn report(&self, tracker: &Tracker) -> DemoResult {
        let history = tracker.query(self.field.as_deref(), self.format)?;

        if self.json {
            let document = serde_json::json!({
                "type": tracker.type_name(),
                "instance": tracker.id(),
                "format": self.format,
                "history": history,
            });
            println!("{}", serde_json::to_string_pretty(&document)?);
        } else {
            let scope = self.field.as_deref().unwrap_or("all fields");
            println!("\n{} history ({}, {}):", tracker.type_name(), self.format, scope);
            print!("{}", render_history(&history));
        }

        Ok(())
    }
}
