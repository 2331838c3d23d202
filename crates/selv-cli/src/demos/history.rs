//! Document edits and history queries

use selv_core::{HistoryFormat, Observed, Tracked, TrackedType, Tracker};

use super::{DemoOptions, DemoResult};

struct Document {
    tracker: Tracker,
    title: Observed<String>,
    content: Observed<String>,
    version: Observed<u32>,
}

impl Document {
    fn new(ty: &TrackedType, title: &str, content: &str) -> selv_core::Result<Self> {
        let tracker = ty.instance();
        Ok(Self {
            title: tracker.field("title", title.to_string())?,
            content: tracker.field("content", content.to_string())?,
            version: tracker.field("version", 1)?,
            tracker,
        })
    }

    fn revise(&mut self, title: Option<&str>, content: &str) -> selv_core::Result<()> {
        if let Some(title) = title {
            self.title.set(title.to_string())?;
        }
        self.content.set(content.to_string())?;
        self.version.update(|v| v + 1)
    }
}

impl Tracked for Document {
    fn tracker(&self) -> &Tracker {
        &self.tracker
    }
}

pub fn execute(options: &DemoOptions) -> DemoResult {
    let ty = TrackedType::new("Document", options.builder()?.build()?)?;
    let mut doc = Document::new(&ty, "Draft", "Initial content")?;

    doc.revise(Some("First Revision"), "Updated content")?;
    doc.revise(Some("Final Version"), "Final content")?;
    doc.revise(None, "Final content, proofread")?;

    let grouped = doc.change_history(None, HistoryFormat::Grouped)?;
    if let Some(groups) = grouped.as_grouped() {
        let summary: Vec<String> = groups
            .iter()
            .map(|(field, changes)| format!("{field}={}", changes.len()))
            .collect();
        options.narrate(format!("\nChanges per field: {}", summary.join(", ")));
    }
    options.narrate(format!("Document is at version {}", *doc.version));

    options.report(doc.tracker())
}
