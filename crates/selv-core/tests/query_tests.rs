#![allow(clippy::unwrap_used, clippy::expect_used)]

//! History query API: flat and grouped views, field filter, JSON export.

mod common;

use selv_core::{
    render_history, HistoryFormat, HistoryQuery, Observed, Tracked, TrackedType, Tracker, Value,
};

use common::quiet_type;

struct Document {
    tracker: Tracker,
    title: Observed<String>,
    version: Observed<i64>,
}

impl Document {
    fn new(ty: &TrackedType) -> Self {
        let tracker = ty.instance();
        Self {
            title: tracker.field("title", "Untitled".to_string()).unwrap(),
            version: tracker.field("version", 1).unwrap(),
            tracker,
        }
    }
}

impl Tracked for Document {
    fn tracker(&self) -> &Tracker {
        &self.tracker
    }
}

fn edited_document() -> Document {
    let mut doc = Document::new(&quiet_type("Document"));
    doc.title.set("Draft".to_string()).unwrap();
    doc.version.update(|v| v + 1).unwrap();
    doc.title.set("Final".to_string()).unwrap();
    doc
}

#[test]
fn test_flat_history_is_time_ordered() {
    // GIVEN an edited document
    let doc = edited_document();

    // WHEN the flat history is queried
    let flat = doc
        .change_history(None, HistoryFormat::Flat)
        .unwrap()
        .into_flat()
        .unwrap();

    // THEN records are in write order with increasing seq and timestamps
    let fields: Vec<_> = flat.iter().map(|r| r.field.as_str()).collect();
    assert_eq!(fields, vec!["title", "version", "title", "version", "title"]);
    assert!(flat.windows(2).all(|w| w[0].seq < w[1].seq));
    assert!(flat.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn test_field_filter_keeps_original_order() {
    // GIVEN an edited document
    let doc = edited_document();

    // WHEN filtered to `title`
    let title = doc
        .change_history(Some("title"), HistoryFormat::Flat)
        .unwrap()
        .into_flat()
        .unwrap();

    // THEN only title records remain, chained from -> to
    let values: Vec<_> = title.iter().map(|r| r.to.clone()).collect();
    assert_eq!(
        values,
        vec![Value::from("Untitled"), Value::from("Draft"), Value::from("Final")]
    );
    assert_eq!(title[2].from, Some(Value::from("Draft")));
}

#[test]
fn test_grouped_history_partitions_flat() {
    // GIVEN an edited document
    let doc = edited_document();

    // WHEN the grouped view is queried
    let grouped = doc
        .change_history(None, HistoryFormat::Grouped)
        .unwrap()
        .into_grouped()
        .unwrap();

    // THEN groups are keyed in first-seen order and cover every record
    assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["title", "version"]);
    assert_eq!(grouped["title"].len(), 3);
    assert_eq!(grouped["version"].len(), 2);
    let total: usize = grouped.values().map(Vec::len).sum();
    assert_eq!(total, doc.tracker().len());
}

#[test]
fn test_field_with_grouped_format_is_configuration_error() {
    // GIVEN an edited document
    let doc = edited_document();

    // WHEN a field filter is combined with grouped format
    let err = doc
        .change_history(Some("title"), HistoryFormat::Grouped)
        .unwrap_err();

    // THEN a configuration error is returned
    assert!(err.is_configuration());
    assert_eq!(err.code(), "ERR_CONFIGURATION");
}

#[test]
fn test_never_written_field_returns_empty() {
    // GIVEN an edited document
    let doc = edited_document();

    // WHEN querying a field that was never written
    let history = doc
        .change_history(Some("author"), HistoryFormat::Flat)
        .unwrap();

    // THEN the result is empty rather than an error
    assert!(history.is_empty());
}

#[test]
fn test_format_strings_parse() {
    assert_eq!("flat".parse::<HistoryFormat>().unwrap(), HistoryFormat::Flat);
    assert_eq!("attr".parse::<HistoryFormat>().unwrap(), HistoryFormat::Grouped);
    assert!("tree".parse::<HistoryFormat>().unwrap_err().is_configuration());
}

#[test]
fn test_prepared_query_matches_convenience_query() {
    let doc = edited_document();
    let prepared = doc
        .tracker()
        .run_query(&HistoryQuery::new().field("version"))
        .unwrap();
    let convenience = doc
        .change_history(Some("version"), HistoryFormat::Flat)
        .unwrap();
    assert_eq!(prepared, convenience);
}

#[test]
fn test_history_serializes_to_json() {
    // GIVEN an edited document
    let doc = edited_document();

    // WHEN the grouped history is serialized
    let grouped = doc.change_history(None, HistoryFormat::Grouped).unwrap();
    let json = serde_json::to_value(&grouped).unwrap();

    // THEN groups are objects keyed by field and the first record has a null `from`
    assert!(json["title"][0]["from"].is_null());
    assert_eq!(json["title"][1]["to"], "Draft");
    assert_eq!(json["version"][1]["to"], 2);
    assert_eq!(json["version"][1]["seq"], 3);
}

#[test]
fn test_render_history_text() {
    let doc = edited_document();
    let text = render_history(&doc.change_history(None, HistoryFormat::Grouped).unwrap());
    assert!(text.starts_with("  title: 3 changes\n"));
    assert!(text.contains("    #0 (absent) -> 'Untitled'\n"));
    assert!(text.contains("  version: 2 changes\n"));
}
