#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Ledger invariants over arbitrary write sequences.

use proptest::prelude::*;
use selv_core::{HistoryFormat, Observed, TrackConfig, TrackedType, Tracker, Value};

const FIELDS: [&str; 4] = ["a", "b", "_c", "secret"];

fn write_sequence() -> impl Strategy<Value = Vec<(usize, i64)>> {
    prop::collection::vec((0..FIELDS.len(), -5i64..5), 0..40)
}

fn run(writes: &[(usize, i64)], track_private: bool) -> (Tracker, Vec<Observed<i64>>) {
    let config = TrackConfig::builder()
        .no_logger()
        .track_private(track_private)
        .exclude(["secret"])
        .build()
        .unwrap();
    let tracker = TrackedType::new("Prop", config).unwrap().instance();

    let mut holders: Vec<Observed<i64>> = FIELDS
        .iter()
        .map(|name| tracker.field(name, 0).unwrap())
        .collect();
    for &(index, value) in writes {
        holders[index].set(value).unwrap();
    }
    (tracker, holders)
}

proptest! {
    #[test]
    fn prop_flat_length_counts_every_tracked_write(
        writes in write_sequence(),
        track_private in any::<bool>(),
    ) {
        let (tracker, holders) = run(&writes, track_private);

        let declarations = holders.iter().filter(|h| h.is_tracked()).count();
        let tracked_writes = writes
            .iter()
            .filter(|(index, _)| holders[*index].is_tracked())
            .count();

        prop_assert_eq!(tracker.len(), declarations + tracked_writes);
        prop_assert!(tracker.history_of("secret").is_empty());
    }

    #[test]
    fn prop_from_chains_to_previous_to(writes in write_sequence()) {
        let (tracker, _holders) = run(&writes, true);
        for field in tracker.fields() {
            let records = tracker.history_of(&field);
            prop_assert!(records[0].from.is_none());
            for pair in records.windows(2) {
                prop_assert_eq!(pair[1].from.as_ref(), Some(&pair[0].to));
            }
        }
    }

    #[test]
    fn prop_grouped_partitions_flat(writes in write_sequence()) {
        let (tracker, _holders) = run(&writes, true);
        let flat = tracker.query(None, HistoryFormat::Flat).unwrap().into_flat().unwrap();
        let grouped = tracker.query(None, HistoryFormat::Grouped).unwrap().into_grouped().unwrap();

        let regrouped: usize = grouped.values().map(Vec::len).sum();
        prop_assert_eq!(regrouped, flat.len());

        for (field, changes) in &grouped {
            let seqs: Vec<u64> = changes.iter().map(|c| c.seq).collect();
            let expected: Vec<u64> = flat
                .iter()
                .filter(|r| &r.field == field)
                .map(|r| r.seq)
                .collect();
            prop_assert_eq!(seqs, expected);
        }
    }

    #[test]
    fn prop_latest_record_matches_live_value(writes in write_sequence()) {
        let (tracker, holders) = run(&writes, true);
        for holder in holders.iter().filter(|h| h.is_tracked()) {
            let latest = tracker.latest(holder.name()).unwrap();
            prop_assert_eq!(latest.to, Value::Int(i128::from(*holder.get())));
        }
    }
}
