//! Property-based tests for the conflict sweep
//!
//! Random small traces are generated over a narrow byte window so overlaps are
//! common, then the reports are checked against the invariants every run must
//! satisfy:
//! 1. Overlap predicates are symmetric
//! 2. Every conflict involves a write and two different ranks
//! 3. Every reported conflict really overlaps in bytes
//! 4. Block size never changes the byte-level conflicts
//! 5. Block size 1 never reports false sharing, and multiplying the block
//!    size never lowers the false-sharing count
//! 6. Scans are deterministic and parallel scans match sequential ones

use dxtscan::config::AnalysisConfig;
use dxtscan::conflict::{scan_file, scan_table, Finding};
use dxtscan::event::{Event, IoApi, IoMode};
use dxtscan::file_table::{FileAggregate, FileTable};
use proptest::prelude::*;

fn arb_event() -> impl Strategy<Value = Event> {
    (
        0u32..4,
        any::<bool>(),
        any::<bool>(),
        0u64..2000,
        1u64..400,
        0u32..1000,
        0u32..100,
    )
        .prop_map(|(rank, write, mpi, offset, length, start, dur)| {
            let start = start as f64 / 100.0;
            let end = start + dur as f64 / 100.0;
            Event::new(
                rank,
                if write { IoMode::Write } else { IoMode::Read },
                if mpi { IoApi::MpiIo } else { IoApi::Posix },
                offset,
                length,
                start,
                end,
            )
            .unwrap()
        })
}

fn config(block_size: u64) -> AnalysisConfig {
    AnalysisConfig {
        block_size,
        ..Default::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_overlap_is_symmetric(a in arb_event(), b in arb_event(), block in 1u64..512) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        prop_assert_eq!(a.overlaps_blocks(&b, block), b.overlaps_blocks(&a, block));
        // byte overlap implies block overlap at any granularity
        if a.overlaps(&b) {
            prop_assert!(a.overlaps_blocks(&b, block));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_findings_respect_invariants(
        events in prop::collection::vec(arb_event(), 0..40),
        block in 1u64..512,
    ) {
        let file = FileAggregate::from_events("1", "/f", events);
        let report = scan_file(&file, &config(block));

        for finding in &report.findings {
            match finding {
                Finding::Conflict(c) => {
                    prop_assert_ne!(c.event.rank(), c.other.rank());
                    prop_assert!(c.event.mode().is_write() || c.other.mode().is_write());
                    prop_assert!(c.event.overlaps(&c.other));
                    prop_assert!(c.bytes.first <= c.bytes.last);
                    prop_assert!(c.bytes.first >= c.event.offset().max(c.other.offset()));
                    prop_assert!(c.bytes.last <= c.event.end_offset().min(c.other.end_offset()));
                }
                Finding::FalseSharing(s) => {
                    prop_assert!(block > 1);
                    prop_assert_ne!(s.event.rank(), s.other.rank());
                    prop_assert!(s.event.mode().is_write() && s.other.mode().is_write());
                    prop_assert!(!s.event.overlaps(&s.other));
                    prop_assert!(s.event.overlaps_blocks(&s.other, block));
                }
                Finding::Anomaly(a) => {
                    prop_assert_eq!(a.event.rank(), a.other.rank());
                    prop_assert!(a.event.overlaps(&a.other));
                    prop_assert!(!a.violations.is_empty());
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_block_size_keeps_byte_conflicts(
        events in prop::collection::vec(arb_event(), 0..40),
        block in 2u64..512,
    ) {
        let file = FileAggregate::from_events("1", "/f", events);
        let fine = scan_file(&file, &config(1));
        let coarse = scan_file(&file, &config(block));

        // same set of pairs; order within one sweep step can differ because
        // the window is keyed by block-rounded end offset
        let fine_conflicts: Vec<_> = fine.conflicts().collect();
        let coarse_conflicts: Vec<_> = coarse.conflicts().collect();
        prop_assert_eq!(fine_conflicts.len(), coarse_conflicts.len());
        for conflict in &fine_conflicts {
            prop_assert!(coarse_conflicts.contains(conflict));
        }
        prop_assert_eq!(fine.false_sharing().count(), 0);
        prop_assert_eq!(
            fine.anomalies().count(),
            coarse.anomalies().count()
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_false_sharing_grows_with_block_multiples(
        events in prop::collection::vec(arb_event(), 0..40),
        block in 1u64..256,
        factor in 1u64..8,
    ) {
        // blocks of `block` nest inside blocks of `block * factor`, so every
        // shared fine block is also a shared coarse block
        let file = FileAggregate::from_events("1", "/f", events);
        let fine = scan_file(&file, &config(block));
        let coarse = scan_file(&file, &config(block * factor));
        prop_assert!(coarse.false_sharing().count() >= fine.false_sharing().count());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_scan_is_deterministic(
        events in prop::collection::vec(arb_event(), 0..40),
        block in 1u64..512,
    ) {
        let file = FileAggregate::from_events("1", "/f", events);
        prop_assert_eq!(scan_file(&file, &config(block)), scan_file(&file, &config(block)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn prop_parallel_matches_sequential(
        files in prop::collection::vec(prop::collection::vec(arb_event(), 0..20), 1..8),
        jobs in 2usize..6,
    ) {
        let mut table = FileTable::new();
        for (i, events) in files.into_iter().enumerate() {
            table.insert(FileAggregate::from_events(i.to_string(), format!("/f{}", i), events));
        }

        let sequential = scan_table(&table, &AnalysisConfig { block_size: 64, jobs: 1 });
        let parallel = scan_table(&table, &AnalysisConfig { block_size: 64, jobs });
        prop_assert_eq!(sequential, parallel);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_sweep_matches_brute_force_for_distinct_ranks(
        events in prop::collection::vec(arb_event(), 0..30),
    ) {
        // give every event its own rank so no merging happens; then the sweep
        // must find exactly the write-involving overlapping pairs
        let events: Vec<Event> = events
            .into_iter()
            .enumerate()
            .map(|(i, e)| {
                Event::new(
                    i as u32,
                    e.mode(),
                    e.api(),
                    e.offset(),
                    e.length(),
                    e.start_time(),
                    e.end_time(),
                )
                .unwrap()
            })
            .collect();

        let mut expected = 0usize;
        for (i, a) in events.iter().enumerate() {
            for b in &events[i + 1..] {
                if a.overlaps(b) && (a.mode().is_write() || b.mode().is_write()) {
                    expected += 1;
                }
            }
        }

        let file = FileAggregate::from_events("1", "/f", events);
        let report = scan_file(&file, &config(1));
        prop_assert_eq!(report.conflicts().count(), expected);
        prop_assert_eq!(report.anomalies().count(), 0);
    }
}
