// Active window for the per-file sweep
//
// Events arrive in ascending offset order. The set holds the ones whose
// block-rounded end has not yet been passed, keyed by that end so expiry is a
// prefix cut.

use super::merge::{check_containment, describe, Containment};
use super::report::{Anomaly, ByteRange, Conflict, FalseSharing, Finding, TimeRange};
use crate::event::{block_end, Event};
use std::collections::BTreeMap;

/// What the same-rank step decided for an incoming event
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// No active event from the same rank overlaps it
    Unmatched,
    /// An active event from the same rank covers it; drop it quietly
    Merged,
    /// Same-rank overlap that isn't a clean nesting; drop it and report
    Anomaly(Anomaly),
}

/// Events still reachable by later overlap tests
#[derive(Debug, Clone)]
pub struct OverlapSet {
    block_size: u64,
    /// Keyed by block-rounded end offset; admission order within a key
    active: BTreeMap<u64, Vec<Event>>,
    len: usize,
}

impl OverlapSet {
    pub fn new(block_size: u64) -> Self {
        Self {
            block_size: block_size.max(1),
            active: BTreeMap::new(),
            len: 0,
        }
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Active events, ascending by block-rounded end offset
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.active.values().flatten()
    }

    /// Drop every event whose block-rounded end lies before `block_start`
    ///
    /// Returns how many events were dropped.
    pub fn remove_old_events(&mut self, block_start: u64) -> usize {
        let keep = self.active.split_off(&block_start);
        let expired = std::mem::replace(&mut self.active, keep);
        let removed: usize = expired.values().map(Vec::len).sum();
        self.len -= removed;
        removed
    }

    /// Fold `event` into an overlapping active event from the same rank
    pub fn merge_same_rank(&self, event: &Event) -> MergeOutcome {
        let mut first_mismatch: Option<(&Event, Vec<Containment>)> = None;

        for other in self
            .iter()
            .filter(|o| o.rank() == event.rank() && o.overlaps(event))
        {
            match check_containment(other, event) {
                Ok(()) => return MergeOutcome::Merged,
                Err(violations) => {
                    if first_mismatch.is_none() {
                        first_mismatch = Some((other, violations));
                    }
                }
            }
        }

        match first_mismatch {
            None => MergeOutcome::Unmatched,
            Some((other, violations)) => MergeOutcome::Anomaly(Anomaly {
                event: event.clone(),
                other: other.clone(),
                description: describe(other, event, &violations),
                violations,
            }),
        }
    }

    /// Report byte-range conflicts between `event` and other ranks
    ///
    /// Returns true if any other rank overlaps `event` at all, including
    /// read/read overlaps that are not reported.
    pub fn report_overlaps(&self, event: &Event, findings: &mut Vec<Finding>) -> bool {
        let mut overlapped = false;

        for other in self
            .iter()
            .filter(|o| o.rank() != event.rank() && o.overlaps(event))
        {
            overlapped = true;
            if !(event.mode().is_write() || other.mode().is_write()) {
                continue;
            }

            let bytes = ByteRange::new(
                event.offset().max(other.offset()),
                event.end_offset().min(other.end_offset()),
            );
            let time = event
                .time_overlap(other)
                .map(|(start, end)| TimeRange { start, end });
            findings.push(Finding::Conflict(Conflict {
                event: event.clone(),
                other: other.clone(),
                bytes,
                time,
            }));
        }

        overlapped
    }

    /// Report writes from other ranks that share a block with `event`
    ///
    /// Only meaningful once byte-level overlap has been ruled out. Returns the
    /// number of reports added.
    pub fn report_block_overlaps(&self, event: &Event, findings: &mut Vec<Finding>) -> usize {
        if self.block_size <= 1 || !event.mode().is_write() {
            return 0;
        }

        let (start, end) = event.block_range(self.block_size);
        let before = findings.len();

        for other in self.iter().filter(|o| {
            o.rank() != event.rank()
                && o.mode().is_write()
                && !o.overlaps(event)
                && o.overlaps_blocks(event, self.block_size)
        }) {
            let (other_start, other_end) = other.block_range(self.block_size);
            findings.push(Finding::FalseSharing(FalseSharing {
                event: event.clone(),
                other: other.clone(),
                blocks: ByteRange::new(start.max(other_start), end.min(other_end)),
            }));
        }

        findings.len() - before
    }

    /// Admit `event` to the window
    pub fn add_event(&mut self, event: Event) {
        let key = block_end(event.end_offset(), self.block_size);
        self.active.entry(key).or_default().push(event);
        self.len += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{IoApi, IoMode};

    fn ev(rank: u32, mode: IoMode, offset: u64, length: u64) -> Event {
        Event::new(rank, mode, IoApi::Posix, offset, length, 1.0, 2.0).unwrap()
    }

    #[test]
    fn test_iter_ascending_by_rounded_end() {
        let mut set = OverlapSet::new(1);
        set.add_event(ev(0, IoMode::Write, 0, 500));
        set.add_event(ev(1, IoMode::Write, 10, 10));
        set.add_event(ev(2, IoMode::Write, 20, 100));
        let ends: Vec<_> = set.iter().map(Event::end_offset).collect();
        assert_eq!(ends, vec![19, 119, 499]);
    }

    #[test]
    fn test_remove_old_events_cuts_prefix() {
        let mut set = OverlapSet::new(1);
        set.add_event(ev(0, IoMode::Write, 0, 10));
        set.add_event(ev(1, IoMode::Write, 0, 20));
        set.add_event(ev(2, IoMode::Write, 0, 30));
        assert_eq!(set.remove_old_events(19), 1);
        assert_eq!(set.len(), 2);
        assert_eq!(set.remove_old_events(20), 1);
        assert_eq!(set.len(), 1);
        assert_eq!(set.remove_old_events(0), 0);
    }

    #[test]
    fn test_remove_respects_block_rounding() {
        let mut set = OverlapSet::new(100);
        set.add_event(ev(0, IoMode::Write, 0, 4));
        // ends at byte 3, block end 99: still alive for an event at byte 96
        assert_eq!(set.remove_old_events(0), 0);
        assert_eq!(set.remove_old_events(100), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_merge_unmatched_for_other_ranks() {
        let mut set = OverlapSet::new(1);
        set.add_event(ev(1, IoMode::Write, 0, 100));
        assert_eq!(
            set.merge_same_rank(&ev(0, IoMode::Write, 0, 10)),
            MergeOutcome::Unmatched
        );
    }

    #[test]
    fn test_merge_prefers_any_covering_event() {
        let mut set = OverlapSet::new(1);
        // same rank, overlapping but too short to contain
        set.add_event(ev(0, IoMode::Write, 0, 20));
        set.add_event(ev(0, IoMode::Write, 0, 1000));
        assert_eq!(
            set.merge_same_rank(&ev(0, IoMode::Write, 10, 50)),
            MergeOutcome::Merged
        );
    }

    #[test]
    fn test_merge_mismatch_is_anomaly() {
        let mut set = OverlapSet::new(1);
        set.add_event(ev(0, IoMode::Read, 0, 100));
        match set.merge_same_rank(&ev(0, IoMode::Write, 50, 100)) {
            MergeOutcome::Anomaly(a) => {
                assert_eq!(a.other.offset(), 0);
                assert_eq!(a.event.offset(), 50);
                assert_eq!(
                    a.violations,
                    vec![Containment::ByteRange, Containment::Operation]
                );
            }
            other => panic!("expected anomaly, got {:?}", other),
        }
    }

    #[test]
    fn test_read_read_overlap_counts_but_not_reported() {
        let mut set = OverlapSet::new(1);
        set.add_event(ev(1, IoMode::Read, 0, 100));
        let mut findings = Vec::new();
        assert!(set.report_overlaps(&ev(0, IoMode::Read, 50, 10), &mut findings));
        assert!(findings.is_empty());
    }

    #[test]
    fn test_conflict_overlap_range() {
        let mut set = OverlapSet::new(1);
        set.add_event(ev(0, IoMode::Write, 0, 100));
        let mut findings = Vec::new();
        assert!(set.report_overlaps(&ev(1, IoMode::Write, 50, 100), &mut findings));
        match &findings[..] {
            [Finding::Conflict(c)] => {
                assert_eq!(c.bytes, ByteRange::new(50, 99));
                assert_eq!(c.time, Some(TimeRange { start: 1.0, end: 2.0 }));
            }
            other => panic!("unexpected findings: {:?}", other),
        }
    }

    #[test]
    fn test_block_overlap_requires_writes() {
        let mut set = OverlapSet::new(100);
        set.add_event(ev(0, IoMode::Read, 0, 4));
        let mut findings = Vec::new();
        assert_eq!(
            set.report_block_overlaps(&ev(1, IoMode::Write, 96, 4), &mut findings),
            0
        );
        assert_eq!(
            set.report_block_overlaps(&ev(1, IoMode::Read, 96, 4), &mut findings),
            0
        );
    }

    #[test]
    fn test_block_overlap_disabled_at_block_size_one() {
        let mut set = OverlapSet::new(1);
        set.add_event(ev(0, IoMode::Write, 0, 4));
        let mut findings = Vec::new();
        assert_eq!(
            set.report_block_overlaps(&ev(1, IoMode::Write, 4, 4), &mut findings),
            0
        );
    }

    #[test]
    fn test_block_overlap_range() {
        let mut set = OverlapSet::new(100);
        set.add_event(ev(0, IoMode::Write, 0, 4));
        let mut findings = Vec::new();
        assert_eq!(
            set.report_block_overlaps(&ev(1, IoMode::Write, 96, 4), &mut findings),
            1
        );
        match &findings[..] {
            [Finding::FalseSharing(s)] => assert_eq!(s.blocks, ByteRange::new(0, 99)),
            other => panic!("unexpected findings: {:?}", other),
        }
    }

    #[test]
    fn test_zero_block_size_treated_as_one() {
        assert_eq!(OverlapSet::new(0).block_size(), 1);
    }
}
