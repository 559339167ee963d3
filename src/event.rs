//! I/O event records
//!
//! One `Event` is one read or write call captured by DXT, with its byte range,
//! wall-clock interval and the instrumentation layer that logged it.
//!
//! Events sort by starting offset and then by start time. Remaining ties put
//! the wider range first and MPI-IO ahead of POSIX, so an MPI-IO call always
//! enters the sweep before the POSIX pieces it was split into. That order
//! drives the conflict sweep in [`crate::conflict`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Direction of an access
///
/// `Write` orders above `Read`: a write is a superset of a read when checking
/// whether one record can stand in for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoMode {
    Read,
    Write,
}

impl IoMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write)
    }
}

/// Instrumentation layer that recorded the call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoApi {
    #[serde(rename = "POSIX")]
    Posix,
    #[serde(rename = "MPIIO")]
    MpiIo,
}

impl IoApi {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Posix => "POSIX",
            Self::MpiIo => "MPIIO",
        }
    }

    /// Outer layers sweep first
    fn sweep_rank(&self) -> u8 {
        match self {
            Self::MpiIo => 0,
            Self::Posix => 1,
        }
    }
}

/// Reasons an event cannot be constructed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    #[error("zero-length access at offset {offset}")]
    ZeroLength { offset: u64 },

    #[error("byte range overflows: offset {offset} + length {length}")]
    RangeOverflow { offset: u64, length: u64 },

    #[error("non-finite timestamp")]
    NonFiniteTime,

    #[error("end time {end} precedes start time {start}")]
    InvertedTime { start: f64, end: f64 },
}

/// One recorded read or write
///
/// Only constructible through [`Event::new`], so every instance has a
/// non-empty byte range and an ordered, finite time interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord")]
pub struct Event {
    rank: u32,
    mode: IoMode,
    api: IoApi,
    offset: u64,
    length: u64,
    start_time: f64,
    end_time: f64,
}

/// Unchecked wire shape of an [`Event`]
#[derive(Deserialize)]
struct EventRecord {
    rank: u32,
    mode: IoMode,
    api: IoApi,
    offset: u64,
    length: u64,
    start_time: f64,
    end_time: f64,
}

impl TryFrom<EventRecord> for Event {
    type Error = EventError;

    fn try_from(r: EventRecord) -> Result<Self, Self::Error> {
        Event::new(
            r.rank,
            r.mode,
            r.api,
            r.offset,
            r.length,
            r.start_time,
            r.end_time,
        )
    }
}

impl Event {
    /// Build an event, rejecting degenerate ranges and timestamps
    pub fn new(
        rank: u32,
        mode: IoMode,
        api: IoApi,
        offset: u64,
        length: u64,
        start_time: f64,
        end_time: f64,
    ) -> Result<Self, EventError> {
        if length == 0 {
            return Err(EventError::ZeroLength { offset });
        }
        if offset.checked_add(length).is_none() {
            return Err(EventError::RangeOverflow { offset, length });
        }
        if !start_time.is_finite() || !end_time.is_finite() {
            return Err(EventError::NonFiniteTime);
        }
        if end_time < start_time {
            return Err(EventError::InvertedTime {
                start: start_time,
                end: end_time,
            });
        }

        Ok(Self {
            rank,
            mode,
            api,
            offset,
            length,
            start_time,
            end_time,
        })
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn mode(&self) -> IoMode {
        self.mode
    }

    pub fn api(&self) -> IoApi {
        self.api
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Last byte touched (inclusive)
    pub fn end_offset(&self) -> u64 {
        self.offset + self.length - 1
    }

    /// Raw byte-range overlap
    pub fn overlaps(&self, other: &Event) -> bool {
        self.offset < other.offset + other.length && self.offset + self.length > other.offset
    }

    /// Overlap after rounding both ranges outward to block boundaries
    pub fn overlaps_blocks(&self, other: &Event, block_size: u64) -> bool {
        let (this_start, this_end) = self.block_range(block_size);
        let (other_start, other_end) = other.block_range(block_size);
        this_start <= other_end && this_end >= other_start
    }

    /// Inclusive block-quantized byte range
    pub fn block_range(&self, block_size: u64) -> (u64, u64) {
        (
            block_start(self.offset, block_size),
            block_end(self.end_offset(), block_size),
        )
    }

    /// Whether the two wall-clock intervals intersect
    pub fn time_overlap(&self, other: &Event) -> Option<(f64, f64)> {
        let start = self.start_time.max(other.start_time);
        let end = self.end_time.min(other.end_time);
        (start < end).then_some((start, end))
    }

    /// Canonical sweep order: offset, start time, longer range, MPI-IO first
    pub fn canonical_cmp(&self, other: &Event) -> Ordering {
        self.offset
            .cmp(&other.offset)
            .then_with(|| self.start_time.total_cmp(&other.start_time))
            .then_with(|| other.length.cmp(&self.length))
            .then_with(|| self.api.sweep_rank().cmp(&other.api.sweep_rank()))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rank {} bytes {}..{} {} {} time {:.4}..{:.4}",
            self.rank,
            self.offset,
            self.end_offset(),
            self.api.as_str(),
            self.mode.as_str(),
            self.start_time,
            self.end_time
        )
    }
}

/// Round an offset down to the start of its block
pub fn block_start(offset: u64, block_size: u64) -> u64 {
    offset - (offset % block_size)
}

/// Round an offset up to the last byte of its block
pub fn block_end(offset: u64, block_size: u64) -> u64 {
    block_start(offset, block_size).saturating_add(block_size - 1)
}
