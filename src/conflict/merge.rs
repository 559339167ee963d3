// Same-rank overlap check
//
// An MPI-IO call is usually carried out by one or more POSIX calls on the same
// rank, so DXT records the same bytes twice. The outer record sorts first (same
// or lower offset, earlier start), and it should cover the inner one in bytes,
// time and operation. Anything else is reported but never treated as fatal.

use crate::event::Event;
use serde::Serialize;
use std::fmt;

/// Ways the outer record can fail to cover the inner one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Containment {
    ByteRange,
    TimeRange,
    Operation,
}

impl fmt::Display for Containment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ByteRange => "byte range",
            Self::TimeRange => "time range",
            Self::Operation => "operation",
        };
        f.write_str(s)
    }
}

/// Check that `outer` covers `inner`; returns every failed containment
pub fn check_containment(outer: &Event, inner: &Event) -> Result<(), Vec<Containment>> {
    let mut violations = Vec::new();

    if outer.offset() > inner.offset() || outer.end_offset() < inner.end_offset() {
        violations.push(Containment::ByteRange);
    }
    if outer.start_time() > inner.start_time() || outer.end_time() < inner.end_time() {
        violations.push(Containment::TimeRange);
    }
    // write covers read, not the other way round
    if outer.mode() < inner.mode() {
        violations.push(Containment::Operation);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Human-readable account of a failed containment
pub fn describe(outer: &Event, inner: &Event, violations: &[Containment]) -> String {
    let failed: Vec<String> = violations.iter().map(ToString::to_string).collect();
    let layers = if outer.api() == inner.api() {
        format!("both {}", outer.api().as_str())
    } else {
        format!("{} over {}", outer.api().as_str(), inner.api().as_str())
    };
    format!(
        "rank {} overlaps itself ({}) but the earlier {} does not contain the later {} in {}",
        inner.rank(),
        layers,
        outer.mode().as_str(),
        inner.mode().as_str(),
        failed.join(", ")
    )
}
