// Conflict detection for parallel I/O traces
//
// A conflict is a pair of events A and B such that:
//  - both access the same file
//  - they come from different ranks (A.rank != B.rank)
//  - their byte ranges overlap
//    (A.offset < B.offset + B.length && A.offset + A.length > B.offset)
//  - at least one of them is a write
//
// Each file's events are swept in offset order while an OverlapSet holds the
// events that can still overlap what comes next. Same-rank overlaps are taken
// to be one MPI-IO call and the POSIX calls that implement it, and are folded
// together rather than reported.
//
// With a block size above 1, writes from different ranks that share a storage
// block but no bytes are reported as false sharing. If P0 writes bytes 0..3 and
// P1 writes bytes 96..99 of a 100-byte block, both do read-modify-write of the
// whole block, and whichever finishes last erases the other's update. Only
// write/write pairs matter here: a read that doesn't share bytes with a write
// sees the same data either way.

mod merge;
mod overlap_set;
mod report;
mod scanner;

pub use merge::{check_containment, describe, Containment};
pub use overlap_set::{MergeOutcome, OverlapSet};
pub use report::{
    AnalysisReport, Anomaly, ByteRange, Conflict, FalseSharing, FileReport, Finding,
    ReportTotals, TimeRange,
};
pub use scanner::{analyze, scan_file, scan_table};
