// Findings produced by the conflict sweep

use super::merge::Containment;
use crate::event::Event;
use crate::ingest::IngestDiagnostic;
use serde::Serialize;
use std::fmt;

/// Inclusive byte span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub first: u64,
    pub last: u64,
}

impl ByteRange {
    pub fn new(first: u64, last: u64) -> Self {
        Self { first, last }
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.first, self.last)
    }
}

/// Wall-clock interval in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}..{:.4}", self.start, self.end)
    }
}

/// Two ranks touching the same bytes, at least one of them writing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    /// Event being swept when the overlap was found
    pub event: Event,
    /// Earlier active event it overlaps
    pub other: Event,
    pub bytes: ByteRange,
    /// Shared wall-clock interval, if the calls ran concurrently
    pub time: Option<TimeRange>,
}

/// Two ranks writing disjoint bytes of the same storage block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FalseSharing {
    pub event: Event,
    pub other: Event,
    pub blocks: ByteRange,
}

/// Same-rank overlap that doesn't look like one call seen at two layers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// Event that was discarded
    pub event: Event,
    /// Active event it overlapped
    pub other: Event,
    pub violations: Vec<Containment>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    Conflict(Conflict),
    FalseSharing(FalseSharing),
    Anomaly(Anomaly),
}

impl Finding {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Conflict(_) => "conflict",
            Self::FalseSharing(_) => "false_sharing",
            Self::Anomaly(_) => "anomaly",
        }
    }

    pub fn events(&self) -> (&Event, &Event) {
        match self {
            Self::Conflict(c) => (&c.event, &c.other),
            Self::FalseSharing(f) => (&f.event, &f.other),
            Self::Anomaly(a) => (&a.event, &a.other),
        }
    }
}

/// Everything found in one file, in sweep order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub file_id: String,
    pub file_name: String,
    pub event_count: usize,
    pub findings: Vec<Finding>,
}

impl FileReport {
    pub fn new(file_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            file_name: file_name.into(),
            event_count: 0,
            findings: Vec::new(),
        }
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.findings.iter().filter_map(|f| match f {
            Finding::Conflict(c) => Some(c),
            _ => None,
        })
    }

    pub fn false_sharing(&self) -> impl Iterator<Item = &FalseSharing> {
        self.findings.iter().filter_map(|f| match f {
            Finding::FalseSharing(s) => Some(s),
            _ => None,
        })
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &Anomaly> {
        self.findings.iter().filter_map(|f| match f {
            Finding::Anomaly(a) => Some(a),
            _ => None,
        })
    }
}

/// Totals across every file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
    pub files: usize,
    pub events: usize,
    pub conflicts: usize,
    pub false_sharing: usize,
    pub anomalies: usize,
    pub diagnostics: usize,
}

/// Result of one analysis run
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    /// Per-file findings, in file discovery order
    pub files: Vec<FileReport>,
    /// Ingestion problems, in input order
    pub diagnostics: Vec<IngestDiagnostic>,
}

impl AnalysisReport {
    pub fn totals(&self) -> ReportTotals {
        let mut totals = ReportTotals {
            files: self.files.len(),
            diagnostics: self.diagnostics.len(),
            ..Default::default()
        };
        for file in &self.files {
            totals.events += file.event_count;
            for finding in &file.findings {
                match finding {
                    Finding::Conflict(_) => totals.conflicts += 1,
                    Finding::FalseSharing(_) => totals.false_sharing += 1,
                    Finding::Anomaly(_) => totals.anomalies += 1,
                }
            }
        }
        totals
    }

    /// Whether any cross-rank hazard (byte or block level) was found
    pub fn has_hazards(&self) -> bool {
        let totals = self.totals();
        totals.conflicts + totals.false_sharing > 0
    }
}
