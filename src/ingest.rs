//! DXT trace ingestion
//!
//! Reads the text emitted by `darshan-dxt-parser` and groups the per-call
//! records by file. A trace is a series of (file, rank) sections:
//!
//! ```text
//! # DXT, file_id: 8515199880342690440, file_name: /mnt/data/out.raw
//! # DXT, rank: 0, hostname: node01
//! # DXT, write_count: 10, read_count: 0
//! # Module    Rank  Wt/Rd  Segment          Offset       Length    Start(s)      End(s)
//!  X_POSIX       0  write        0               0         1048576      4.8324      4.8436
//!  X_POSIX       0  write        1         1048576         1048576      4.8436      4.8534
//! ```
//!
//! A section ends at a blank line or at end of input. Lines that don't fit the
//! record grammar are reported and skipped; a header with no rank line means
//! the trace was cut short, so ingestion stops there and keeps what it has.

use crate::event::{Event, IoApi, IoMode};
use crate::file_table::FileTable;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static SECTION_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^# DXT, file_id: ([0-9]+), file_name: (.*)$")
        .expect("Invalid DXT section header regex pattern")
});

static RANK_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^# DXT, rank: ([0-9]+),").expect("Invalid DXT rank line regex pattern")
});

/// Captures: library, rank, direction, offset, length, start, end.
/// The segment column is matched but not kept.
static EVENT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^ *(X_MPIIO|X_POSIX) +([0-9]+) +([a-z]+) +[0-9]+ +([-0-9]+) +([0-9]+) +([0-9.]+) +([0-9.]+)",
    )
    .expect("Invalid DXT event line regex pattern")
});

/// Problems found while reading a trace; none of them abort ingestion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestDiagnostic {
    /// Line inside a section that is neither metadata nor a record
    UnrecognizedLine { line: usize, text: String },
    /// Record that parsed but describes an impossible access
    DegenerateEvent {
        line: usize,
        text: String,
        reason: String,
    },
    /// Section header with no rank line before end of input
    TruncatedSection { line: usize, file_id: String },
}

impl fmt::Display for IngestDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedLine { line, text } => {
                write!(f, "line {}: Unrecognized line: {}", line, text)
            }
            Self::DegenerateEvent { line, text, reason } => {
                write!(f, "line {}: Dropped event ({}): {}", line, reason, text)
            }
            Self::TruncatedSection { line, file_id } => write!(
                f,
                "line {}: section for file {} has no rank line; trace truncated",
                line, file_id
            ),
        }
    }
}

/// Result of reading one trace
#[derive(Debug, Default)]
pub struct Ingested {
    pub files: FileTable,
    pub diagnostics: Vec<IngestDiagnostic>,
}

/// Why a record line was turned away
#[derive(Debug, PartialEq)]
enum LineError {
    Unrecognized,
    Degenerate(String),
}

/// Parse a single record line
fn parse_event_line(line: &str) -> Result<Event, LineError> {
    let caps = EVENT_LINE_RE
        .captures(line)
        .ok_or(LineError::Unrecognized)?;

    let api = match &caps[1] {
        "X_POSIX" => IoApi::Posix,
        "X_MPIIO" => IoApi::MpiIo,
        _ => return Err(LineError::Unrecognized),
    };

    let mode = match &caps[3] {
        "read" => IoMode::Read,
        "write" => IoMode::Write,
        _ => return Err(LineError::Unrecognized),
    };

    let rank: u32 = caps[2]
        .parse()
        .map_err(|_| LineError::Degenerate(format!("rank out of range: {}", &caps[2])))?;
    let offset: i64 = caps[4]
        .parse()
        .map_err(|_| LineError::Degenerate(format!("invalid offset: {}", &caps[4])))?;
    let offset = u64::try_from(offset)
        .map_err(|_| LineError::Degenerate(format!("negative offset: {}", offset)))?;
    let length: u64 = caps[5]
        .parse()
        .map_err(|_| LineError::Degenerate(format!("invalid length: {}", &caps[5])))?;
    let start_time: f64 = caps[6]
        .parse()
        .map_err(|_| LineError::Degenerate(format!("invalid start time: {}", &caps[6])))?;
    let end_time: f64 = caps[7]
        .parse()
        .map_err(|_| LineError::Degenerate(format!("invalid end time: {}", &caps[7])))?;

    Event::new(rank, mode, api, offset, length, start_time, end_time)
        .map_err(|e| LineError::Degenerate(e.to_string()))
}

/// Read a trace from any buffered reader
pub fn parse_trace<R: BufRead>(reader: R) -> io::Result<Ingested> {
    let mut ingested = Ingested::default();
    let mut lines = reader.lines().enumerate().map(|(i, l)| l.map(|l| (i + 1, l)));

    'sections: loop {
        // skip to the next section header
        let (header_line, file_id, file_name) = loop {
            match lines.next().transpose()? {
                None => break 'sections,
                Some((n, line)) => {
                    if let Some(caps) = SECTION_HEADER_RE.captures(&line) {
                        break (n, caps[1].to_string(), caps[2].to_string());
                    }
                }
            }
        };

        let (_, created) = ingested.files.entry(&file_id, &file_name);
        if created {
            tracing::debug!("First instance of {}", file_name);
        }

        let rank = loop {
            match lines.next().transpose()? {
                None => {
                    tracing::warn!(
                        "Section for {} ends before its rank line; stopping ingestion",
                        file_name
                    );
                    ingested.diagnostics.push(IngestDiagnostic::TruncatedSection {
                        line: header_line,
                        file_id,
                    });
                    break 'sections;
                }
                Some((_, line)) => {
                    if let Some(caps) = RANK_LINE_RE.captures(&line) {
                        break caps[1].to_string();
                    }
                }
            }
        };
        tracing::debug!("reading rank {} {}", rank, file_name);

        let (file, _) = ingested.files.entry(&file_id, &file_name);
        while let Some((n, line)) = lines.next().transpose()? {
            if line.is_empty() {
                break;
            }
            if line.starts_with('#') {
                continue;
            }

            match parse_event_line(&line) {
                Ok(event) => file.push(event),
                Err(LineError::Unrecognized) => {
                    tracing::warn!("Unrecognized line: {}", line);
                    ingested
                        .diagnostics
                        .push(IngestDiagnostic::UnrecognizedLine { line: n, text: line });
                }
                Err(LineError::Degenerate(reason)) => {
                    tracing::warn!("Dropped event ({}): {}", reason, line);
                    ingested.diagnostics.push(IngestDiagnostic::DegenerateEvent {
                        line: n,
                        text: line,
                        reason,
                    });
                }
            }
        }
    }

    ingested.files.finish();
    tracing::info!(
        "Ingested {} events across {} files ({} diagnostics)",
        ingested.files.event_count(),
        ingested.files.len(),
        ingested.diagnostics.len()
    );
    Ok(ingested)
}

/// Read a trace held in memory
pub fn parse_str(text: &str) -> io::Result<Ingested> {
    parse_trace(text.as_bytes())
}

/// Read a trace from a file, or from stdin when the path is `-`
pub fn parse_path(path: &Path) -> Result<Ingested> {
    if path.as_os_str() == "-" {
        let stdin = io::stdin();
        return parse_trace(stdin.lock()).context("Failed to read trace from stdin");
    }

    let file =
        File::open(path).with_context(|| format!("Failed to open trace {}", path.display()))?;
    parse_trace(BufReader::new(file))
        .with_context(|| format!("Failed to read trace {}", path.display()))
}
