//! JSON output format for conflict reports

use crate::conflict::{AnalysisReport, Finding, ReportTotals};
use crate::ingest::IngestDiagnostic;
use serde::Serialize;

/// Findings for one file
#[derive(Debug, Clone, Serialize)]
pub struct JsonFile {
    /// DXT file id (hash of the full path)
    pub file_id: String,
    /// Recorded path, possibly truncated
    pub file_name: String,
    /// Number of events analyzed for this file
    pub events: usize,
    pub findings: Vec<Finding>,
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    /// Block size the analysis ran with
    pub block_size: u64,
    /// Per-file findings, in trace order
    pub files: Vec<JsonFile>,
    /// Ingestion diagnostics
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<IngestDiagnostic>,
    /// Summary counts
    pub summary: ReportTotals,
}

impl JsonOutput {
    /// Create an empty JSON output structure
    pub fn new(block_size: u64) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "dxtscan-json-v1".to_string(),
            block_size,
            files: Vec::new(),
            diagnostics: Vec::new(),
            summary: ReportTotals::default(),
        }
    }

    /// Build the output for a finished analysis
    pub fn from_report(report: &AnalysisReport, block_size: u64) -> Self {
        let mut output = Self::new(block_size);
        output.files = report
            .files
            .iter()
            .map(|f| JsonFile {
                file_id: f.file_id.clone(),
                file_name: f.file_name.clone(),
                events: f.event_count,
                findings: f.findings.clone(),
            })
            .collect();
        output.diagnostics = report.diagnostics.clone();
        output.summary = report.totals();
        output
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
