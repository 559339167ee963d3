//! CSV output format for conflict reports
//!
//! One row per finding, for spreadsheet analysis and machine parsing.
//! Ingestion diagnostics are not part of the table.

use crate::conflict::{AnalysisReport, Finding};
use crate::event::Event;

const HEADER: &str = "file_id,file_name,kind,rank_a,api_a,mode_a,offset_a,end_a,start_a,finish_a,rank_b,api_b,mode_b,offset_b,end_b,start_b,finish_b,range_first,range_last,time_start,time_end,description";

/// CSV output formatter
#[derive(Debug, Default)]
pub struct CsvOutput {
    rows: Vec<String>,
}

impl CsvOutput {
    /// Create a new CSV output formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table for a finished analysis
    pub fn from_report(report: &AnalysisReport) -> Self {
        let mut output = Self::new();
        for file in &report.files {
            for finding in &file.findings {
                output.add_finding(&file.file_id, &file.file_name, finding);
            }
        }
        output
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn event_fields(event: &Event) -> [String; 7] {
        [
            event.rank().to_string(),
            event.api().as_str().to_string(),
            event.mode().as_str().to_string(),
            event.offset().to_string(),
            event.end_offset().to_string(),
            format!("{:.4}", event.start_time()),
            format!("{:.4}", event.end_time()),
        ]
    }

    /// Add one finding as a row
    pub fn add_finding(&mut self, file_id: &str, file_name: &str, finding: &Finding) {
        let (a, b) = finding.events();
        let mut fields = vec![
            Self::escape_field(file_id),
            Self::escape_field(file_name),
            finding.kind().to_string(),
        ];
        fields.extend(Self::event_fields(a));
        fields.extend(Self::event_fields(b));

        let (range, time, description) = match finding {
            Finding::Conflict(c) => (Some(c.bytes), c.time, String::new()),
            Finding::FalseSharing(s) => (Some(s.blocks), None, String::new()),
            Finding::Anomaly(an) => (None, None, an.description.clone()),
        };

        match range {
            Some(r) => {
                fields.push(r.first.to_string());
                fields.push(r.last.to_string());
            }
            None => fields.extend([String::new(), String::new()]),
        }
        match time {
            Some(t) => {
                fields.push(format!("{:.4}", t.start));
                fields.push(format!("{:.4}", t.end));
            }
            None => fields.extend([String::new(), String::new()]),
        }
        fields.push(Self::escape_field(&description));

        self.rows.push(fields.join(","));
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(HEADER);
        output.push('\n');

        for row in &self.rows {
            output.push_str(row);
            output.push('\n');
        }

        output
    }
}
