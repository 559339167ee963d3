//! Human-readable report format (default)

use crate::conflict::{AnalysisReport, FileReport, Finding};
use std::fmt::Write;

/// Render one finding as a single line
pub fn format_finding(finding: &Finding) -> String {
    match finding {
        Finding::Conflict(c) => {
            let time = match c.time {
                Some(t) => format!("concurrent {}", t),
                None => "not concurrent".to_string(),
            };
            format!(
                "conflict bytes {}: {} <-> {} ({})",
                c.bytes, c.event, c.other, time
            )
        }
        Finding::FalseSharing(s) => format!(
            "false sharing block {}: {} <-> {}",
            s.blocks, s.event, s.other
        ),
        Finding::Anomaly(a) => format!(
            "anomaly: {}: {} <-> {}",
            a.description, a.event, a.other
        ),
    }
}

fn render_file(out: &mut String, file: &FileReport) {
    let _ = writeln!(
        out,
        "File {} (id {}, {} events)",
        file.file_name, file.file_id, file.event_count
    );
    if file.findings.is_empty() {
        let _ = writeln!(out, "  no conflicts");
        return;
    }
    for finding in &file.findings {
        let _ = writeln!(out, "  {}", format_finding(finding));
    }
}

/// Render every file's findings followed by a totals line
pub fn render(report: &AnalysisReport) -> String {
    let mut out = String::new();
    for file in &report.files {
        render_file(&mut out, file);
    }

    let totals = report.totals();
    let _ = writeln!(
        out,
        "{} conflicts, {} false sharing, {} anomalies in {} files ({} events)",
        totals.conflicts, totals.false_sharing, totals.anomalies, totals.files, totals.events
    );
    out
}
