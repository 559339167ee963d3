//! Trace summaries: per-rank event counts and full event listings

use crate::file_table::FileTable;
use std::fmt::Write;

/// Per-file, per-rank event counts
pub fn render_summary(table: &FileTable) -> String {
    let mut out = String::new();
    for file in table.iter() {
        let ranks = file.by_rank();
        let _ = writeln!(
            out,
            "File {} (id {}): {} events from {} ranks",
            file.name(),
            file.id(),
            file.len(),
            ranks.len()
        );
        for (rank, events) in &ranks {
            let writes = events.iter().filter(|e| e.mode().is_write()).count();
            let _ = writeln!(
                out,
                "  rank {}, {} events ({} writes, {} reads)",
                rank,
                events.len(),
                writes,
                events.len() - writes
            );
        }
    }
    out
}

/// Every file's events in sweep order
pub fn render_event_dump(table: &FileTable) -> String {
    let mut out = String::new();
    for file in table.iter() {
        let _ = writeln!(out, "File {}", file.name());
        for event in file.events() {
            let _ = writeln!(out, "{}", event);
        }
    }
    out
}
