// Per-file conflict sweep
//
// Each file is scanned on its own with a fresh OverlapSet; nothing carries
// over between files, so the file loop can be split across threads.

use super::overlap_set::{MergeOutcome, OverlapSet};
use super::report::{AnalysisReport, FileReport, Finding};
use crate::config::AnalysisConfig;
use crate::event::block_start;
use crate::file_table::{FileAggregate, FileTable};
use crate::ingest::Ingested;

/// Sweep one file's events and collect everything found
pub fn scan_file(file: &FileAggregate, config: &AnalysisConfig) -> FileReport {
    let block_size = config.block_size.max(1);
    let mut report = FileReport::new(file.id(), file.name());
    report.event_count = file.len();

    tracing::debug!("scanning {} ({} events)", file.name(), file.len());
    if tracing::enabled!(tracing::Level::DEBUG) {
        for (rank, events) in file.by_rank() {
            tracing::debug!("  rank {}, {}", rank, events.len());
        }
    }

    let mut window = OverlapSet::new(block_size);

    for event in file.events() {
        // nothing ending before this event's first block can overlap it or
        // anything after it
        window.remove_old_events(block_start(event.offset(), block_size));

        match window.merge_same_rank(event) {
            MergeOutcome::Merged => continue,
            MergeOutcome::Anomaly(anomaly) => {
                tracing::warn!("{}: {}", file.name(), anomaly.description);
                report.findings.push(Finding::Anomaly(anomaly));
                continue;
            }
            MergeOutcome::Unmatched => {}
        }

        if !window.report_overlaps(event, &mut report.findings) {
            window.report_block_overlaps(event, &mut report.findings);
        }

        window.add_event(event.clone());
    }

    tracing::debug!(
        "{}: {} findings, {} events still active at end of sweep",
        file.name(),
        report.findings.len(),
        window.len()
    );
    report
}

/// Scan every file, returning reports in file discovery order
pub fn scan_table(table: &FileTable, config: &AnalysisConfig) -> Vec<FileReport> {
    let files = table.files();
    let jobs = config.jobs.max(1).min(files.len().max(1));

    if jobs <= 1 {
        return files.iter().map(|f| scan_file(f, config)).collect();
    }

    tracing::debug!("scanning {} files on {} workers", files.len(), jobs);
    let chunk = files.len().div_ceil(jobs);

    let scoped = crossbeam::thread::scope(|s| {
        let handles: Vec<_> = files
            .chunks(chunk)
            .map(|batch| {
                s.spawn(move |_| {
                    batch
                        .iter()
                        .map(|f| scan_file(f, config))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(reports) => reports,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect::<Vec<_>>()
    });

    match scoped {
        Ok(reports) => reports,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Scan an ingested trace and attach its ingestion diagnostics
pub fn analyze(ingested: Ingested, config: &AnalysisConfig) -> AnalysisReport {
    let files = scan_table(&ingested.files, config);
    let report = AnalysisReport {
        files,
        diagnostics: ingested.diagnostics,
    };

    let totals = report.totals();
    tracing::info!(
        "{} conflicts, {} false sharing, {} anomalies across {} files",
        totals.conflicts,
        totals.false_sharing,
        totals.anomalies,
        totals.files
    );
    report
}
