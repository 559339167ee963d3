use anyhow::Result;
use clap::Parser;
use dxtscan::cli::{Cli, OutputFormat};
use dxtscan::config::AnalysisConfig;
use dxtscan::{conflict, csv_output, ingest, json_output, summary, text_output};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
///
/// Without `--debug` logging stays off unless RUST_LOG asks for it; findings
/// and diagnostics are printed directly.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => return,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Merge defaults, the optional config file and command-line overrides
fn load_config(args: &Cli) -> Result<AnalysisConfig> {
    let base = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    let config = base.with_overrides(args.block_size, args.jobs);
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(&args)?;
    tracing::debug!("analysis config: {:?}", config);

    let ingested = ingest::parse_path(&args.trace)?;

    if args.summary {
        print!("{}", summary::render_summary(&ingested.files));
    }
    if args.dump_events {
        print!("{}", summary::render_event_dump(&ingested.files));
    }

    let report = conflict::analyze(ingested, &config);

    match args.format {
        OutputFormat::Text => {
            for diagnostic in &report.diagnostics {
                eprintln!("{}", diagnostic);
            }
            print!("{}", text_output::render(&report));
        }
        OutputFormat::Json => {
            let output = json_output::JsonOutput::from_report(&report, config.block_size);
            println!("{}", output.to_json()?);
        }
        OutputFormat::Csv => {
            for diagnostic in &report.diagnostics {
                eprintln!("{}", diagnostic);
            }
            print!("{}", csv_output::CsvOutput::from_report(&report).to_csv());
        }
    }

    if args.fail_on_conflict && report.has_hazards() {
        std::process::exit(1);
    }

    Ok(())
}
