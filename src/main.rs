use boostdex::{
    DocumentBuilder,
    SearchIndex,
    SignalSet,
    config::INDEX_DIR_ENV,
    error,
    ingestion::{self, IngestReport},
};
use std::time::Instant;

use clap::Parser;
use kdam::BarExt;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Command, IndexArgs};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("BOOSTDEX_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Index(args) => cmd_index(&args, cli.quiet)?,
        Command::Completions(args) => args.generate(),
    }

    Ok(())
}

fn cmd_index(args: &IndexArgs, quiet: bool) -> error::Result<()> {
    let config = args.to_run_config(std::env::var_os(INDEX_DIR_ENV));
    config.validate()?;

    let start = Instant::now();
    let signals = SignalSet::load(config.signals, &config.signal_paths)?;

    info!(index = %config.index_dir.display(), mode = ?config.mode, "indexing");
    let index = SearchIndex::open(&config.index_dir)?;
    let mut session = index.session(config.mode, config.memory_budget)?;
    let builder = DocumentBuilder::default();

    let show_progress = !(quiet || args.json);
    let mut bar = kdam::tqdm!(
        desc = "Indexing",
        unit = " files",
        disable = !show_progress
    );
    let mut report = ingestion::ingest(
        &config.docs_root,
        &signals,
        &builder,
        &mut session,
        |_| {
            if let Err(err) = bar.update(1) {
                debug!(%err, "progress bar update failed");
            }
        },
    )?;
    if show_progress {
        if let Err(err) = bar.refresh() {
            debug!(%err, "progress bar refresh failed");
        }
        eprintln!();
    }

    session.finish()?;
    report.stamp_elapsed(start);
    info!(elapsed_ms = report.elapsed_ms, "indexing finished");

    if args.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &IngestReport) {
    println!("Indexed {} documents", report.indexed);
    if report.skipped() > 0 {
        println!(
            "Skipped {} (missing signal: {}, invalid boost: {}, \
             unreadable: {}, walk errors: {})",
            report.skipped(),
            report.missing_signal,
            report.invalid_boost,
            report.unreadable,
            report.walk_errors,
        );
    }
    println!("{} total milliseconds", report.elapsed_ms);
}
