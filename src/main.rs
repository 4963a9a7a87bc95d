use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{LevelFilter, debug, error, info, warn};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use dupfinder::report;
use dupfinder::signal::{self, EXIT_CODE_INTERRUPTED};
use dupfinder::{Cli, Config, ScanError, ScanOptions, Settings, format_human_elapsed, print_results, scan_with_options};

fn init_logger(cli: &Cli) {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    let mut builder = ConfigBuilder::new();
    let config = match builder.set_time_offset_to_local() {
        Ok(b) | Err(b) => b.build(),
    };
    // Only fails if a logger is already installed.
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn run(cli: &Cli, root: &Path) -> Result<()> {
    let start_time = Instant::now();
    let config = Config::discover(cli.config.as_deref())?;
    let settings = Settings::resolve(cli, config);
    debug!("Effective settings: {:?}", settings);

    let cancel = match signal::install_handler() {
        Ok(token) => Some(token),
        Err(e) => {
            warn!("Failed to install Ctrl+C handler: {}", e);
            None
        }
    };

    let options = ScanOptions {
        threads: settings.threads,
        chunk_size: settings.chunk_size,
        follow_links: settings.follow_links,
        cancel,
        progress: settings.progress,
    };
    let outcome = scan_with_options(root, &options)?;

    if cli.json {
        println!("{}", report::render_json(&outcome).context("Failed to serialize results")?);
    } else {
        print_results(&outcome, root);
        if let Some(path) = report::write_report(&outcome.groups, &settings.output_dir)? {
            println!("Results written to file: {}", path.display());
        }
    }

    info!("Completed in {}", format_human_elapsed(start_time.elapsed()));
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(&cli);
    info!("Starting dupfinder v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command line arguments: {:?}", cli);

    let Some(root) = cli.directory.as_deref() else {
        // Nothing to scan without a directory.
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    match run(&cli, root) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if matches!(e.downcast_ref::<ScanError>(), Some(ScanError::Cancelled)) {
                warn!("Scan interrupted");
                return ExitCode::from(EXIT_CODE_INTERRUPTED as u8);
            }
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
