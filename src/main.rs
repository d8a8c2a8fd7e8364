//! multifmt - Run multiple formatters in one command

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use multifmt::{parse_args, resolve, run_over_files, run_over_stdin, CliArgs, Config, Result};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let args = parse_args();
    init_tracing(args.debug);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `--debug` wins over `RUST_LOG`
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("multifmt=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}

/// Returns whether every target was formatted
fn run(args: &CliArgs) -> Result<bool> {
    let config = Config::build(args)?;
    config.validate()?;

    debug!(
        "Formatters: {:?}",
        config.chain.iter().map(ToString::to_string).collect::<Vec<_>>()
    );
    if config.vendor {
        debug!("Vendoring enabled");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let pipeline = config.pipeline();

    if config.is_stdin_mode() {
        run_over_stdin(&pipeline, io::stdin().lock(), config.write_back, &mut out)
            .context("formatting from stdin failed")?;
        return Ok(true);
    }

    let resolution = resolve(&config.paths, &config.skip);
    let resolved_all = resolution.warnings.is_empty();

    if resolution.files.is_empty() {
        eprintln!("No files found to format.");
        return Ok(resolved_all);
    }

    debug!("Resolved {} files", resolution.files.len());

    let summary = run_over_files(
        &pipeline,
        &resolution.files,
        config.write_back,
        config.jobs,
        &mut out,
    );

    if !summary.is_success() {
        eprintln!(
            "Formatting failed for {} of {} files.",
            summary.failed,
            summary.total()
        );
    }

    Ok(summary.is_success() && resolved_all)
}
