//! spscring-bench
//!
//! Measures every buffer variant with the classic batch workload
//! (`rounds` x `batch` items) single-threaded and across two pinned threads,
//! then prints a markdown table of ops/ms.
//!
//! ```text
//! spscring-bench --variant lockfree,cached --mode two --verify
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use spscring::Config;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod affinity;
mod baseline;
mod cli;
mod report;
mod selftest;
mod workload;

use crate::cli::{Args, Mode};
use crate::workload::Params;

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let variants = args.variants();
    let config = Config::new(args.capacity, args.metrics);
    let params = Params {
        batch: args.batch,
        rounds: args.rounds,
        retry: args.retry.into(),
        pin: args.pinning(),
        verify: args.verify,
    };

    info!("Starting spscring-bench");
    info!("  Capacity: {} slots", config.capacity);
    info!("  Batch: {} x {} rounds", params.batch, params.rounds);
    info!("  Mode: {}", args.mode);
    info!("  Retry: {:?}", params.retry);
    match params.pin {
        Some((p, c)) => info!("  Pinning: producer core {}, consumer core {}", p, c),
        None => info!("  Pinning: disabled"),
    }

    selftest::check_all(&variants).context("self-check failed")?;

    let mut results = Vec::new();
    for &variant in &variants {
        for &mode in args.mode.workloads() {
            if variant.is_single_threaded() && mode == Mode::Two {
                info!(%variant, "skipping two-thread run for a single-threaded queue");
                continue;
            }
            let result = workload::run(variant, mode, config, &params)
                .with_context(|| format!("{variant} {mode} run failed"))?;
            results.push(result);
        }
    }

    println!("{}", report::render(&results));
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
