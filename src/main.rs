use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::debug;

mod cli;
mod config;
mod export;
mod probe;
mod state;
mod trace;

use cli::Args;
use config::Config;
use export::{export_csv, export_json, generate_report};
use state::TraceSeries;
use trace::TraceEngine;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    init_logging(&args);

    let config = Config::from(&args);
    debug!(?config, "resolved configuration");

    // Cancellation token for graceful shutdown
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        cancel_clone.cancel();
    });

    for (i, destination) in args.destinations.iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }

        let engine = TraceEngine::new(config.clone(), destination.clone(), cancel.clone());
        let series = engine
            .run()
            .await
            .with_context(|| format!("trace session for {} aborted", destination))?;

        if series.runs.is_empty() {
            // Cancelled before the first trace completed
            continue;
        }

        if args.destinations.len() > 1 && !args.json && !args.csv {
            println!(
                "\n=== Destination {}/{}: {} ===\n",
                i + 1,
                args.destinations.len(),
                destination
            );
        }
        output_series(&args, &series)?;
    }

    Ok(())
}

/// Initialize logging based on verbosity settings
fn init_logging(args: &Args) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");
}

/// Render one completed session to stdout in the selected format
fn output_series(args: &Args, series: &TraceSeries) -> Result<()> {
    if args.json {
        export_json(series, std::io::stdout())?;
    } else if args.csv {
        export_csv(series, std::io::stdout())?;
    } else {
        generate_report(series, std::io::stdout())?;
    }
    Ok(())
}
