//! Repeated trace session driver.

use anyhow::Result;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::probe::run_probe;
use crate::state::{TraceRun, TraceSeries};
use crate::trace::parser::parse_output;

/// Drives the probe-and-parse cycle for a single destination
pub struct TraceEngine {
    config: Config,
    destination: String,
    cancel: CancellationToken,
}

impl TraceEngine {
    pub fn new(config: Config, destination: String, cancel: CancellationToken) -> Self {
        Self {
            config,
            destination,
            cancel,
        }
    }

    /// Run the configured number of traces, pausing between repetitions
    /// (never before the first or after the last).
    ///
    /// A probe failure aborts the remaining repetitions and propagates.
    /// Cancellation between repetitions ends the session early; runs already
    /// completed stay in the returned series.
    pub async fn run(self) -> Result<TraceSeries> {
        let mut series = TraceSeries::new(self.destination.clone(), self.config.clone());

        for trace in 1..=self.config.count {
            if trace > 1 {
                debug!(interval = ?self.config.interval, "waiting before next trace");
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.config.interval) => {}
                }
            }
            if self.cancel.is_cancelled() {
                break;
            }

            info!(
                destination = %self.destination,
                trace,
                count = self.config.count,
                "running trace"
            );
            let raw = run_probe(&self.destination, self.config.probe_timeout).await?;
            let hops = parse_output(&raw);
            debug!(hops = hops.len(), "trace parsed");

            series.push_run(TraceRun {
                trace,
                captured_at: Utc::now(),
                hops,
            });
        }

        Ok(series)
    }
}
