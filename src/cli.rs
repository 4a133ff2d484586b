use clap::Parser;
use std::time::Duration;

/// Repeated traceroute sessions with structured per-hop latency records
#[derive(Parser, Debug, Clone)]
#[command(name = "retrace")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Destinations to trace (hostname or IP address)
    #[arg(required = true)]
    pub destinations: Vec<String>,

    /// Number of traces to run per destination
    #[arg(short = 'c', long = "count", default_value = "3")]
    pub count: u32,

    /// Pause between traces in seconds
    #[arg(short = 'i', long = "interval", default_value = "5.0")]
    pub interval: f64,

    /// Give up on a single probe run after this many seconds
    #[arg(long = "probe-timeout")]
    pub probe_timeout: Option<f64>,

    /// Output JSON instead of the text report
    #[arg(long = "json")]
    pub json: bool,

    /// Output CSV instead of the text report
    #[arg(long = "csv")]
    pub csv: bool,

    /// Output the text report (default)
    #[arg(long = "report")]
    pub report: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Get the inter-trace pause as Duration
    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs_f64(self.interval)
    }

    /// Get the per-probe timeout as Duration
    pub fn probe_timeout_duration(&self) -> Option<Duration> {
        self.probe_timeout.map(Duration::from_secs_f64)
    }

    /// Log level from verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.destinations.iter().any(|d| d.trim().is_empty()) {
            return Err("Destination cannot be empty".into());
        }

        if self.count == 0 {
            return Err("Count must be at least 1".into());
        }

        if self.interval <= 0.0 {
            return Err("Interval must be positive".into());
        }

        if let Some(timeout) = self.probe_timeout {
            if timeout <= 0.0 {
                return Err("Probe timeout must be positive".into());
            }
        }

        if [self.json, self.csv, self.report].iter().filter(|f| **f).count() > 1 {
            return Err("Pick at most one of --json, --csv, --report".into());
        }

        Ok(())
    }
}
