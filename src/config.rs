use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cli::Args;

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of traces to run per destination
    pub count: u32,
    /// Pause between consecutive traces
    #[serde(with = "duration_serde")]
    pub interval: Duration,
    /// Optional upper bound on a single probe invocation
    #[serde(default, with = "opt_duration_serde")]
    pub probe_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            count: 3,
            interval: Duration::from_secs(5),
            probe_timeout: None,
        }
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            count: args.count,
            interval: args.interval_duration(),
            probe_timeout: args.probe_timeout_duration(),
        }
    }
}

/// Serde helper for Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

/// Serde helper for Option<Duration>
mod opt_duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.map(|d| d.as_secs_f64()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<f64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs_f64))
    }
}
