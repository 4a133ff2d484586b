use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::Config;

/// Number of timing attempts the probe makes per hop
pub const SAMPLES_PER_HOP: usize = 3;

/// One measured (or missing) hop on a traced path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HopRecord {
    /// 1-based hop number, taken verbatim from the probe output
    pub hop: u32,
    /// Dotted-quad address text; None when the hop never identified itself
    pub address: Option<String>,
    /// Name the probe printed before the address, when distinct from it
    pub hostname: Option<String>,
    /// Round-trip times in milliseconds, one slot per attempt
    pub samples: [Option<f64>; SAMPLES_PER_HOP],
}

impl HopRecord {
    pub fn new(hop: u32) -> Self {
        Self {
            hop,
            address: None,
            hostname: None,
            samples: [None; SAMPLES_PER_HOP],
        }
    }

    /// Mean of the attempts that answered, None when all three timed out
    pub fn average_rtt(&self) -> Option<f64> {
        let mut sum = 0.0;
        let mut n = 0usize;
        for rtt in self.samples.iter().flatten() {
            sum += rtt;
            n += 1;
        }
        if n == 0 {
            None
        } else {
            Some(sum / n as f64)
        }
    }

    /// True when the hop produced neither an address nor any timing sample
    #[allow(dead_code)]
    pub fn is_full_timeout(&self) -> bool {
        self.address.is_none() && self.samples.iter().all(Option::is_none)
    }
}

/// Hop records from one probe invocation, tagged with its place in the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRun {
    /// 1-based trace sequence number within the session
    pub trace: u32,
    /// Wall-clock capture time of this run
    pub captured_at: DateTime<Utc>,
    pub hops: Vec<HopRecord>,
}

/// One row of the flattened series view consumed by exporters
#[derive(Debug, Clone, Copy)]
pub struct TraceRow<'a> {
    pub trace: u32,
    pub captured_at: DateTime<Utc>,
    pub record: &'a HopRecord,
}

/// A complete multi-trace session against one destination
///
/// Grows by append only; runs are never mutated once pushed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSeries {
    pub destination: String,
    pub started_at: DateTime<Utc>,
    pub config: Config,
    pub runs: Vec<TraceRun>,
}

impl TraceSeries {
    pub fn new(destination: String, config: Config) -> Self {
        Self {
            destination,
            started_at: Utc::now(),
            config,
            runs: Vec::new(),
        }
    }

    pub fn push_run(&mut self, run: TraceRun) {
        self.runs.push(run);
    }

    /// Flatten the session into one row per hop record, in capture order
    pub fn rows(&self) -> impl Iterator<Item = TraceRow<'_>> {
        self.runs.iter().flat_map(|run| {
            run.hops.iter().map(|record| TraceRow {
                trace: run.trace,
                captured_at: run.captured_at,
                record,
            })
        })
    }

    /// Per-hop mean of the per-record average RTTs, across all runs
    ///
    /// Records whose three samples all timed out contribute nothing.
    pub fn mean_rtt_by_hop(&self) -> BTreeMap<u32, f64> {
        let mut sums: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
        for row in self.rows() {
            if let Some(avg) = row.record.average_rtt() {
                let entry = sums.entry(row.record.hop).or_insert((0.0, 0));
                entry.0 += avg;
                entry.1 += 1;
            }
        }
        sums.into_iter()
            .map(|(hop, (sum, n))| (hop, sum / n as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hop: u32, samples: [Option<f64>; SAMPLES_PER_HOP]) -> HopRecord {
        HopRecord {
            hop,
            address: Some(format!("10.0.0.{}", hop)),
            hostname: None,
            samples,
        }
    }

    #[test]
    fn test_average_rtt_skips_absent_samples() {
        let rec = record(1, [Some(1.0), None, Some(3.0)]);
        assert_eq!(rec.average_rtt(), Some(2.0));
    }

    #[test]
    fn test_average_rtt_all_absent() {
        let rec = record(1, [None, None, None]);
        assert_eq!(rec.average_rtt(), None);
    }

    #[test]
    fn test_average_rtt_single_sample() {
        let rec = record(2, [None, Some(4.5), None]);
        assert_eq!(rec.average_rtt(), Some(4.5));
    }

    #[test]
    fn test_full_timeout_detection() {
        let rec = HopRecord::new(7);
        assert!(rec.is_full_timeout());

        let partial = record(7, [None, None, None]);
        // Address present means the hop answered, even without timings
        assert!(!partial.is_full_timeout());
    }

    #[test]
    fn test_rows_flatten_in_capture_order() {
        let mut series = TraceSeries::new("example.com".to_string(), Config::default());
        series.push_run(TraceRun {
            trace: 1,
            captured_at: Utc::now(),
            hops: vec![record(1, [Some(1.0); 3]), record(2, [Some(2.0); 3])],
        });
        series.push_run(TraceRun {
            trace: 2,
            captured_at: Utc::now(),
            hops: vec![record(1, [Some(3.0); 3])],
        });

        let rows: Vec<_> = series.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].trace, 1);
        assert_eq!(rows[0].record.hop, 1);
        assert_eq!(rows[2].trace, 2);
        assert_eq!(rows[2].record.hop, 1);
    }

    #[test]
    fn test_mean_rtt_by_hop_across_runs() {
        let mut series = TraceSeries::new("example.com".to_string(), Config::default());
        series.push_run(TraceRun {
            trace: 1,
            captured_at: Utc::now(),
            hops: vec![record(1, [Some(1.0); 3]), record(2, [None, None, None])],
        });
        series.push_run(TraceRun {
            trace: 2,
            captured_at: Utc::now(),
            hops: vec![record(1, [Some(3.0); 3]), record(2, [Some(8.0); 3])],
        });

        let means = series.mean_rtt_by_hop();
        assert_eq!(means.get(&1), Some(&2.0));
        // Hop 2's all-timeout record in trace 1 contributes nothing
        assert_eq!(means.get(&2), Some(&8.0));
    }

    #[test]
    fn test_series_serialization_roundtrip() {
        let mut series = TraceSeries::new("8.8.8.8".to_string(), Config::default());
        series.push_run(TraceRun {
            trace: 1,
            captured_at: Utc::now(),
            hops: vec![HopRecord {
                hop: 1,
                address: Some("192.168.1.1".to_string()),
                hostname: Some("router.local".to_string()),
                samples: [Some(1.25), None, Some(0.9)],
            }],
        });

        let json = serde_json::to_string(&series).unwrap();
        let restored: TraceSeries = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.destination, "8.8.8.8");
        assert_eq!(restored.runs.len(), 1);
        assert_eq!(restored.runs[0].hops, series.runs[0].hops);
    }
}
