use std::io::Write;

use crate::state::TraceSeries;

/// Generate a plain-text report of every run plus the per-hop summary
pub fn generate_report<W: Write>(series: &TraceSeries, mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "retrace report for {}", series.destination)?;
    writeln!(
        writer,
        "Started: {}",
        series.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(
        writer,
        "Traces: {} every {:.1}s",
        series.runs.len(),
        series.config.interval.as_secs_f64()
    )?;
    writeln!(writer)?;

    // Header
    writeln!(
        writer,
        "{:>5} {:>3}  {:<16} {:<30} {:>9} {:>9} {:>9} {:>9}",
        "Trace", "#", "Address", "Hostname", "RTT1", "RTT2", "RTT3", "Avg"
    )?;
    writeln!(writer, "{}", "-".repeat(98))?;

    for row in series.rows() {
        let record = row.record;
        let address = record.address.as_deref().unwrap_or("*");
        let hostname = record.hostname.as_deref().unwrap_or("");
        let rtt = |sample: Option<f64>| match sample {
            Some(v) => format!("{:.1}ms", v),
            None => "-".to_string(),
        };

        writeln!(
            writer,
            "{:>5} {:>3}  {:<16} {:<30} {:>9} {:>9} {:>9} {:>9}",
            row.trace,
            record.hop,
            address,
            hostname,
            rtt(record.samples[0]),
            rtt(record.samples[1]),
            rtt(record.samples[2]),
            rtt(record.average_rtt()),
        )?;
    }

    // Per-hop means across the whole session
    let means = series.mean_rtt_by_hop();
    if !means.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Average RTT by hop across all traces:")?;
        for (hop, mean) in means {
            writeln!(writer, "{:>8}  {:>8.1}ms", hop, mean)?;
        }
    }

    Ok(())
}

/// Generate report to string
#[allow(dead_code)]
pub fn generate_report_string(series: &TraceSeries) -> String {
    let mut buf = Vec::new();
    generate_report(series, &mut buf).expect("writing to Vec cannot fail");
    String::from_utf8(buf).expect("report is valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::{HopRecord, TraceRun};
    use chrono::Utc;

    #[test]
    fn test_report_contents() {
        let mut series = TraceSeries::new("example.com".to_string(), Config::default());
        series.push_run(TraceRun {
            trace: 1,
            captured_at: Utc::now(),
            hops: vec![
                HopRecord {
                    hop: 1,
                    address: Some("10.0.0.1".to_string()),
                    hostname: Some("gw.local".to_string()),
                    samples: [Some(1.0), Some(2.0), Some(3.0)],
                },
                HopRecord::new(2),
            ],
        });

        let report = generate_report_string(&series);

        assert!(report.contains("retrace report for example.com"));
        assert!(report.contains("gw.local"));
        // Timed-out hop shows the placeholder address and dashes
        assert!(report.contains('*'));
        assert!(report.contains("Average RTT by hop"));
        assert!(report.contains("2.0ms"));
    }
}
