use anyhow::Result;
use std::io::Write;

use crate::state::TraceSeries;

/// Export the flattened series table as CSV
pub fn export_csv<W: Write>(series: &TraceSeries, mut writer: W) -> Result<()> {
    // Write header
    writeln!(
        writer,
        "trace,timestamp,hop,address,hostname,rtt1_ms,rtt2_ms,rtt3_ms,avg_ms"
    )?;

    // One row per hop record, in capture order
    for row in series.rows() {
        let record = row.record;
        let address = record.address.as_deref().unwrap_or("");
        let hostname = record.hostname.as_deref().unwrap_or("");
        let rtt = |sample: Option<f64>| sample.map(|v| format!("{:.3}", v)).unwrap_or_default();

        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{}",
            row.trace,
            row.captured_at.format("%Y-%m-%dT%H:%M:%SZ"),
            record.hop,
            address,
            escape_csv(hostname),
            rtt(record.samples[0]),
            rtt(record.samples[1]),
            rtt(record.samples[2]),
            rtt(record.average_rtt()),
        )?;
    }

    Ok(())
}

/// Escape a string for CSV (quote if contains comma, quote, or newline)
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::{HopRecord, TraceRun};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn test_csv_rows() {
        let mut series = TraceSeries::new("example.com".to_string(), Config::default());
        series.push_run(TraceRun {
            trace: 1,
            captured_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            hops: vec![
                HopRecord {
                    hop: 1,
                    address: Some("192.168.1.1".to_string()),
                    hostname: Some("gw.local".to_string()),
                    samples: [Some(1.0), None, Some(3.0)],
                },
                HopRecord::new(2),
            ],
        });

        let mut buf = Vec::new();
        export_csv(&series, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "1,2026-03-01T12:00:00Z,1,192.168.1.1,gw.local,1.000,,3.000,2.000"
        );
        // Full-timeout hop keeps its row with every value column empty
        assert_eq!(lines[2], "1,2026-03-01T12:00:00Z,2,,,,,,");
    }
}
