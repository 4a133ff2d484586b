use anyhow::Result;
use std::io::Write;

use crate::state::TraceSeries;

/// Export the complete series as pretty-printed JSON
pub fn export_json<W: Write>(series: &TraceSeries, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, series)?;
    writeln!(writer)?;
    Ok(())
}
