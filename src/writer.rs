use crate::model::statistics::FileStatistics;
use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes `records` to `path` as one JSON array, replacing whatever was there.
pub fn write_statistics(records: &[FileStatistics], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, records)
        .with_context(|| format!("Failed to serialize statistics to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush output file {}", path.display()))?;

    info!("Wrote {} record(s) to '{}'..!", records.len(), path.display());
    Ok(())
}
