// src/io/reporting.rs

use crate::error::Result;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Writes any list of serializable records (tick history, episode summaries)
/// to a CSV file with a header row.
///
/// # Arguments
/// * `file_path` - The path to save the file (e.g., "results/history.csv").
/// * `data` - Records produced by the episode runner.
pub fn write_csv<T: Serialize>(file_path: impl AsRef<Path>, data: &[T]) -> Result<()> {
    let path = file_path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::Writer::from_path(path)?;
    for record in data {
        wtr.serialize(record)?;
    }

    // Flush the buffer to ensure all data is written
    wtr.flush()?;

    info!(rows = data.len(), path = %path.display(), "exported csv");
    Ok(())
}
