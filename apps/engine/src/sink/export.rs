use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::job::TransformationResult;

/// Writes every normalized job across `results` to `path`, one JSON document per
/// line, in provider order. Truncates any existing file and creates missing parent
/// directories. Returns the line count.
pub fn write_jsonl(path: &Path, results: &[TransformationResult]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut lines = 0;

    for job in results.iter().flat_map(|r| r.data.iter()) {
        serde_json::to_writer(&mut writer, job)
            .with_context(|| format!("Failed to encode job {}", job.job_id))?;
        writer.write_all(b"\n")?;
        lines += 1;
    }
    writer.flush()?;

    info!("Wrote {lines} normalized jobs to {}", path.display());
    Ok(lines)
}
