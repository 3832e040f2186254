//! Fingerprint command implementation.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::debug;
use waybill_core::Fingerprint;

/// Execute the fingerprint command.
///
/// Files are streamed, so large screenshots are never held in memory whole.
pub async fn execute(files: Vec<PathBuf>, json_output: bool) -> Result<()> {
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file = File::open(&path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let fingerprint = Fingerprint::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to fingerprint {}", path.display()))?;
        debug!(path = %path.display(), fingerprint = %fingerprint.short(), "Fingerprinted");
        results.push((path, fingerprint));
    }

    if json_output {
        let entries: Vec<_> = results
            .iter()
            .map(|(path, fp)| json!({ "file": path.display().to_string(), "fingerprint": fp }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        // sha256sum layout
        for (path, fp) in &results {
            println!("{}  {}", fp, path.display());
        }
    }

    Ok(())
}
