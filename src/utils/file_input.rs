//! File input utilities for reading host specs from files
//!
//! Plain text, one host spec per line. Blank lines and `#` comments are
//! skipped; duplicates are dropped while preserving first-seen order.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read host specs from a file
pub fn targets_from_file<P: AsRef<Path>>(file_path: P) -> Result<Vec<String>> {
    let path = file_path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {} of {}", index + 1, path.display()))?;
        let line = match line.split_once('#') {
            Some((before, _)) => before.trim(),
            None => line.trim(),
        };

        if line.is_empty() {
            continue;
        }
        if seen.insert(line.to_string()) {
            targets.push(line.to_string());
        }
    }

    log::info!("Read {} targets from {}", targets.len(), path.display());
    Ok(targets)
}
