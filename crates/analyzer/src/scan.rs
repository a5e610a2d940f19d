//! Log location discovery in a working directory.

use cbtopo_common::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// List the log locations directly under `dir`.
///
/// Plain files and hidden entries (leading `.`) are skipped. Locations are
/// returned sorted by name, which fixes the order later duplicates are
/// resolved in.
pub fn scan_log_locations(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut locations = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();

        if name.starts_with('.') {
            debug!("Skipping hidden entry {}", name);
            continue;
        }
        if path.is_file() {
            continue;
        }

        locations.push(path);
    }

    locations.sort();
    Ok(locations)
}
