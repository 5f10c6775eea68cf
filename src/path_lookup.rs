// src/path_lookup.rs

//! Executable search-path lookup.

use tracing::trace;

/// Whether `filename` resolves to an executable through `PATH`.
///
/// Names containing a path separator are checked directly instead of being
/// searched for. Only existence is reported, not the resolved location.
pub fn exists_in_path(filename: &str) -> bool {
    if filename.trim().is_empty() {
        return false;
    }
    match which::which(filename) {
        Ok(path) => {
            trace!(filename, resolved = %path.display(), "found in PATH");
            true
        }
        Err(err) => {
            trace!(filename, error = %err, "not found in PATH");
            false
        }
    }
}
