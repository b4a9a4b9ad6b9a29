use std::path::{Path, PathBuf};
use tracing::debug;

/// First candidate that exists and is a directory, in the order given.
pub fn first_existing_dir(candidates: &[PathBuf]) -> Option<&Path> {
    candidates
        .iter()
        .find(|c| {
            let hit = c.is_dir();
            debug!("probing {}: {}", c.display(), if hit { "found" } else { "absent" });
            hit
        })
        .map(PathBuf::as_path)
}
