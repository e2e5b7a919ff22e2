use std::path::{Path, PathBuf};

use super::MIN_ARTIFACT_BYTES;

/// Inspect whatever survived an aborted or failed capture.
///
/// Looks at file existence and size only; no content validation. Files below
/// the floor are treated as noise and deleted rather than offered to the
/// caller. Returns the path and size of a salvageable artifact.
pub fn salvage(path: &Path) -> Option<(PathBuf, u64)> {
    let metadata = fs_err::metadata(path).ok()?;
    let size = metadata.len();

    if size >= MIN_ARTIFACT_BYTES {
        tracing::info!("Salvaged partial artifact: {} ({} bytes)", path.display(), size);
        Some((path.to_path_buf(), size))
    } else {
        tracing::debug!("Discarding undersized artifact: {} ({} bytes)", path.display(), size);
        let _ = fs_err::remove_file(path);
        None
    }
}
