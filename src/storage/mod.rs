// src/storage/mod.rs
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::render::html::RenderSummary;
use crate::theses::SortPolicy;
use crate::utils::error::StorageError;

/// Creates the parent directories of `path` if they are missing.
fn ensure_parent_dir(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(StorageError::IoError)?;
        }
    }
    Ok(())
}

/// Writes the rendered fragment to `dest`, or to stdout when no file is given.
pub fn write_fragment(fragment: &[u8], dest: Option<&Path>) -> Result<(), StorageError> {
    match dest {
        Some(path) => {
            ensure_parent_dir(path)?;
            fs::write(path, fragment).map_err(StorageError::IoError)?;
            tracing::info!("Saved fragment to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(fragment)?;
            handle.flush()?;
        }
    }
    Ok(())
}

/// Builds the JSON summary of a run.
pub fn metadata_json(source: &Path, policy: SortPolicy, summary: &RenderSummary) -> Result<String, StorageError> {
    let metadata = serde_json::json!({
        "source": source.display().to_string(),
        "order": policy.as_str(),
        "total": summary.total,
        "ms": summary.ms,
        "phd": summary.phd,
        "generated_at": chrono::Utc::now().to_rfc3339(),
    });

    serde_json::to_string_pretty(&metadata).map_err(|e| StorageError::SerializationError(e.to_string()))
}

/// Saves an already built metadata document, creating parent directories.
pub fn save_metadata(path: &Path, metadata: &str) -> Result<PathBuf, StorageError> {
    ensure_parent_dir(path)?;
    fs::write(path, metadata).map_err(StorageError::IoError)?;

    tracing::info!("Saved metadata to {}", path.display());

    Ok(path.to_path_buf())
}

/// Writes the metadata file (if any) and then the fragment.
///
/// Metadata goes first so that a metadata failure leaves no fragment behind.
/// If the fragment cannot be written the metadata file is removed again.
pub fn publish(fragment: &[u8], dest: Option<&Path>, metadata: Option<(&Path, &str)>) -> Result<(), StorageError> {
    if let Some((path, document)) = metadata {
        save_metadata(path, document)?;
    }

    if let Err(e) = write_fragment(fragment, dest) {
        if let Some((path, _)) = metadata {
            if let Err(cleanup) = fs::remove_file(path) {
                tracing::warn!("Could not remove metadata {}: {}", path.display(), cleanup);
            }
        }
        return Err(e);
    }
    Ok(())
}
