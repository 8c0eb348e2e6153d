use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;
use crate::utils::{UpscaleResult, is_supported_image};

/// Check if file exists
pub async fn file_exists(path: impl AsRef<Path>) -> bool {
    fs::metadata(path.as_ref())
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Create the parent directory of `path` if it is missing
pub async fn ensure_parent_dir(path: impl AsRef<Path>) -> std::io::Result<()> {
    match path.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}

/// Remove the file at `path`; a missing file is not an error
pub async fn remove_file_if_exists(path: impl AsRef<Path>) -> std::io::Result<()> {
    match fs::remove_file(path.as_ref()).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Recursively collects supported images under `dir`, sorted by path.
///
/// Unsupported files are skipped silently; unreadable entries abort the walk.
pub fn discover_images(dir: &Path) -> UpscaleResult<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}
