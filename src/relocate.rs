//! Moving a finished playlist directory somewhere else.
//!
//! Tries a plain rename first; when that fails (typically across devices)
//! the tree is copied with `walkdir` and the source removed.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Relocation errors
#[derive(Debug, thiserror::Error)]
pub enum RelocateError {
    #[error("Source directory {0:?} has no name")]
    NoName(PathBuf),

    #[error("Destination {0:?} already exists")]
    Exists(PathBuf),

    #[error("Failed to create {0:?}: {1}")]
    CreateDir(PathBuf, #[source] std::io::Error),

    #[error("Failed to copy {0:?}: {1}")]
    Copy(PathBuf, #[source] std::io::Error),

    #[error("Failed to walk {0:?}: {1}")]
    Walk(PathBuf, #[source] walkdir::Error),

    #[error("Failed to remove source directory {0:?}: {1}")]
    RemoveSource(PathBuf, #[source] std::io::Error),
}

/// Move `src` into `dest_parent`, keeping its directory name.
///
/// Returns the new location. Refuses to overwrite an existing entry.
pub fn relocate_dir(src: &Path, dest_parent: &Path) -> Result<PathBuf, RelocateError> {
    let name = src
        .file_name()
        .ok_or_else(|| RelocateError::NoName(src.to_path_buf()))?;
    let dest = dest_parent.join(name);

    if dest.exists() {
        return Err(RelocateError::Exists(dest));
    }

    fs::create_dir_all(dest_parent)
        .map_err(|e| RelocateError::CreateDir(dest_parent.to_path_buf(), e))?;

    if let Err(e) = fs::rename(src, &dest) {
        tracing::debug!("Rename failed ({}), falling back to copy", e);
        copy_then_remove(src, &dest)?;
    }

    tracing::info!("Moved {:?} to {:?}", src, dest);
    Ok(dest)
}

/// Copy `src` to `dest` and remove `src`. A failed copy removes the partial `dest`.
fn copy_then_remove(src: &Path, dest: &Path) -> Result<(), RelocateError> {
    if let Err(e) = copy_tree(src, dest) {
        if let Err(cleanup) = fs::remove_dir_all(dest) {
            tracing::warn!("Could not remove partial copy {:?}: {}", dest, cleanup);
        }
        return Err(e);
    }
    fs::remove_dir_all(src).map_err(|e| RelocateError::RemoveSource(src.to_path_buf(), e))
}

/// Recursively copy `src` to `dest`, which must not exist yet.
fn copy_tree(src: &Path, dest: &Path) -> Result<(), RelocateError> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| RelocateError::Walk(src.to_path_buf(), e))?;
        // WalkDir only yields paths under src
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| RelocateError::CreateDir(target.clone(), e))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|e| RelocateError::Copy(entry.path().to_path_buf(), e))?;
        }
    }
    Ok(())
}
