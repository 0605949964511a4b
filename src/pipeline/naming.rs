//! Output filenames for a batch.
//!
//! Every item gets a distinct name before dispatch so no two pipelines
//! write the same file. Duplicates are numbered in batch order:
//! `Song`, `Song (2)`, `Song (3)`. Names are compared case-insensitively
//! since common filesystems ignore case.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::model::Item;

/// Sanitizes a filename by removing/replacing invalid characters
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect();

    // Windows drops trailing dots and spaces silently
    let trimmed = replaced.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Assign a unique file stem to every item, in input order.
///
/// Uniqueness is per target directory.
pub fn assign_names(items: &[Item]) -> Vec<String> {
    let mut taken: HashSet<(PathBuf, String)> = HashSet::new();

    items
        .iter()
        .map(|item| {
            let base = sanitize_filename(&item.title);
            let mut candidate = base.clone();
            let mut n = 1;
            while !taken.insert((item.target_dir.clone(), candidate.to_lowercase())) {
                n += 1;
                candidate = format!("{} ({})", base, n);
            }
            if n > 1 {
                tracing::debug!("Renamed duplicate {:?} to {:?}", base, candidate);
            }
            candidate
        })
        .collect()
}
