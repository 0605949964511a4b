//! Test utilities and fixtures for tune-harvest tests.
//!
//! This module provides common test helpers and mock factories to reduce
//! boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use tune_harvest::test_utils::{mock_item, write_silent_mp3};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let dir = tempfile::tempdir().unwrap();
//!     let path = dir.path().join("song.mp3");
//!     write_silent_mp3(&path);
//!     let item = mock_item("Song");
//!     // ... test logic
//! }
//! ```

use std::path::Path;

use crate::model::Item;

/// MPEG-1 Layer III, 128 kbps, 44.1 kHz, joint stereo, no padding.
const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];

/// 144 * 128000 / 44100, rounded down
const FRAME_LEN: usize = 417;

const FRAME_COUNT: usize = 20;

/// Creates a mock Item with sensible defaults.
///
/// Customize using struct update syntax:
///
/// ```ignore
/// let item = Item {
///     artists: vec!["Someone Else".to_string()],
///     ..mock_item("Song")
/// };
/// ```
pub fn mock_item(title: &str) -> Item {
    Item {
        title: title.to_string(),
        artists: vec!["Test Artist".to_string()],
        album: "Test Album".to_string(),
        album_artists: vec!["Test Artist".to_string()],
        release_date: "2023-01-01".to_string(),
        cover_art_url: Some(format!("https://img.example.com/{}", title)),
        target_dir: std::env::temp_dir(),
    }
}

/// Silent MP3 payload without any tag.
pub fn silent_mp3_bytes() -> Vec<u8> {
    let mut bytes = Vec::with_capacity(FRAME_LEN * FRAME_COUNT);
    for _ in 0..FRAME_COUNT {
        bytes.extend_from_slice(&FRAME_HEADER);
        bytes.resize(bytes.len() + FRAME_LEN - FRAME_HEADER.len(), 0);
    }
    bytes
}

/// Writes a short untagged MP3 to `path`, creating parent directories.
pub fn write_silent_mp3(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(path, silent_mp3_bytes()).expect("Failed to write test MP3");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_item_defaults() {
        let item = mock_item("Song");
        assert_eq!(item.title, "Song");
        assert_eq!(item.artists, vec!["Test Artist".to_string()]);
        assert_eq!(item.album, "Test Album");
        assert!(item.cover_art_url.unwrap().ends_with("Song"));
    }

    #[test]
    fn test_silent_mp3_is_frame_aligned() {
        let bytes = silent_mp3_bytes();
        assert_eq!(bytes.len(), FRAME_LEN * FRAME_COUNT);
        assert_eq!(&bytes[..4], &FRAME_HEADER);
        assert_eq!(&bytes[FRAME_LEN..FRAME_LEN + 4], &FRAME_HEADER);
    }

    #[test]
    fn test_silent_mp3_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("silent.mp3");
        write_silent_mp3(&path);

        let snapshot = crate::metadata::read(&path).unwrap();
        assert_eq!(snapshot, crate::metadata::TagSnapshot::default());
    }
}
