//! Adapter layer: Convert Spotify DTOs to items
//!
//! This is the ONLY place where Spotify types are converted to [`Item`]s.
//! If the Web API changes its response format, only this file and dto.rs
//! need to change.

use std::path::PathBuf;

use super::dto;
use crate::model::Item;

/// Convert playlist entries to items, dropping what cannot be downloaded.
///
/// Local files, removed tracks and podcast episodes are skipped.
pub fn to_items(entries: Vec<dto::PlaylistEntry>) -> Vec<Item> {
    entries.into_iter().filter_map(to_item).collect()
}

fn to_item(entry: dto::PlaylistEntry) -> Option<Item> {
    if entry.is_local {
        tracing::debug!("Skipping local file entry");
        return None;
    }
    let track = entry.track?;
    if track.kind.as_deref().is_some_and(|k| k != "track") {
        tracing::debug!("Skipping non-track entry {:?}", track.name);
        return None;
    }

    let album = track.album;
    let (album_name, album_artists, release_date, cover_art_url) = match album {
        Some(album) => (
            album.name,
            names(album.artists),
            album.release_date.unwrap_or_default(),
            // Spotify lists the largest image first
            album.images.into_iter().next().map(|i| i.url),
        ),
        None => (String::new(), Vec::new(), String::new(), None),
    };

    Some(Item {
        title: track.name,
        artists: names(track.artists),
        album: album_name,
        album_artists,
        release_date,
        cover_art_url,
        target_dir: PathBuf::new(),
    })
}

fn names(artists: Vec<dto::Artist>) -> Vec<String> {
    artists.into_iter().map(|a| a.name).collect()
}
