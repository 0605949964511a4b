//! Audio file tag reading and writing.
//!
//! Uses the lofty crate. Downloads are always transcoded to MP3, so the tag
//! container is ID3v2: core fields go through lofty's format-independent
//! [`Tag`], lyric frames are written on the [`Id3v2Tag`] directly because
//! they are keyed by a 3-letter language code.
//!
//! # Features
//! - Write title, artist, album, album artist and release date
//! - Replace embedded artwork
//! - Replace unsynchronized lyrics (one frame per language)
//! - Read back a [`TagSnapshot`] for verification and the `tag` command

use anyhow::{Context, Result};
use lofty::TextEncoding;
use lofty::config::{ParseOptions, WriteOptions};
use lofty::file::AudioFile;
use lofty::id3::v2::{Frame, Id3v2Tag, UnsynchronizedTextFrame};
use lofty::mpeg::MpegFile;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::{Accessor, ItemKey, Tag, TagExt, TagType};
use std::fs::File;
use std::path::Path;

use crate::enrichment::CoverArt;
use crate::enrichment::domain::MetadataRecord;

/// What is currently stored in a file's ID3v2 tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSnapshot {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub release_date: Option<String>,
    /// Embedded picture payloads
    pub pictures: Vec<Vec<u8>>,
    /// (language, text) for each unsynchronized lyrics frame
    pub lyrics: Vec<(String, String)>,
}

/// Read the ID3v2 tag of an MP3 file.
///
/// A file without a tag yields an empty snapshot.
pub fn read(path: &Path) -> Result<TagSnapshot> {
    let mut file = File::open(path).context("Failed to open file for reading")?;
    let mpeg = MpegFile::read_from(&mut file, ParseOptions::new())
        .context("Failed to read MPEG file")?;

    let Some(id3) = mpeg.id3v2() else {
        return Ok(TagSnapshot::default());
    };

    let lyrics = id3
        .unsync_text()
        .map(|frame| {
            (
                String::from_utf8_lossy(&frame.language).into_owned(),
                frame.content.clone(),
            )
        })
        .collect();

    let tag = Tag::from(id3.clone());

    Ok(TagSnapshot {
        title: tag.title().map(|s| s.to_string()),
        artist: tag.artist().map(|s| s.to_string()),
        album: tag.album().map(|s| s.to_string()),
        album_artist: tag.get_string(&ItemKey::AlbumArtist).map(String::from),
        release_date: tag.get_string(&ItemKey::RecordingDate).map(String::from),
        pictures: tag.pictures().iter().map(|p| p.data().to_vec()).collect(),
        lyrics,
    })
}

/// Load the file's existing tag, or start an empty one.
///
/// Unreadable files also get an empty tag; the save step reports the real
/// problem.
fn load_or_create(path: &Path) -> Tag {
    let existing = File::open(path)
        .map_err(lofty::error::LoftyError::from)
        .and_then(|mut file| MpegFile::read_from(&mut file, ParseOptions::new()));

    match existing {
        Ok(mpeg) => mpeg
            .id3v2()
            .map(|id3| Tag::from(id3.clone()))
            .unwrap_or_else(|| Tag::new(TagType::Id3v2)),
        Err(e) => {
            tracing::debug!("No readable tag in {:?} ({}), creating one", path, e);
            Tag::new(TagType::Id3v2)
        }
    }
}

/// Write a metadata record (and optionally new artwork) into the file.
///
/// Existing lyrics are always removed first; existing artwork is only
/// replaced when `artwork` is provided. Re-running with the same inputs
/// leaves exactly one picture and one lyric frame per language.
pub fn write(path: &Path, record: &MetadataRecord, artwork: Option<&CoverArt>) -> Result<()> {
    let mut tag = load_or_create(path);

    tag.retain(|item| item.key() != &ItemKey::Lyrics);

    // Empty source fields leave whatever the file already had
    if !record.title.is_empty() {
        tag.set_title(record.title.clone());
    }
    if !record.artist.is_empty() {
        tag.set_artist(record.artist.clone());
    }
    if !record.album.is_empty() {
        tag.set_album(record.album.clone());
    }
    if !record.album_artist.is_empty() {
        tag.insert_text(ItemKey::AlbumArtist, record.album_artist.clone());
    }
    if !record.release_date.is_empty() {
        tag.insert_text(ItemKey::RecordingDate, record.release_date.clone());
    }

    if let Some(cover) = artwork {
        replace_artwork(&mut tag, cover);
    }

    let mut id3 = Id3v2Tag::from(tag);

    if let Some(ref lyrics) = record.lyrics {
        let language = <[u8; 3]>::try_from(lyrics.language.as_bytes())
            .with_context(|| format!("Invalid lyrics language code {:?}", lyrics.language))?;
        id3.insert(Frame::UnsynchronizedText(UnsynchronizedTextFrame::new(
            TextEncoding::UTF8,
            language,
            String::new(),
            lyrics.text.clone(),
        )));
    }

    id3.save_to_path(path, WriteOptions::default())
        .context("Failed to write tags to file")?;

    Ok(())
}

/// Drop every embedded picture and add `cover` as the front cover.
fn replace_artwork(tag: &mut Tag, cover: &CoverArt) {
    let existing: Vec<PictureType> = tag.pictures().iter().map(Picture::pic_type).collect();
    for pic_type in existing {
        tag.remove_picture_type(pic_type);
    }

    let picture = Picture::new_unchecked(
        PictureType::CoverFront,
        Some(MimeType::from_str(&cover.mime_type)),
        Some(cover.description()),
        cover.data.clone(),
    );
    tag.push_picture(picture);
}
