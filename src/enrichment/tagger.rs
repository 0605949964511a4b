//! Tag enrichment - embeds an item's metadata into its downloaded file.
//!
//! Flow for one file:
//! 1. Build the core record (title, artists, album, album artists, date)
//! 2. Fetch cover art and lyrics concurrently (both best-effort)
//! 3. Detect the lyric language and map it to a 3-letter tag code
//! 4. Write everything in a single save
//!
//! Only the save can fail the enrichment. Artwork and lyric problems come
//! back as [`EnrichmentWarning`]s alongside a successfully tagged file.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::coverart::CoverArt;
use super::domain::{EnrichmentError, EnrichmentWarning, LyricsText, MetadataRecord};
use super::traits::{CoverArtApi, Enricher, LanguageDetector, LanguageTable, LyricsApi};
use crate::metadata;
use crate::model::Item;

/// Which optional enrichment steps run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichOptions {
    pub embed_artwork: bool,
    pub fetch_lyrics: bool,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            embed_artwork: true,
            fetch_lyrics: true,
        }
    }
}

/// Production [`Enricher`] writing ID3v2 tags with lofty.
pub struct TagEnricher {
    cover_art: Arc<dyn CoverArtApi>,
    lyrics: Arc<dyn LyricsApi>,
    detector: Arc<dyn LanguageDetector>,
    languages: Arc<dyn LanguageTable>,
    options: EnrichOptions,
}

impl TagEnricher {
    pub fn new(
        cover_art: Arc<dyn CoverArtApi>,
        lyrics: Arc<dyn LyricsApi>,
        detector: Arc<dyn LanguageDetector>,
        languages: Arc<dyn LanguageTable>,
        options: EnrichOptions,
    ) -> Self {
        Self {
            cover_art,
            lyrics,
            detector,
            languages,
            options,
        }
    }

    async fn fetch_artwork(&self, item: &Item) -> Result<Option<CoverArt>, EnrichmentWarning> {
        if !self.options.embed_artwork {
            return Ok(None);
        }
        let Some(ref url) = item.cover_art_url else {
            tracing::debug!("No cover art reference for {}", item);
            return Ok(None);
        };

        self.cover_art
            .fetch(url)
            .await
            .map(Some)
            .map_err(|e| EnrichmentWarning::Artwork(e.to_string()))
    }

    async fn fetch_lyrics(&self, item: &Item) -> Result<Option<LyricsText>, EnrichmentWarning> {
        if !self.options.fetch_lyrics {
            return Ok(None);
        }
        let Some(artist) = item.primary_artist() else {
            return Err(EnrichmentWarning::Lyrics("item has no artist".to_string()));
        };

        let text = self
            .lyrics
            .lyrics(artist, &item.title)
            .await
            .map_err(|e| EnrichmentWarning::Lyrics(e.to_string()))?;

        let detected = self
            .detector
            .detect(&text)
            .ok_or_else(|| EnrichmentWarning::Lyrics("language not detected".to_string()))?;

        let language = self.languages.to_three_letter(&detected).ok_or_else(|| {
            EnrichmentWarning::Lyrics(format!("no language mapping found for {}", detected))
        })?;

        Ok(Some(LyricsText { text, language }))
    }
}

#[async_trait]
impl Enricher for TagEnricher {
    async fn enrich(
        &self,
        path: &Path,
        item: &Item,
    ) -> Result<Vec<EnrichmentWarning>, EnrichmentError> {
        let mut warnings = Vec::new();

        let (artwork, lyrics) =
            futures::join!(self.fetch_artwork(item), self.fetch_lyrics(item));

        let artwork = artwork.unwrap_or_else(|w| {
            tracing::warn!("Failed to fetch album art for {}: {}", item, w);
            warnings.push(w);
            None
        });
        let lyrics = lyrics.unwrap_or_else(|w| {
            tracing::warn!("Error adding lyrics for {}: {}", item, w);
            warnings.push(w);
            None
        });

        let record = MetadataRecord {
            title: item.title.clone(),
            artist: item.artist_credit(),
            album: item.album.clone(),
            album_artist: item.album_artist_credit(),
            release_date: item.release_date.clone(),
            lyrics,
        };

        metadata::write(path, &record, artwork.as_ref()).map_err(|e| {
            tracing::error!("Error saving metadata for {}: {:#}", item, e);
            EnrichmentError::Save {
                path: path.to_path_buf(),
                message: format!("{:#}", e),
            }
        })?;

        Ok(warnings)
    }
}
