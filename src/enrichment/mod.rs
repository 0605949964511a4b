//! Metadata enrichment - embeds tags, artwork and lyrics into downloaded files.
//!
//! # Architecture
//!
//! This module follows a clean separation between:
//! - **Domain models** (`domain.rs`) - Internal types that represent our business logic
//! - **API DTOs** (`lyrics/dto.rs`) - Exact API response shapes
//! - **Clients** - HTTP clients for external APIs (`coverart`, `lyrics`)
//! - **Language** - Lyric language detection and ISO 639 mapping
//! - **Traits** - Seams for dependency injection and mocks
//! - **Tagger** - The enrichment flow itself
//!
//! # Usage
//!
//! ```ignore
//! use enrichment::{TagEnricher, EnrichOptions, Enricher};
//!
//! let enricher = TagEnricher::new(cover, lyrics, detector, table, EnrichOptions::default());
//! let warnings = enricher.enrich(Path::new("song.mp3"), &item).await?;
//! ```

pub mod coverart;
pub mod domain;
pub mod language;
pub mod lyrics;
pub mod tagger;
pub mod traits;

pub use coverart::{CoverArt, CoverArtClient};
pub use domain::{EnrichmentError, EnrichmentWarning, MetadataRecord, ServiceError};
pub use language::{Iso639Table, WhatlangDetector};
pub use lyrics::LyricsOvhClient;
pub use tagger::{EnrichOptions, TagEnricher};
pub use traits::Enricher;
