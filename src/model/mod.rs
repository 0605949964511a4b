//! Core data models for a download batch.
//!
//! Defines the unit of work ([`Item`]), the resolved remote reference
//! ([`Locator`]), per-item results ([`Outcome`]) and the aggregate
//! [`BatchReport`] returned to the caller after a run.
//!
//! Items are created by a batch source and never mutated once dispatched.
//! Everything else here is produced by the pipeline and owned by exactly
//! one item's run until the pool collects it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::enrichment::EnrichmentWarning;

/// One track to resolve, download and tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Track title
    pub title: String,
    /// Track artists, in credit order
    pub artists: Vec<String>,
    /// Album name
    #[serde(default)]
    pub album: String,
    /// Album artists, in credit order
    #[serde(default)]
    pub album_artists: Vec<String>,
    /// Release date as provided by the source (e.g. "2019-05-31" or "2019")
    #[serde(default)]
    pub release_date: String,
    /// URL of the album artwork
    #[serde(default)]
    pub cover_art_url: Option<String>,
    /// Directory the final file is written into
    #[serde(default)]
    pub target_dir: PathBuf,
}

impl Item {
    /// Artists joined for display and tagging ("A, B").
    pub fn artist_credit(&self) -> String {
        self.artists.join(", ")
    }

    /// Album artists joined for tagging ("A, B").
    pub fn album_artist_credit(&self) -> String {
        self.album_artists.join(", ")
    }

    /// First credited artist. Lyric lookups only use this one.
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.artists.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} - {}", self.artist_credit(), self.title)
        }
    }
}

/// Opaque reference to a remote content candidate for one item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pipeline stage an item was in when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Resolve,
    Fetch,
    Enrich,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resolve => write!(f, "resolve"),
            Stage::Fetch => write!(f, "fetch"),
            Stage::Enrich => write!(f, "enrich"),
        }
    }
}

/// Terminal result for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// File downloaded and tagged. Warnings list non-fatal enrichment problems.
    Succeeded {
        path: PathBuf,
        warnings: Vec<EnrichmentWarning>,
    },
    /// Item was not processed.
    Skipped { reason: String },
    /// Item stopped at `stage`.
    Failed { stage: Stage, reason: String },
}

impl Outcome {
    pub fn failed(stage: Stage, reason: impl Into<String>) -> Self {
        Self::Failed {
            stage,
            reason: reason.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }
}

/// A failed item as listed in the batch report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    pub item: String,
    pub stage: Stage,
    pub reason: String,
}

/// A per-item outcome paired with the item it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    pub item: String,
    pub outcome: Outcome,
}

/// Aggregated result of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per input item, in input order
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn new(started_at: DateTime<Utc>, outcomes: Vec<ItemOutcome>) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_success()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Skipped { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Failed { .. }))
            .count()
    }

    /// Items that finished successfully.
    pub fn succeeded(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.outcome.is_success())
            .map(|o| o.item.as_str())
            .collect()
    }

    /// Every failed item with its stage and reason.
    pub fn failures(&self) -> Vec<FailureEntry> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.outcome {
                Outcome::Failed { stage, reason } => Some(FailureEntry {
                    item: o.item.clone(),
                    stage: *stage,
                    reason: reason.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Number of successful items that carry at least one enrichment warning.
    pub fn warned_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.outcome, Outcome::Succeeded { warnings, .. } if !warnings.is_empty()))
            .count()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
