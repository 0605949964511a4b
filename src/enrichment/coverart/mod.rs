//! Album artwork download.
//!
//! Fetches the cover image referenced by an item so the tagger can embed it.

mod client;

pub use client::{CoverArt, CoverArtClient};
