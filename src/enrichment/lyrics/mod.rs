//! lyrics.ovh integration
//!
//! Plain-text lyric lookup by artist and title. No API key required.

pub mod dto;
mod client;

pub use client::LyricsOvhClient;
