//! Tag an existing file the same way the pipeline tags downloads.

use clap::Args;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::enrichment::{EnrichOptions, Enricher};
use crate::error::Error;
use crate::metadata;
use crate::model::Item;

use super::{build_enricher, http_client};

/// Arguments for `tag`
#[derive(Debug, Args)]
pub struct TagArgs {
    /// MP3 file to tag
    pub path: PathBuf,

    /// Track title
    #[arg(long)]
    pub title: String,

    /// Track artist (repeat for several)
    #[arg(long = "artist", required = true)]
    pub artists: Vec<String>,

    /// Album name
    #[arg(long, default_value = "")]
    pub album: String,

    /// Album artist (repeat for several)
    #[arg(long = "album-artist")]
    pub album_artists: Vec<String>,

    /// Release date, e.g. 2019-05-31
    #[arg(long, default_value = "")]
    pub release_date: String,

    /// Artwork to embed
    #[arg(long)]
    pub cover_url: Option<String>,

    /// Don't look up lyrics
    #[arg(long)]
    pub no_lyrics: bool,

    /// Don't embed cover art
    #[arg(long)]
    pub no_artwork: bool,
}

impl TagArgs {
    fn to_item(&self) -> Item {
        Item {
            title: self.title.clone(),
            artists: self.artists.clone(),
            album: self.album.clone(),
            album_artists: self.album_artists.clone(),
            release_date: self.release_date.clone(),
            cover_art_url: self.cover_url.clone(),
            target_dir: self
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}

/// Enrich one file and print what ended up in its tag
pub fn cmd_tag(rt: &Runtime, config: &Config, args: &TagArgs) -> anyhow::Result<()> {
    let path = args.path.as_path();
    if !path.is_file() {
        return Err(Error::metadata(path, "file not found").into());
    }

    let options = EnrichOptions {
        embed_artwork: config.enrichment.embed_artwork && !args.no_artwork,
        fetch_lyrics: config.enrichment.fetch_lyrics && !args.no_lyrics,
    };
    let item = args.to_item();

    let warnings = rt.block_on(async {
        let enricher = build_enricher(&http_client()?, options);
        let warnings = enricher.enrich(path, &item).await.map_err(Error::from)?;
        Ok::<_, anyhow::Error>(warnings)
    })?;

    println!("✓ Tags written to {:?}", path);
    for warning in &warnings {
        println!("  ! {}", warning);
    }

    let snapshot = metadata::read(path).map_err(|e| Error::metadata(path, e.to_string()))?;
    println!();
    print_field("Title", snapshot.title.as_deref());
    print_field("Artist", snapshot.artist.as_deref());
    print_field("Album", snapshot.album.as_deref());
    print_field("Album artist", snapshot.album_artist.as_deref());
    print_field("Released", snapshot.release_date.as_deref());
    println!("  {:<13} {}", "Artwork:", snapshot.pictures.len());
    for (language, text) in &snapshot.lyrics {
        println!("  {:<13} {} ({} lines)", "Lyrics:", language, text.lines().count());
    }

    Ok(())
}

fn print_field(label: &str, value: Option<&str>) {
    if let Some(value) = value {
        println!("  {:<13} {}", format!("{}:", label), value);
    }
}
