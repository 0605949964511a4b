//! Environment checks and config bootstrap.

use std::path::Path;

use crate::config::{self, Config};
use crate::error::Error;
use crate::tools;

use super::print_tool_install_instructions;

/// Check that the download tools and credentials are available
pub fn cmd_check_tools(config: &Config) -> anyhow::Result<()> {
    println!("Checking download tools...\n");

    let mut missing = false;
    match tools::find_yt_dlp(config.tools.yt_dlp.as_deref()) {
        Ok(path) => println!(
            "✓ yt-dlp: {} ({})",
            tools::yt_dlp_version(&path).unwrap_or_default(),
            path.display()
        ),
        Err(e) => {
            println!("✗ {}", e);
            missing = true;
        }
    }
    match tools::find_ffmpeg(config.tools.ffmpeg.as_deref()) {
        Ok(path) => println!(
            "✓ ffmpeg: {} ({})",
            tools::ffmpeg_version(&path).unwrap_or_default(),
            path.display()
        ),
        Err(e) => {
            println!("✗ {}", e);
            missing = true;
        }
    }
    if missing {
        println!();
        print_tool_install_instructions();
    }

    println!();
    println!("Spotify credentials:");
    for (var, configured) in [
        ("SPOTIFY_CLIENT_ID", &config.credentials.spotify_client_id),
        (
            "SPOTIFY_CLIENT_SECRET",
            &config.credentials.spotify_client_secret,
        ),
    ] {
        if std::env::var(var).is_ok() {
            println!("✓ {}: set", var);
        } else if configured.is_some() {
            println!("✓ {}: from config file", var);
        } else {
            println!("✗ {}: not set", var);
        }
    }
    if config.credentials.spotify_client_id.is_none() && std::env::var("SPOTIFY_CLIENT_ID").is_err() {
        println!("  Create an app at: https://developer.spotify.com/dashboard");
    }

    Ok(())
}

/// Write the default config, to `path` or the OS config directory
pub fn cmd_init_config(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let target = match path {
        Some(path) => path.to_path_buf(),
        None => config::config_path().ok_or(Error::Config(config::ConfigError::NoConfigDir))?,
    };

    if target.exists() && !force {
        println!("Config already exists at {:?} (use --force to overwrite)", target);
        return Ok(());
    }

    config::save_to(&Config::default(), &target).map_err(Error::from)?;
    println!("✓ Wrote default config to {:?}", target);
    Ok(())
}
