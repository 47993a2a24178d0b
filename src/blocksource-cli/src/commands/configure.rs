//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up blocksrc defaults.

use crate::cli::OutputFormat;
use crate::config::Config;
use anyhow::Result;
use std::path::PathBuf;

/// Handle the configure command
///
/// # Arguments
/// * `layout` - Optional layout file to set as default
/// * `format` - Optional output format to set as default
/// * `show` - If true, show current configuration
pub fn handle(layout: Option<PathBuf>, format: Option<OutputFormat>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if layout.is_none() && format.is_none() {
        show_usage();
        return Ok(());
    }

    apply(&mut config, layout, format);
    config.save()?;

    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Update config fields, canonicalizing the layout path so it works from any directory
fn apply(config: &mut Config, layout: Option<PathBuf>, format: Option<OutputFormat>) {
    if let Some(path) = layout {
        let path = std::fs::canonicalize(&path).unwrap_or(path);
        println!("Default layout: {}", path.display());
        config.default_layout = Some(path);
    }

    if let Some(format) = format {
        println!("Default format: {:?}", format);
        config.format = Some(format);
    }
}

/// Display current configuration
fn show_config(config: &Config) {
    match &config.default_layout {
        Some(path) => println!("Default layout: {}", path.display()),
        None => println!("No default layout configured"),
    }
    println!("Output format: {:?}", config.resolve_format(None));

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: blocksrc configure --layout LAYOUT_FILE [--format text|json]");
    println!("       blocksrc configure --show");
}
