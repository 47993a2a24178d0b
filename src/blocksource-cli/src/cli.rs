//! CLI argument definitions for blocksrc

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for query commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "blocksrc")]
#[command(about = "Describe where the bytes of memory blocks come from", long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default layout file
        #[arg(long)]
        layout: Option<PathBuf>,

        /// Set default output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },

    /// List every block with the sources of its sub-blocks
    #[command(visible_alias = "b")]
    Blocks {
        /// Layout file (YAML or JSON; uses configured default if not provided)
        #[arg(short, long)]
        layout: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Describe the source of the bytes at an address
    #[command(visible_alias = "l")]
    Locate {
        /// Address (hex with 0x prefix, or decimal)
        address: String,

        /// Layout file (YAML or JSON; uses configured default if not provided)
        #[arg(short, long)]
        layout: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
}
