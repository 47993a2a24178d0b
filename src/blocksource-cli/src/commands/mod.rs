//! Command handlers for blocksrc CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod query;
