//! Error types for block construction and layout documents.

use crate::address::Address;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("sub-block at offset {offset:#x} has zero length")]
    EmptySubBlock { offset: u64 },

    #[error("block {name:?} has no sub-blocks")]
    EmptyBlock { name: String },

    #[error("sub-block expected at offset {expected:#x} but starts at {found:#x}")]
    Discontiguous { expected: u64, found: u64 },

    #[error("block {name:?} starting at {start} overflows the address space")]
    AddressOverflow { name: String, start: Address },

    #[error("mapped sub-block at offset {offset:#x} needs a {expected:#x} byte range, got {found:#x}")]
    MappedRangeMismatch {
        offset: u64,
        expected: u64,
        found: u64,
    },

    #[error("invalid byte mapping scheme {0:?}")]
    InvalidMappingScheme(String),
}

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Block {block:?}: {source}")]
    Block {
        block: String,
        #[source]
        source: BlockError,
    },

    #[error("Block {block:?} references unknown file bytes {name:?}")]
    UnknownFileBytes { block: String, name: String },

    #[error("Duplicate file bytes name {0:?}")]
    DuplicateFileBytes(String),

    #[error("Duplicate block name {0:?}")]
    DuplicateBlock(String),

    #[error("Block {block:?} reads {length:#x} bytes at {offset:#x} past the end of {name:?}")]
    FileBytesOutOfRange {
        block: String,
        name: String,
        offset: u64,
        length: u64,
    },

    #[error("Blocks {first:?} and {second:?} overlap")]
    OverlappingBlocks { first: String, second: String },
}
