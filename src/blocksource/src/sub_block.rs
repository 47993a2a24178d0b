//! Sub-blocks: contiguous pieces of a memory block with a single backing source.
//!
//! Every [`SubMemoryBlock`] knows only its block-relative placement and its
//! backing. Translating that into absolute addresses requires the owning
//! block's start and is done by [`SourceInfo`](crate::SourceInfo).

use crate::address::AddressRange;
use crate::error::BlockError;
use crate::file_bytes::FileBytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Ratio of mapped bytes to source bytes for a byte-mapped block
///
/// `2:4` means every group of 4 source bytes contributes its first 2 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ByteMappingScheme {
    mapped_byte_count: u8,
    mapped_source_byte_count: u8,
}

impl ByteMappingScheme {
    pub const MAX_COUNT: u8 = 127;

    pub const ONE_TO_ONE: ByteMappingScheme = ByteMappingScheme {
        mapped_byte_count: 1,
        mapped_source_byte_count: 1,
    };

    pub fn new(mapped_byte_count: u8, mapped_source_byte_count: u8) -> Result<Self, BlockError> {
        let valid = (1..=Self::MAX_COUNT).contains(&mapped_byte_count)
            && (1..=Self::MAX_COUNT).contains(&mapped_source_byte_count)
            && mapped_byte_count <= mapped_source_byte_count;
        if !valid {
            return Err(BlockError::InvalidMappingScheme(format!(
                "{}:{}",
                mapped_byte_count, mapped_source_byte_count
            )));
        }
        Ok(ByteMappingScheme {
            mapped_byte_count,
            mapped_source_byte_count,
        })
    }

    pub fn mapped_byte_count(&self) -> u8 {
        self.mapped_byte_count
    }

    pub fn mapped_source_byte_count(&self) -> u8 {
        self.mapped_source_byte_count
    }

    pub fn is_one_to_one(&self) -> bool {
        self.mapped_byte_count == self.mapped_source_byte_count
    }

    /// Number of source bytes spanned by `length` mapped bytes
    ///
    /// Runs from the first source byte through the source byte of the last
    /// mapped byte. `None` on overflow.
    pub fn source_span(&self, length: u64) -> Option<u64> {
        let last = length.checked_sub(1)?;
        let groups = last / u64::from(self.mapped_byte_count);
        let within = last % u64::from(self.mapped_byte_count);
        groups
            .checked_mul(u64::from(self.mapped_source_byte_count))?
            .checked_add(within)?
            .checked_add(1)
    }
}

impl Default for ByteMappingScheme {
    fn default() -> Self {
        Self::ONE_TO_ONE
    }
}

impl fmt::Display for ByteMappingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.mapped_byte_count, self.mapped_source_byte_count
        )
    }
}

impl FromStr for ByteMappingScheme {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BlockError::InvalidMappingScheme(s.to_string());
        let (mapped, source) = s.trim().split_once(':').ok_or_else(invalid)?;
        let mapped = mapped.trim().parse::<u8>().map_err(|_| invalid())?;
        let source = source.trim().parse::<u8>().map_err(|_| invalid())?;
        ByteMappingScheme::new(mapped, source)
    }
}

impl TryFrom<String> for ByteMappingScheme {
    type Error = BlockError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ByteMappingScheme> for String {
    fn from(scheme: ByteMappingScheme) -> Self {
        scheme.to_string()
    }
}

/// What backs the bytes of a sub-block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubBlockKind {
    /// No backing bytes
    Uninitialized,
    /// Bytes stored in an imported file
    FileBytes {
        file_bytes: Arc<FileBytes>,
        /// Offset into `file_bytes` of the sub-block's first byte
        offset: u64,
    },
    /// Each bit of `mapped_range` appears as one byte of the sub-block, so the
    /// range spans `ceil(length / 8)` bytes
    BitMapped { mapped_range: AddressRange },
    /// Bytes of `mapped_range` appear as bytes of the sub-block, selected by
    /// `scheme`
    ByteMapped {
        mapped_range: AddressRange,
        scheme: ByteMappingScheme,
    },
}

impl SubBlockKind {
    /// Short label for the kind of backing
    pub fn name(&self) -> &'static str {
        match self {
            SubBlockKind::Uninitialized => "uninitialized",
            SubBlockKind::FileBytes { .. } => "file_bytes",
            SubBlockKind::BitMapped { .. } => "bit_mapped",
            SubBlockKind::ByteMapped { .. } => "byte_mapped",
        }
    }
}

/// A block-relative run of bytes with one backing source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubMemoryBlock {
    starting_offset: u64,
    length: u64,
    kind: SubBlockKind,
}

impl SubMemoryBlock {
    /// Zero-length sub-blocks are rejected, as are mapped sub-blocks whose
    /// range does not span exactly the bytes `length` aliases.
    pub fn new(starting_offset: u64, length: u64, kind: SubBlockKind) -> Result<Self, BlockError> {
        if length == 0 {
            return Err(BlockError::EmptySubBlock {
                offset: starting_offset,
            });
        }

        let expected_span = match &kind {
            SubBlockKind::Uninitialized | SubBlockKind::FileBytes { .. } => None,
            SubBlockKind::BitMapped { mapped_range } => {
                Some((mapped_range, Some((length - 1) / 8 + 1)))
            }
            SubBlockKind::ByteMapped {
                mapped_range,
                scheme,
            } => Some((mapped_range, scheme.source_span(length))),
        };
        if let Some((mapped_range, expected)) = expected_span {
            if expected != Some(mapped_range.length()) {
                return Err(BlockError::MappedRangeMismatch {
                    offset: starting_offset,
                    expected: expected.unwrap_or(u64::MAX),
                    found: mapped_range.length(),
                });
            }
        }

        Ok(SubMemoryBlock {
            starting_offset,
            length,
            kind,
        })
    }

    pub fn uninitialized(starting_offset: u64, length: u64) -> Result<Self, BlockError> {
        Self::new(starting_offset, length, SubBlockKind::Uninitialized)
    }

    pub fn file_bytes(
        starting_offset: u64,
        length: u64,
        file_bytes: Arc<FileBytes>,
        offset: u64,
    ) -> Result<Self, BlockError> {
        Self::new(
            starting_offset,
            length,
            SubBlockKind::FileBytes { file_bytes, offset },
        )
    }

    pub fn bit_mapped(
        starting_offset: u64,
        length: u64,
        mapped_range: AddressRange,
    ) -> Result<Self, BlockError> {
        Self::new(
            starting_offset,
            length,
            SubBlockKind::BitMapped { mapped_range },
        )
    }

    pub fn byte_mapped(
        starting_offset: u64,
        length: u64,
        mapped_range: AddressRange,
        scheme: ByteMappingScheme,
    ) -> Result<Self, BlockError> {
        Self::new(
            starting_offset,
            length,
            SubBlockKind::ByteMapped {
                mapped_range,
                scheme,
            },
        )
    }

    pub fn starting_offset(&self) -> u64 {
        self.starting_offset
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    /// Block-relative offset one past the last byte
    pub fn end_offset(&self) -> u64 {
        self.starting_offset.saturating_add(self.length)
    }

    pub fn kind(&self) -> &SubBlockKind {
        &self.kind
    }

    pub fn description(&self) -> String {
        match &self.kind {
            SubBlockKind::Uninitialized => String::new(),
            SubBlockKind::FileBytes { file_bytes, offset } => format!(
                "File: {}: {:#x}",
                file_bytes.filename(),
                file_bytes.file_offset().saturating_add(*offset)
            ),
            SubBlockKind::BitMapped { mapped_range } => {
                format!("Bit Mapped: {}", mapped_range.min_address())
            }
            SubBlockKind::ByteMapped {
                mapped_range,
                scheme,
            } if scheme.is_one_to_one() => {
                format!("Byte Mapped: {}", mapped_range.min_address())
            }
            SubBlockKind::ByteMapped {
                mapped_range,
                scheme,
            } => format!("Byte Mapped: {} {}", mapped_range.min_address(), scheme),
        }
    }

    pub fn file_bytes_source(&self) -> Option<&Arc<FileBytes>> {
        match &self.kind {
            SubBlockKind::FileBytes { file_bytes, .. } => Some(file_bytes),
            SubBlockKind::Uninitialized
            | SubBlockKind::BitMapped { .. }
            | SubBlockKind::ByteMapped { .. } => None,
        }
    }

    /// Offset into the file bytes of this sub-block's first byte
    pub fn file_bytes_offset(&self) -> Option<u64> {
        match &self.kind {
            SubBlockKind::FileBytes { offset, .. } => Some(*offset),
            SubBlockKind::Uninitialized
            | SubBlockKind::BitMapped { .. }
            | SubBlockKind::ByteMapped { .. } => None,
        }
    }

    pub fn mapped_range(&self) -> Option<AddressRange> {
        match &self.kind {
            SubBlockKind::BitMapped { mapped_range }
            | SubBlockKind::ByteMapped { mapped_range, .. } => Some(*mapped_range),
            SubBlockKind::Uninitialized | SubBlockKind::FileBytes { .. } => None,
        }
    }
}
