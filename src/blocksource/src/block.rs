//! Memory blocks built from an ordered run of sub-blocks.

use crate::address::{Address, AddressRange};
use crate::error::BlockError;
use crate::source_info::SourceInfo;
use crate::sub_block::SubMemoryBlock;

/// A named, contiguous range of a program's address space
///
/// The sub-blocks cover block-relative offsets `[0, length)` in ascending
/// order with no gaps or overlaps. [`MemoryBlock::new`] enforces this, so the
/// [`SourceInfo`] queries never have to re-check it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlock {
    name: String,
    range: AddressRange,
    length: u64,
    sub_blocks: Vec<SubMemoryBlock>,
}

impl MemoryBlock {
    pub fn new(
        name: impl Into<String>,
        start: Address,
        sub_blocks: Vec<SubMemoryBlock>,
    ) -> Result<Self, BlockError> {
        let name = name.into();
        if sub_blocks.is_empty() {
            return Err(BlockError::EmptyBlock { name });
        }

        let mut expected = 0u64;
        for sub in &sub_blocks {
            if sub.starting_offset() != expected {
                return Err(BlockError::Discontiguous {
                    expected,
                    found: sub.starting_offset(),
                });
            }
            expected = sub
                .starting_offset()
                .checked_add(sub.length())
                .ok_or_else(|| BlockError::AddressOverflow {
                    name: name.clone(),
                    start,
                })?;
        }

        let Some(range) = AddressRange::with_length(start, expected) else {
            return Err(BlockError::AddressOverflow { name, start });
        };

        Ok(MemoryBlock {
            name,
            range,
            length: expected,
            sub_blocks,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> Address {
        self.range.min_address()
    }

    /// Last address in the block
    pub fn end(&self) -> Address {
        self.range.max_address()
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn range(&self) -> AddressRange {
        self.range
    }

    pub fn contains(&self, address: Address) -> bool {
        self.range.contains(address)
    }

    pub fn sub_blocks(&self) -> &[SubMemoryBlock] {
        &self.sub_blocks
    }

    /// One source info per sub-block, in ascending address order
    pub fn source_infos(&self) -> impl ExactSizeIterator<Item = SourceInfo<'_>> + '_ {
        self.sub_blocks
            .iter()
            .map(move |sub| SourceInfo::new(self, sub))
    }

    /// Source info for the sub-block backing `address`, if the block covers it
    pub fn source_info_at(&self, address: Address) -> Option<SourceInfo<'_>> {
        let offset = address.offset_from(self.start())?;
        if offset >= self.length {
            return None;
        }
        let index = self
            .sub_blocks
            .partition_point(|sub| sub.end_offset() <= offset);
        self.sub_blocks
            .get(index)
            .map(|sub| SourceInfo::new(self, sub))
    }
}
