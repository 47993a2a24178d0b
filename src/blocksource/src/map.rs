//! A set of non-overlapping memory blocks, ordered by start address.

use crate::address::Address;
use crate::block::MemoryBlock;
use crate::error::LayoutError;
use crate::file_bytes::FileBytes;
use crate::source_info::SourceInfo;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct MemoryMap {
    blocks: Vec<MemoryBlock>,
    file_bytes: Vec<Arc<FileBytes>>,
}

impl MemoryMap {
    /// Blocks may be given in any order; overlapping or duplicate names are rejected.
    pub fn new(
        mut blocks: Vec<MemoryBlock>,
        file_bytes: Vec<Arc<FileBytes>>,
    ) -> Result<Self, LayoutError> {
        blocks.sort_by_key(|block| block.start());

        for pair in blocks.windows(2) {
            if pair[1].start() <= pair[0].end() {
                return Err(LayoutError::OverlappingBlocks {
                    first: pair[0].name().to_string(),
                    second: pair[1].name().to_string(),
                });
            }
        }

        let mut names: Vec<&str> = blocks.iter().map(MemoryBlock::name).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(LayoutError::DuplicateBlock(pair[0].to_string()));
        }

        Ok(MemoryMap { blocks, file_bytes })
    }

    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    pub fn block(&self, name: &str) -> Option<&MemoryBlock> {
        self.blocks.iter().find(|block| block.name() == name)
    }

    pub fn file_bytes(&self) -> &[Arc<FileBytes>] {
        &self.file_bytes
    }

    pub fn block_containing(&self, address: Address) -> Option<&MemoryBlock> {
        let index = self.blocks.partition_point(|block| block.end() < address);
        self.blocks
            .get(index)
            .filter(|block| block.contains(address))
    }

    pub fn source_info_at(&self, address: Address) -> Option<SourceInfo<'_>> {
        self.block_containing(address)?.source_info_at(address)
    }

    /// Every source info of every block, in address order
    pub fn source_infos(&self) -> impl Iterator<Item = SourceInfo<'_>> + '_ {
        self.blocks.iter().flat_map(|block| block.source_infos())
    }
}
