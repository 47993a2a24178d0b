//! Source info: where the bytes of one sub-block come from.
//!
//! A [`SourceInfo`] binds a [`MemoryBlock`] to one of its sub-blocks and
//! answers provenance queries in absolute addresses. It borrows both and holds
//! nothing else, so it is cheap to create per query and can be shared across
//! threads freely.
//!
//! The file-bytes and mapped-range queries are capability queries: asking a
//! sub-block for something its backing does not have yields `None` rather than
//! an error.

use crate::address::{Address, AddressRange};
use crate::block::MemoryBlock;
use crate::file_bytes::FileBytes;
use crate::sub_block::SubMemoryBlock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Provenance view of one sub-block within its owning block
#[derive(Debug, Clone, Copy)]
pub struct SourceInfo<'a> {
    block: &'a MemoryBlock,
    sub_block: &'a SubMemoryBlock,
}

impl<'a> SourceInfo<'a> {
    /// `sub_block` must be one of `block`'s own sub-blocks.
    pub(crate) fn new(block: &'a MemoryBlock, sub_block: &'a SubMemoryBlock) -> Self {
        SourceInfo { block, sub_block }
    }

    pub fn length(&self) -> u64 {
        self.sub_block.length()
    }

    pub fn min_address(&self) -> Address {
        self.block.start() + self.sub_block.starting_offset()
    }

    pub fn max_address(&self) -> Address {
        self.min_address() + (self.sub_block.length() - 1)
    }

    pub fn description(&self) -> String {
        self.sub_block.description()
    }

    /// Inclusive at both ends
    pub fn contains(&self, address: Address) -> bool {
        self.min_address() <= address && address <= self.max_address()
    }

    /// The imported bytes backing this range, if it is file backed
    pub fn file_bytes(&self) -> Option<&'a Arc<FileBytes>> {
        self.sub_block.file_bytes_source()
    }

    /// Offset into the file bytes of [`min_address`](Self::min_address)
    pub fn file_bytes_offset(&self) -> Option<u64> {
        self.sub_block.file_bytes_offset()
    }

    /// Offset into the file bytes of `address`
    ///
    /// `None` when this range is not file backed or does not contain `address`.
    pub fn file_bytes_offset_at(&self, address: Address) -> Option<u64> {
        if !self.contains(address) {
            return None;
        }
        let base = self.file_bytes_offset()?;
        let delta = address.offset_from(self.min_address())?;
        base.checked_add(delta)
    }

    /// The aliased range, if this range is bit or byte mapped
    pub fn mapped_range(&self) -> Option<AddressRange> {
        self.sub_block.mapped_range()
    }

    pub fn block(&self) -> &'a MemoryBlock {
        self.block
    }

    pub fn sub_block(&self) -> &'a SubMemoryBlock {
        self.sub_block
    }

    /// Owned, serializable snapshot of every query
    pub fn summary(&self) -> SourceSummary {
        SourceSummary {
            block: self.block.name().to_string(),
            kind: self.sub_block.kind().name(),
            min_address: self.min_address(),
            max_address: self.max_address(),
            length: self.length(),
            description: self.description(),
            file_bytes: self.file_bytes().map(|bytes| bytes.filename().to_string()),
            file_bytes_offset: self.file_bytes_offset(),
            mapped_range: self.mapped_range(),
        }
    }
}

impl fmt::Display for SourceInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SourceInfo: StartAddress = {}, length = {}",
            self.min_address(),
            self.length()
        )
    }
}

/// Serializable result of the [`SourceInfo`] queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub block: String,
    pub kind: &'static str,
    pub min_address: Address,
    pub max_address: Address,
    pub length: u64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_bytes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_bytes_offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped_range: Option<AddressRange>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sub_block::ByteMappingScheme;

    fn range(min: u64, max: u64) -> AddressRange {
        AddressRange::new(Address::new(min), Address::new(max)).unwrap()
    }

    /// Block at 0x1000: file-backed [0, 0x80) at source offset 0x200, then
    /// uninitialized [0x80, 0x100)
    fn file_then_uninit() -> MemoryBlock {
        let source = Arc::new(FileBytes::new(1, "firmware.bin", 0, 0x1000));
        MemoryBlock::new(
            ".text",
            Address::new(0x1000),
            vec![
                SubMemoryBlock::file_bytes(0, 0x80, source, 0x200).unwrap(),
                SubMemoryBlock::uninitialized(0x80, 0x80).unwrap(),
            ],
        )
        .unwrap()
    }

    fn mixed_block() -> MemoryBlock {
        let source = Arc::new(FileBytes::new(2, "rom.bin", 0x10, 0x400));
        MemoryBlock::new(
            "mixed",
            Address::new(0x4000),
            vec![
                SubMemoryBlock::uninitialized(0, 0x10).unwrap(),
                SubMemoryBlock::file_bytes(0x10, 0x20, source, 0x100).unwrap(),
                SubMemoryBlock::bit_mapped(0x30, 0x40, range(0x8000, 0x8007)).unwrap(),
                SubMemoryBlock::byte_mapped(
                    0x70,
                    0x10,
                    range(0x9000, 0x900f),
                    ByteMappingScheme::ONE_TO_ONE,
                )
                .unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_file_backed_then_uninitialized() {
        let block = file_then_uninit();
        let infos: Vec<_> = block.source_infos().collect();

        let file = infos[0];
        assert_eq!(file.min_address(), Address::new(0x1000));
        assert_eq!(file.max_address(), Address::new(0x107f));
        assert_eq!(file.length(), 0x80);
        assert_eq!(file.file_bytes_offset(), Some(0x200));
        assert_eq!(file.file_bytes_offset_at(Address::new(0x1050)), Some(0x250));
        assert_eq!(file.file_bytes().unwrap().filename(), "firmware.bin");
        assert_eq!(file.mapped_range(), None);

        let uninit = infos[1];
        assert_eq!(uninit.min_address(), Address::new(0x1080));
        assert_eq!(uninit.max_address(), Address::new(0x10ff));
        assert_eq!(uninit.file_bytes_offset(), None);
        assert_eq!(uninit.mapped_range(), None);
        assert!(uninit.file_bytes().is_none());
        assert_eq!(uninit.description(), "");
    }

    #[test]
    fn test_byte_mapped_alias() {
        let aliased = range(0x2000, 0x20ff);
        let block = MemoryBlock::new(
            "alias",
            Address::new(0x3000),
            vec![
                SubMemoryBlock::byte_mapped(0, 0x100, aliased, ByteMappingScheme::ONE_TO_ONE)
                    .unwrap(),
            ],
        )
        .unwrap();
        let info = block.source_infos().next().unwrap();

        assert_eq!(info.mapped_range(), Some(aliased));
        assert_eq!(info.file_bytes_offset(), None);
        assert_eq!(info.file_bytes_offset_at(Address::new(0x3000)), None);
        assert_eq!(info.min_address(), Address::new(0x3000));
        assert_eq!(info.max_address(), Address::new(0x30ff));
    }

    #[test]
    fn test_bounds_follow_block_start() {
        let block = mixed_block();
        for (info, sub) in block.source_infos().zip(block.sub_blocks()) {
            assert_eq!(
                info.min_address(),
                block.start() + sub.starting_offset()
            );
            assert_eq!(
                info.max_address(),
                info.min_address() + (sub.length() - 1)
            );
            assert_eq!(info.length(), sub.length());
            assert_eq!(info.description(), sub.description());
            assert!(std::ptr::eq(info.block(), &block));
            assert!(std::ptr::eq(info.sub_block(), sub));
        }
    }

    #[test]
    fn test_contains_is_inclusive() {
        let block = mixed_block();
        for info in block.source_infos() {
            assert!(info.contains(info.min_address()));
            assert!(info.contains(info.max_address()));
            assert!(!info.contains(info.min_address().checked_sub(1).unwrap()));
            assert!(!info.contains(info.max_address() + 1));
        }
    }

    #[test]
    fn test_file_offset_at_every_address() {
        let block = mixed_block();
        let file = block.source_infos().nth(1).unwrap();
        let base = file.file_bytes_offset().unwrap();
        assert_eq!(base, 0x100);

        for n in 0..file.length() {
            let address = file.min_address() + n;
            assert_eq!(file.file_bytes_offset_at(address), Some(base + n));
        }
        let below = file.min_address().checked_sub(1).unwrap();
        assert_eq!(file.file_bytes_offset_at(below), None);
        assert_eq!(file.file_bytes_offset_at(file.max_address() + 1), None);
    }

    #[test]
    fn test_non_file_kinds_never_report_file_offsets() {
        let block = mixed_block();
        for info in block.source_infos().filter(|i| i.file_bytes().is_none()) {
            assert_eq!(info.file_bytes_offset(), None);
            let addresses = [
                info.min_address(),
                info.max_address(),
                Address::new(0),
                block.end(),
            ];
            for address in addresses {
                assert_eq!(info.file_bytes_offset_at(address), None);
            }
        }
    }

    #[test]
    fn test_mapped_range_only_for_mapped_kinds() {
        let block = mixed_block();
        let ranges: Vec<_> = block.source_infos().map(|i| i.mapped_range()).collect();
        assert_eq!(
            ranges,
            vec![
                None,
                None,
                Some(range(0x8000, 0x8007)),
                Some(range(0x9000, 0x900f)),
            ]
        );
    }

    #[test]
    fn test_display() {
        let block = file_then_uninit();
        let info = block.source_info_at(Address::new(0x1090)).unwrap();
        assert_eq!(
            info.to_string(),
            "SourceInfo: StartAddress = 0x00001080, length = 128"
        );
    }

    #[test]
    fn test_summary_json() {
        let block = file_then_uninit();
        let summary = block.source_infos().next().unwrap().summary();
        assert_eq!(summary.kind, "file_bytes");
        assert_eq!(summary.file_bytes.as_deref(), Some("firmware.bin"));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["min_address"], "0x1000");
        assert_eq!(json["max_address"], "0x107f");
        assert_eq!(json["file_bytes_offset"], 0x200);
        assert!(json.get("mapped_range").is_none());
    }

    #[test]
    fn test_source_info_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SourceInfo<'static>>();
    }
}
