//! Layout documents: declarative descriptions of file-byte sources and blocks.
//!
//! A layout is written in YAML (or JSON) and turned into a [`MemoryMap`] with
//! [`Layout::build`]. Sub-block starting offsets are implied by their order in
//! the document. Integer fields accept either numbers or `0x` hex strings.
//!
//! ```
//! let yaml = r#"
//! file_bytes:
//!   - name: firmware.bin
//!     size: 0x1000
//! blocks:
//!   - name: .text
//!     start: 0x1000
//!     sub_blocks:
//!       - kind: file_bytes
//!         length: 0x80
//!         source: firmware.bin
//!         offset: 0x200
//!       - kind: uninitialized
//!         length: 0x80
//! "#;
//!
//! let map = blocksource::Layout::from_yaml(yaml)?.build()?;
//! let info = map.source_info_at(blocksource::Address::new(0x1050)).unwrap();
//! assert_eq!(info.file_bytes_offset_at(blocksource::Address::new(0x1050)), Some(0x250));
//! # Ok::<(), blocksource::LayoutError>(())
//! ```

use crate::address::{deserialize_u64, Address, AddressRange};
use crate::block::MemoryBlock;
use crate::error::{BlockError, LayoutError};
use crate::file_bytes::FileBytes;
use crate::map::MemoryMap;
use crate::sub_block::{ByteMappingScheme, SubBlockKind, SubMemoryBlock};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Top-level layout document
#[derive(Debug, Clone, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub file_bytes: Vec<FileBytesEntry>,
    pub blocks: Vec<BlockEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileBytesEntry {
    pub name: String,
    /// Offset of the stored bytes within the original file
    #[serde(default, deserialize_with = "deserialize_u64")]
    pub file_offset: u64,
    #[serde(deserialize_with = "deserialize_u64")]
    pub size: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockEntry {
    pub name: String,
    pub start: Address,
    pub sub_blocks: Vec<SubBlockEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubBlockEntry {
    Uninitialized {
        #[serde(deserialize_with = "deserialize_u64")]
        length: u64,
    },
    FileBytes {
        #[serde(deserialize_with = "deserialize_u64")]
        length: u64,
        source: String,
        #[serde(default, deserialize_with = "deserialize_u64")]
        offset: u64,
    },
    BitMapped {
        #[serde(deserialize_with = "deserialize_u64")]
        length: u64,
        mapped: AddressRange,
    },
    ByteMapped {
        #[serde(deserialize_with = "deserialize_u64")]
        length: u64,
        mapped: AddressRange,
        #[serde(default)]
        scheme: ByteMappingScheme,
    },
}

impl SubBlockEntry {
    pub fn length(&self) -> u64 {
        match self {
            SubBlockEntry::Uninitialized { length }
            | SubBlockEntry::FileBytes { length, .. }
            | SubBlockEntry::BitMapped { length, .. }
            | SubBlockEntry::ByteMapped { length, .. } => *length,
        }
    }
}

impl Layout {
    pub fn from_yaml(text: &str) -> Result<Self, LayoutError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse by file extension: `.json` as JSON, anything else as YAML
    pub fn from_str_for_path(path: &Path, text: &str) -> Result<Self, LayoutError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(text),
            _ => Self::from_yaml(text),
        }
    }

    /// Resolve file-byte references and validate every block
    pub fn build(&self) -> Result<MemoryMap, LayoutError> {
        let mut sources: HashMap<&str, Arc<FileBytes>> = HashMap::new();
        let mut ordered = Vec::with_capacity(self.file_bytes.len());
        for (id, entry) in (1u64..).zip(&self.file_bytes) {
            let bytes = Arc::new(FileBytes::new(
                id,
                entry.name.clone(),
                entry.file_offset,
                entry.size,
            ));
            if sources.insert(entry.name.as_str(), bytes.clone()).is_some() {
                return Err(LayoutError::DuplicateFileBytes(entry.name.clone()));
            }
            ordered.push(bytes);
        }

        let map = self
            .blocks
            .iter()
            .map(|entry| build_block(entry, &sources))
            .collect::<Result<Vec<_>, _>>()
            .and_then(|blocks| MemoryMap::new(blocks, ordered))
            .inspect_err(|err| tracing::warn!(%err, "rejected layout"))?;
        tracing::debug!(
            blocks = map.blocks().len(),
            file_bytes = map.file_bytes().len(),
            "built memory map from layout"
        );
        Ok(map)
    }
}

fn build_block(
    entry: &BlockEntry,
    sources: &HashMap<&str, Arc<FileBytes>>,
) -> Result<MemoryBlock, LayoutError> {
    let block_error = |source: BlockError| LayoutError::Block {
        block: entry.name.clone(),
        source,
    };

    let mut sub_blocks = Vec::with_capacity(entry.sub_blocks.len());
    let mut starting_offset = 0u64;
    for sub in &entry.sub_blocks {
        let length = sub.length();
        let kind = match sub {
            SubBlockEntry::Uninitialized { .. } => SubBlockKind::Uninitialized,
            SubBlockEntry::FileBytes { source, offset, .. } => {
                let file_bytes =
                    sources
                        .get(source.as_str())
                        .ok_or_else(|| LayoutError::UnknownFileBytes {
                            block: entry.name.clone(),
                            name: source.clone(),
                        })?;
                if !file_bytes.covers(*offset, length) {
                    return Err(LayoutError::FileBytesOutOfRange {
                        block: entry.name.clone(),
                        name: source.clone(),
                        offset: *offset,
                        length,
                    });
                }
                SubBlockKind::FileBytes {
                    file_bytes: file_bytes.clone(),
                    offset: *offset,
                }
            }
            SubBlockEntry::BitMapped { mapped, .. } => SubBlockKind::BitMapped {
                mapped_range: *mapped,
            },
            SubBlockEntry::ByteMapped { mapped, scheme, .. } => SubBlockKind::ByteMapped {
                mapped_range: *mapped,
                scheme: *scheme,
            },
        };

        sub_blocks.push(SubMemoryBlock::new(starting_offset, length, kind).map_err(block_error)?);
        starting_offset = starting_offset.saturating_add(length);
    }

    let block = MemoryBlock::new(entry.name.clone(), entry.start, sub_blocks).map_err(block_error)?;
    tracing::debug!(
        block = block.name(),
        start = %block.start(),
        length = block.length(),
        sub_blocks = block.sub_blocks().len(),
        "built block"
    );
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
file_bytes:
  - name: firmware.bin
    file_offset: 0x40
    size: 0x1000
blocks:
  - name: alias
    start: 0x3000
    sub_blocks:
      - kind: byte_mapped
        length: 0x100
        mapped: { start: 0x2000, end: 0x20ff }
  - name: .text
    start: 0x1000
    sub_blocks:
      - kind: file_bytes
        length: 0x80
        source: firmware.bin
        offset: 0x200
      - kind: uninitialized
        length: "0x80"
  - name: flags
    start: 0x5000
    sub_blocks:
      - kind: bit_mapped
        length: 64
        mapped: { start: 0x2000, end: 0x2007 }
      - kind: byte_mapped
        length: 0x10
        mapped: { start: 0x2100, end: 0x211d }
        scheme: "2:4"
"#;

    #[test]
    fn test_build_sample_layout() {
        let map = Layout::from_yaml(SAMPLE).unwrap().build().unwrap();
        let names: Vec<_> = map.blocks().iter().map(|b| b.name()).collect();
        assert_eq!(names, vec![".text", "alias", "flags"]);

        let text = map.block(".text").unwrap();
        assert_eq!(text.length(), 0x100);
        let infos: Vec<_> = text.source_infos().collect();
        assert_eq!(infos[0].file_bytes_offset_at(Address::new(0x1050)), Some(0x250));
        assert_eq!(infos[0].description(), "File: firmware.bin: 0x240");
        assert_eq!(infos[1].min_address(), Address::new(0x1080));
        assert_eq!(infos[1].file_bytes_offset(), None);

        let alias = map.source_info_at(Address::new(0x3080)).unwrap();
        assert_eq!(
            alias.mapped_range(),
            AddressRange::new(Address::new(0x2000), Address::new(0x20ff))
        );

        let flags = map.block("flags").unwrap();
        let last = flags.source_infos().last().unwrap();
        assert_eq!(last.min_address(), Address::new(0x5040));
        assert_eq!(last.description(), "Byte Mapped: 0x00002100 2:4");
    }

    #[test]
    fn test_json_layout() {
        let json = r#"{
            "file_bytes": [{ "name": "a.bin", "size": 256 }],
            "blocks": [{
                "name": "data",
                "start": "0x8000",
                "sub_blocks": [{ "kind": "file_bytes", "length": 16, "source": "a.bin" }]
            }]
        }"#;
        let layout = Layout::from_str_for_path(Path::new("layout.JSON"), json).unwrap();
        let map = layout.build().unwrap();
        let info = map.source_info_at(Address::new(0x800f)).unwrap();
        assert_eq!(info.file_bytes_offset_at(Address::new(0x800f)), Some(15));
        assert_eq!(map.file_bytes()[0].id(), 1);
    }

    #[test]
    fn test_unknown_source() {
        let yaml = r#"
blocks:
  - name: data
    start: 0
    sub_blocks:
      - kind: file_bytes
        length: 4
        source: missing.bin
"#;
        let err = Layout::from_yaml(yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, LayoutError::UnknownFileBytes { name, .. } if name == "missing.bin"));
    }

    #[test]
    fn test_file_bytes_out_of_range() {
        let yaml = r#"
file_bytes:
  - name: small.bin
    size: 0x10
blocks:
  - name: data
    start: 0
    sub_blocks:
      - kind: file_bytes
        length: 0x10
        source: small.bin
        offset: 0x8
"#;
        let err = Layout::from_yaml(yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, LayoutError::FileBytesOutOfRange { offset: 8, .. }));
    }

    #[test]
    fn test_duplicate_file_bytes() {
        let yaml = r#"
file_bytes:
  - { name: a.bin, size: 1 }
  - { name: a.bin, size: 2 }
blocks: []
"#;
        let err = Layout::from_yaml(yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateFileBytes(name) if name == "a.bin"));
    }

    #[test]
    fn test_zero_length_sub_block() {
        let yaml = r#"
blocks:
  - name: data
    start: 0
    sub_blocks:
      - kind: uninitialized
        length: 0
"#;
        let err = Layout::from_yaml(yaml).unwrap().build().unwrap_err();
        match err {
            LayoutError::Block { block, source } => {
                assert_eq!(block, "data");
                assert_eq!(source, BlockError::EmptySubBlock { offset: 0 });
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mapped_range_length_mismatch() {
        let yaml = r#"
blocks:
  - name: flags
    start: 0x5000
    sub_blocks:
      - kind: uninitialized
        length: 0x10
      - kind: bit_mapped
        length: 0x40
        mapped: { start: 0x8000, end: 0x8fff }
"#;
        let err = Layout::from_yaml(yaml).unwrap().build().unwrap_err();
        match err {
            LayoutError::Block { block, source } => {
                assert_eq!(block, "flags");
                assert_eq!(
                    source,
                    BlockError::MappedRangeMismatch {
                        offset: 0x10,
                        expected: 8,
                        found: 0x1000
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_scheme_rejected_at_parse() {
        let yaml = r#"
blocks:
  - name: data
    start: 0
    sub_blocks:
      - kind: byte_mapped
        length: 4
        mapped: { start: 0x10, end: 0x13 }
        scheme: "5:4"
"#;
        assert!(matches!(
            Layout::from_yaml(yaml).unwrap_err(),
            LayoutError::Yaml(_)
        ));
    }
}
