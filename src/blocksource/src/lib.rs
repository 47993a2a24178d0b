//! # blocksource
//!
//! Byte provenance for memory blocks of a disassembled program.
//!
//! A [`MemoryBlock`] covers a contiguous address range and is split into
//! ordered [`SubMemoryBlock`]s, each with one kind of backing:
//! - bytes imported from a file ([`FileBytes`])
//! - an alias of another range at bit or byte granularity
//! - uninitialized storage
//!
//! [`SourceInfo`] answers "where do the bytes at this address come from"
//! for one sub-block, in absolute addresses.
//!
//! ## Example
//!
//! ```
//! use blocksource::{Address, FileBytes, MemoryBlock, SubMemoryBlock};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), blocksource::BlockError> {
//! let firmware = Arc::new(FileBytes::new(1, "firmware.bin", 0, 0x1000));
//! let block = MemoryBlock::new(
//!     ".text",
//!     Address::new(0x1000),
//!     vec![
//!         SubMemoryBlock::file_bytes(0, 0x80, firmware, 0x200)?,
//!         SubMemoryBlock::uninitialized(0x80, 0x80)?,
//!     ],
//! )?;
//!
//! let info = block.source_info_at(Address::new(0x1050)).unwrap();
//! assert_eq!(info.max_address(), Address::new(0x107f));
//! assert_eq!(info.file_bytes_offset_at(Address::new(0x1050)), Some(0x250));
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod block;
pub mod error;
pub mod file_bytes;
pub mod layout;
pub mod map;
pub mod source_info;
pub mod sub_block;

#[doc(inline)]
pub use address::{parse_u64, Address, AddressRange, ParseAddressError};
#[doc(inline)]
pub use block::MemoryBlock;
#[doc(inline)]
pub use error::{BlockError, LayoutError};
#[doc(inline)]
pub use file_bytes::FileBytes;
#[doc(inline)]
pub use layout::Layout;
#[doc(inline)]
pub use map::MemoryMap;
#[doc(inline)]
pub use source_info::{SourceInfo, SourceSummary};
#[doc(inline)]
pub use sub_block::{ByteMappingScheme, SubBlockKind, SubMemoryBlock};
