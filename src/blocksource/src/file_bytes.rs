//! Imported byte sources.
//!
//! A [`FileBytes`] identifies a run of bytes taken from an imported file. The
//! bytes themselves live in an external store; this crate only forwards the
//! handle and offsets into it.

use std::fmt;

/// Handle for bytes imported from a file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileBytes {
    id: u64,
    filename: String,
    /// Offset of the first stored byte within the original file
    file_offset: u64,
    /// Number of bytes stored
    size: u64,
}

impl FileBytes {
    pub fn new(id: u64, filename: impl Into<String>, file_offset: u64, size: u64) -> Self {
        FileBytes {
            id,
            filename: filename.into(),
            file_offset,
            size,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn file_offset(&self) -> u64 {
        self.file_offset
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Whether `length` bytes starting at `offset` lie within the stored bytes
    pub fn covers(&self, offset: u64, length: u64) -> bool {
        offset
            .checked_add(length)
            .is_some_and(|end| end <= self.size)
    }
}

impl fmt::Display for FileBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:#x}, {} bytes]",
            self.filename, self.file_offset, self.size
        )
    }
}
