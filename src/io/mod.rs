//! # File I/O Primitives
//!
//! This module provides the low-level file access building blocks for the
//! cache layer: a sequential writer with explicit position tracking and two
//! random-access readers (positioned reads and memory-mapped).
//!
//! ## Design
//!
//! Intermediate cache files are written once, sequentially, by a single
//! pass of the generator and then read randomly by later passes. The writer
//! therefore tracks a logical position itself instead of querying the OS,
//! and the readers are strictly read-only.
//!
//! `RandomRead` is the seam between the cache layer and the concrete
//! reader: payload files are served by positioned reads (`FileReader`),
//! dense point files by a memory map (`MmapReader`). Both are semantically
//! identical; the map avoids a syscall per lookup.
//!
//! ## Thread Safety
//!
//! None of these types synchronize internally. Each cache instance owns its
//! files exclusively and is used by exactly one pass at a time.

mod reader;
mod writer;

pub use reader::{FileReader, MmapReader};
pub use writer::SequentialWriter;

use std::path::{Path, PathBuf};

use eyre::Result;

pub trait RandomRead {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;
    fn size(&self) -> u64;
}

impl RandomRead for FileReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        FileReader::read_at(self, offset, buf)
    }

    fn size(&self) -> u64 {
        FileReader::size(self)
    }
}

impl RandomRead for MmapReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        MmapReader::read_at(self, offset, buf)
    }

    fn size(&self) -> u64 {
        MmapReader::size(self)
    }
}

/// Appends a dot-separated suffix to a full file name, keeping any
/// extension the name already has (`nodes.dat` -> `nodes.dat.offsets`).
pub(crate) fn path_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
