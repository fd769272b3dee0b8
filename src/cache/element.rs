//! # Element Cache
//!
//! Stores variable-length element payloads addressable by 64-bit OSM id,
//! persisted across generator passes. A cache is a payload file plus an
//! offset index at the same path with the `.offsets` suffix.
//!
//! ## Payload File Format
//!
//! ```text
//! +-------------+----------------+-------------+------
//! | u32 size    | size bytes     | u32 size    | ...
//! +-------------+----------------+-------------+------
//! ```
//!
//! Records appear in the exact order `write` was called; each index entry
//! holds the file position of its record's size prefix at the moment of
//! writing. When the same id is written twice, both records survive, and
//! readers resolve the id to the earlier one (the smaller offset sorts
//! first in the index).
//!
//! ## Preload
//!
//! With preload enabled the reader pulls the entire payload file into RAM
//! at construction, turning every lookup into a pure memory read. Without
//! it a lookup costs two positioned reads (size prefix, then payload).
//! The results are byte-identical either way.

use std::path::Path;

use eyre::{ensure, Result};
use tracing::warn;

use super::{IndexFileReader, IndexFileWriter, Payload, OFFSETS_FILE_EXTENSION};
use crate::io::{path_with_suffix, FileReader, SequentialWriter};

const SIZE_PREFIX_LEN: usize = 4;

#[derive(Debug)]
pub struct ElementCacheWriter {
    storage: SequentialWriter,
    offsets: IndexFileWriter<u64>,
    scratch: Vec<u8>,
}

impl ElementCacheWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        Ok(Self {
            storage: SequentialWriter::create(path)?,
            offsets: IndexFileWriter::create(path_with_suffix(path, OFFSETS_FILE_EXTENSION))?,
            scratch: Vec::new(),
        })
    }

    pub fn write<T: Payload>(&mut self, id: u64, value: &T) -> Result<()> {
        self.offsets.add(id, self.storage.pos())?;

        self.scratch.clear();
        value.encode(&mut self.scratch)?;

        ensure!(
            self.scratch.len() <= u32::MAX as usize,
            "encoded element {} is {} bytes, which exceeds the u32 size prefix",
            id,
            self.scratch.len()
        );

        let size = self.scratch.len() as u32;
        self.storage.write(&size.to_le_bytes())?;
        self.storage.write(&self.scratch)?;

        Ok(())
    }

    /// Flushes pending offset index entries to disk.
    pub fn save_offsets(&mut self) -> Result<()> {
        self.offsets.write_all()
    }

    pub fn path(&self) -> &Path {
        self.storage.path()
    }
}

#[derive(Debug)]
pub struct ElementCacheReader {
    storage: FileReader,
    offsets: IndexFileReader<u64>,
    preloaded: Option<Vec<u8>>,
    scratch: Vec<u8>,
}

impl ElementCacheReader {
    pub fn open<P: AsRef<Path>>(path: P, preload: bool) -> Result<Self> {
        let path = path.as_ref();
        let storage = FileReader::open(path)?;

        let preloaded = if preload {
            let mut data = vec![0u8; storage.size() as usize];
            storage.read_at(0, &mut data)?;
            Some(data)
        } else {
            None
        };

        Ok(Self {
            storage,
            offsets: IndexFileReader::open(path_with_suffix(path, OFFSETS_FILE_EXTENSION))?,
            preloaded,
            scratch: Vec::new(),
        })
    }

    /// Loads and sorts the offset index. Must run before the first `read`.
    pub fn load_offsets(&mut self) -> Result<()> {
        self.offsets.read_all()
    }

    /// Retrieves and decodes the element written under `id`. An id with no
    /// index entry is a normal negative result.
    pub fn read<T: Payload>(&mut self, id: u64) -> Result<Option<T>> {
        let Some(pos) = self.offsets.get(id) else {
            warn!(
                file = %self.offsets.path().display(),
                id,
                "no offset recorded for element"
            );
            return Ok(None);
        };

        let bytes: &[u8] = if let Some(data) = &self.preloaded {
            let start = pos as usize;
            ensure!(
                start + SIZE_PREFIX_LEN <= data.len(),
                "damaged payload file '{}': size prefix at offset {} is truncated",
                self.storage.path().display(),
                pos
            );

            let size =
                u32::from_le_bytes(data[start..start + SIZE_PREFIX_LEN].try_into()?) as usize;
            let payload_start = start + SIZE_PREFIX_LEN;
            ensure!(
                payload_start + size <= data.len(),
                "damaged payload file '{}': record at offset {} extends past the end",
                self.storage.path().display(),
                pos
            );

            &data[payload_start..payload_start + size]
        } else {
            let mut prefix = [0u8; SIZE_PREFIX_LEN];
            self.storage.read_at(pos, &mut prefix)?;
            let size = u32::from_le_bytes(prefix) as usize;

            self.scratch.resize(size, 0);
            self.storage
                .read_at(pos + SIZE_PREFIX_LEN as u64, &mut self.scratch)?;

            &self.scratch
        };

        T::decode(bytes).map(Some)
    }

    pub fn path(&self) -> &Path {
        self.storage.path()
    }
}
