//! # Offset Index File
//!
//! An id-keyed offset table persisted as a tightly packed sequence of
//! `(u64 key, V value)` records. The value type is fixed-size and
//! trivially copyable; for the element cache it is the `u64` byte offset
//! of a payload record.
//!
//! ## Record Layout
//!
//! ```text
//! +----------------+------------------------+
//! | key (8 bytes)  | value (size_of::<V>()) |
//! +----------------+------------------------+
//! ```
//!
//! Records are written back to back with no padding, so the file length is
//! always a whole multiple of the record size; anything else means the
//! file is damaged. Byte order is the host's. Intermediate files never
//! leave the machine that produced them.
//!
//! ## Write Side
//!
//! `add` accumulates entries in an in-memory buffer and flushes it to the
//! file in batches of `FLUSH_COUNT`. Entries within a batch keep insertion
//! order; the file is the concatenation of batches. `write_all` (also run
//! on drop) flushes the tail and leaves the file fully consistent.
//!
//! ## Read Side
//!
//! `read_all` loads the whole file and sorts it ascending by
//! `(key, value)`. Duplicate keys are preserved; the sort makes the
//! tie-break observable: `get` returns the smallest value recorded for a
//! key, and `for_each_by_key` visits values in ascending order. Lookups
//! are a `partition_point` lower bound over the sorted entries.

use std::mem::size_of;
use std::path::{Path, PathBuf};

use eyre::{ensure, eyre, Result};
use tracing::{error, info};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::io::{FileReader, SequentialWriter};

/// Buffered entries are flushed to disk once the buffer grows past this.
pub const FLUSH_COUNT: usize = 1024;

/// Value types an index file can store: fixed size, no interior padding
/// semantics, directly reinterpretable as bytes.
pub trait IndexValue: IntoBytes + FromBytes + Immutable + KnownLayout + Copy + Ord {}

impl<T> IndexValue for T where T: IntoBytes + FromBytes + Immutable + KnownLayout + Copy + Ord {}

const fn record_size<V: IndexValue>() -> usize {
    size_of::<u64>() + size_of::<V>()
}

#[derive(Debug)]
pub struct IndexFileWriter<V: IndexValue> {
    file: SequentialWriter,
    buffer: Vec<(u64, V)>,
}

impl<V: IndexValue> IndexFileWriter<V> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            file: SequentialWriter::create(path)?,
            buffer: Vec::new(),
        })
    }

    pub fn add(&mut self, key: u64, value: V) -> Result<()> {
        if self.buffer.len() > FLUSH_COUNT {
            self.write_all()?;
        }

        self.buffer.push((key, value));

        Ok(())
    }

    /// Flushes all buffered entries in insertion order as one write.
    pub fn write_all(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let mut batch = Vec::with_capacity(self.buffer.len() * record_size::<V>());
        for (key, value) in &self.buffer {
            batch.extend_from_slice(key.as_bytes());
            batch.extend_from_slice(value.as_bytes());
        }

        self.file.write(&batch)?;
        self.buffer.clear();

        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl<V: IndexValue> Drop for IndexFileWriter<V> {
    fn drop(&mut self) {
        if let Err(err) = self.write_all() {
            error!(
                file = %self.path().display(),
                error = %err,
                "failed to flush offset index buffer on drop"
            );
        }
    }
}

#[derive(Debug)]
pub struct IndexFileReader<V: IndexValue> {
    path: PathBuf,
    entries: Vec<(u64, V)>,
}

impl<V: IndexValue> IndexFileReader<V> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            entries: Vec::new(),
        })
    }

    /// Loads the whole index into memory and sorts it by `(key, value)`.
    pub fn read_all(&mut self) -> Result<()> {
        self.entries.clear();

        let file = FileReader::open(&self.path)?;
        let file_size = file.size();
        if file_size == 0 {
            return Ok(());
        }

        info!(file = %self.path.display(), "loading offset index");

        let record_size = record_size::<V>() as u64;
        ensure!(
            file_size % record_size == 0,
            "damaged index file '{}': size {} is not a multiple of record size {}",
            self.path.display(),
            file_size,
            record_size
        );

        let count = (file_size / record_size) as usize;
        self.entries.try_reserve_exact(count).map_err(|_| {
            eyre!(
                "insufficient memory for {} index entries from '{}'",
                count,
                self.path.display()
            )
        })?;

        let mut bytes = vec![0u8; file_size as usize];
        file.read_at(0, &mut bytes)?;

        for record in bytes.chunks_exact(record_size as usize) {
            let key = u64::read_from_bytes(&record[..size_of::<u64>()])
                .map_err(|e| eyre!("invalid index key in '{}': {e:?}", self.path.display()))?;
            let value = V::read_from_bytes(&record[size_of::<u64>()..])
                .map_err(|e| eyre!("invalid index value in '{}': {e:?}", self.path.display()))?;
            self.entries.push((key, value));
        }

        self.entries.sort_unstable();

        info!(
            file = %self.path.display(),
            entries = self.entries.len(),
            "offset index loaded"
        );

        Ok(())
    }

    /// Returns the smallest value recorded for `key`, if any.
    pub fn get(&self, key: u64) -> Option<V> {
        let idx = self.entries.partition_point(|&(k, _)| k < key);
        match self.entries.get(idx) {
            Some(&(k, value)) if k == key => Some(value),
            _ => None,
        }
    }

    /// Visits every value recorded for `key` in ascending order. The
    /// visitor returns `true` to stop early.
    pub fn for_each_by_key<F>(&self, key: u64, mut visitor: F)
    where
        F: FnMut(V) -> bool,
    {
        let start = self.entries.partition_point(|&(k, _)| k < key);
        for &(k, value) in &self.entries[start..] {
            if k != key {
                break;
            }
            if visitor(value) {
                return;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
