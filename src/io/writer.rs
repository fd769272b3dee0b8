//! # Sequential File Writer
//!
//! `SequentialWriter` is the write half of the cache file pair. It opens a
//! file truncated, appends with `write_all`, and keeps the logical write
//! position itself so that callers can snapshot record offsets without a
//! syscall per record.
//!
//! `seek` exists for the dense point layout, where a record for id `i`
//! lives at byte offset `i * 8`. Seeking past the end of the file and
//! writing there leaves filesystem holes; those holes read back as zeros,
//! which the dense readers treat as the absent sentinel.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};

#[derive(Debug)]
pub struct SequentialWriter {
    file: File,
    path: PathBuf,
    pos: u64,
}

impl SequentialWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .wrap_err_with(|| format!("failed to create cache file '{}'", path.display()))?;

        Ok(Self { file, path, pos: 0 })
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes).wrap_err_with(|| {
            format!(
                "failed to write {} bytes to '{}' at offset {}",
                bytes.len(),
                self.path.display(),
                self.pos
            )
        })?;

        self.pos += bytes.len() as u64;

        Ok(())
    }

    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(offset))
            .wrap_err_with(|| {
                format!(
                    "failed to seek to offset {} in '{}'",
                    offset,
                    self.path.display()
                )
            })?;

        self.pos = offset;

        Ok(())
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn sync(&self) -> Result<()> {
        self.file
            .sync_all()
            .wrap_err_with(|| format!("failed to sync '{}'", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
