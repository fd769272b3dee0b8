//! # Random-Access Readers
//!
//! Two implementations of positioned reads over an immutable cache file:
//!
//! - `FileReader` issues a positioned read syscall per request. Used for
//!   payload files, where each lookup reads a size prefix and a
//!   variable-length record.
//! - `MmapReader` maps the whole file read-only and serves requests with a
//!   bounds-checked copy out of the map. Used for the dense point file,
//!   where lookups are 8-byte reads scattered across a file that can be
//!   tens of gigabytes.
//!
//! Both readers cache the file size at open time; cache files are never
//! modified while a reader exists.

use std::fs::File;
use std::path::{Path, PathBuf};

use eyre::{ensure, Result, WrapErr};
use memmap2::Mmap;

#[derive(Debug)]
pub struct FileReader {
    file: File,
    path: PathBuf,
    size: u64,
}

impl FileReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path)
            .wrap_err_with(|| format!("failed to open cache file '{}'", path.display()))?;

        let size = file
            .metadata()
            .wrap_err_with(|| format!("failed to get metadata for '{}'", path.display()))?
            .len();

        Ok(Self { file, path, size })
    }

    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        ensure!(
            offset <= self.size && buf.len() as u64 <= self.size - offset,
            "read of {} bytes at offset {} is past the end of '{}' (size {})",
            buf.len(),
            offset,
            self.path.display(),
            self.size
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_exact_at(buf, offset).wrap_err_with(|| {
                format!(
                    "failed to read {} bytes at offset {} from '{}'",
                    buf.len(),
                    offset,
                    self.path.display()
                )
            })?;
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            let mut done = 0;
            while done < buf.len() {
                let n = self
                    .file
                    .seek_read(&mut buf[done..], offset + done as u64)
                    .wrap_err_with(|| {
                        format!(
                            "failed to read at offset {} from '{}'",
                            offset,
                            self.path.display()
                        )
                    })?;
                ensure!(
                    n > 0,
                    "unexpected end of file in '{}' at offset {}",
                    self.path.display(),
                    offset + done as u64
                );
                done += n;
            }
        }

        Ok(())
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug)]
pub struct MmapReader {
    // None only for a zero-length file, which cannot be mapped.
    mmap: Option<Mmap>,
    path: PathBuf,
}

impl MmapReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path)
            .wrap_err_with(|| format!("failed to open cache file '{}'", path.display()))?;

        let size = file
            .metadata()
            .wrap_err_with(|| format!("failed to get metadata for '{}'", path.display()))?
            .len();

        let mmap = if size == 0 {
            None
        } else {
            // SAFETY: Mmap::map is unsafe because the file could be modified
            // externally while mapped, invalidating the region. This is safe
            // because:
            // 1. Cache files are written once by a prior generator pass and
            //    never touched again while a reader exists
            // 2. The map is read-only and its lifetime is tied to MmapReader
            // 3. All access goes through read_at, which bounds-checks offsets
            Some(unsafe {
                Mmap::map(&file)
                    .wrap_err_with(|| format!("failed to memory-map '{}'", path.display()))?
            })
        };

        Ok(Self { mmap, path })
    }

    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let size = self.size();
        ensure!(
            offset <= size && buf.len() as u64 <= size - offset,
            "read of {} bytes at offset {} is past the end of '{}' (size {})",
            buf.len(),
            offset,
            self.path.display(),
            size
        );

        if let Some(mmap) = &self.mmap {
            let start = offset as usize;
            buf.copy_from_slice(&mmap[start..start + buf.len()]);
        }

        Ok(())
    }

    pub fn size(&self) -> u64 {
        self.mmap.as_ref().map_or(0, |m| m.len() as u64)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::RandomRead;
    use tempfile::tempdir;

    fn read_range<R: RandomRead>(reader: &R, offset: u64, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        reader.read_at(offset, &mut buf).unwrap();
        buf
    }

    #[test]
    fn readers_agree_on_the_same_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data");
        std::fs::write(&path, b"0123456789").unwrap();

        let plain = FileReader::open(&path).unwrap();
        let mapped = MmapReader::open(&path).unwrap();
        assert_eq!(plain.size(), 10);
        assert_eq!(mapped.size(), 10);

        let a = read_range(&plain, 3, 4);
        let b = read_range(&mapped, 3, 4);
        assert_eq!(a, b"3456");
        assert_eq!(a, b);
    }

    #[test]
    fn reads_past_eof_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data");
        std::fs::write(&path, b"abc").unwrap();

        let plain = FileReader::open(&path).unwrap();
        let mapped = MmapReader::open(&path).unwrap();

        let mut buf = [0u8; 4];
        assert!(plain.read_at(0, &mut buf).is_err());
        assert!(mapped.read_at(2, &mut buf[..2]).is_err());
    }

    #[test]
    fn empty_file_maps_to_empty_region() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        let mapped = MmapReader::open(&path).unwrap();
        assert_eq!(mapped.size(), 0);
        mapped.read_at(0, &mut []).unwrap();
    }
}
