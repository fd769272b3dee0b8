//! # Dense On-Disk Point Storage
//!
//! The file is a flat array of `LatLon` indexed by node id: the record
//! for id `i` lives at byte offset `i * 8`. The writer seeks to that
//! offset and writes eight bytes; ids never written leave holes that the
//! filesystem materializes as zeros, i.e. the absent sentinel.
//!
//! The reader memory-maps the file where the platform supports it and
//! falls back to positioned reads otherwise; the two are semantically
//! identical. Lookups for ids at or past the end of the file are misses
//! like any other: the array simply was never extended that far.

use std::mem::size_of;
use std::path::Path;

use eyre::{eyre, Result};
use tracing::error;
use zerocopy::{FromBytes, IntoBytes};

use super::{pack_point, unpack_coord, LatLon, PointStorageReader, PointStorageWriter};
#[cfg(not(unix))]
use crate::io::FileReader;
#[cfg(unix)]
use crate::io::MmapReader;
use crate::io::SequentialWriter;

#[cfg(unix)]
type PointFileReader = MmapReader;
#[cfg(not(unix))]
type PointFileReader = FileReader;

const RECORD_SIZE: u64 = size_of::<LatLon>() as u64;

#[derive(Debug)]
pub struct RawFilePointStorageWriter {
    file: SequentialWriter,
    processed: u64,
}

impl RawFilePointStorageWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            file: SequentialWriter::create(path)?,
            processed: 0,
        })
    }
}

impl PointStorageWriter for RawFilePointStorageWriter {
    fn add_point(&mut self, id: u64, lat: f64, lng: f64) -> Result<()> {
        let ll = pack_point(lat, lng)?;

        let offset = id.checked_mul(RECORD_SIZE).ok_or_else(|| {
            eyre!(
                "node id {} overflows the dense point file '{}'",
                id,
                self.file.path().display()
            )
        })?;

        self.file.seek(offset)?;
        self.file.write(ll.as_bytes())?;

        self.processed += 1;

        Ok(())
    }

    fn processed_points(&self) -> u64 {
        self.processed
    }
}

#[derive(Debug)]
pub struct RawFilePointStorageReader {
    file: PointFileReader,
}

impl RawFilePointStorageReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            file: PointFileReader::open(path)?,
        })
    }
}

impl PointStorageReader for RawFilePointStorageReader {
    fn get_point(&self, id: u64) -> Result<Option<(f64, f64)>> {
        let end = id
            .checked_mul(RECORD_SIZE)
            .and_then(|offset| offset.checked_add(RECORD_SIZE));
        let offset = match end {
            Some(end) if end <= self.file.size() => end - RECORD_SIZE,
            _ => {
                error!(id, file = %self.file.path().display(), "node not found in point storage");
                return Ok(None);
            }
        };

        let mut buf = [0u8; size_of::<LatLon>()];
        self.file.read_at(offset, &mut buf)?;

        let ll = LatLon::read_from_bytes(&buf)
            .map_err(|e| eyre!("invalid point record for node {}: {e:?}", id))?;

        if ll.is_absent() {
            error!(id, file = %self.file.path().display(), "node not found in point storage");
            return Ok(None);
        }

        Ok(Some((unpack_coord(ll.lat), unpack_coord(ll.lon))))
    }
}
