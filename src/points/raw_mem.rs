//! # Dense In-RAM Point Storage
//!
//! An in-memory array of `LatLon` covering the whole 32-bit node id space
//! the generator was sized for, about 32 GiB of address space. Stores and
//! lookups are direct array accesses; the file exists only to snapshot
//! the array at the end of the write pass and restore it at the start of
//! a read pass.
//!
//! `with_capacity` builds a smaller array for inputs whose node ids are
//! known to be bounded.

use std::mem::size_of;
use std::path::Path;

use eyre::{ensure, Result};
use tracing::error;
use zerocopy::IntoBytes;

use super::{pack_point, unpack_coord, LatLon, PointStorageReader, PointStorageWriter};
use crate::io::{FileReader, SequentialWriter};

/// One entry per possible node id at the time the layout was sized.
pub const DENSE_NODE_CAPACITY: usize = u32::MAX as usize;

const RECORD_SIZE: u64 = size_of::<LatLon>() as u64;

#[derive(Debug)]
pub struct RawMemPointStorageWriter {
    file: SequentialWriter,
    data: Vec<LatLon>,
    processed: u64,
    snapshotted: bool,
}

impl RawMemPointStorageWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_capacity(path, DENSE_NODE_CAPACITY)
    }

    pub fn with_capacity<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        Ok(Self {
            file: SequentialWriter::create(path)?,
            data: vec![LatLon::default(); capacity],
            processed: 0,
            snapshotted: false,
        })
    }

    /// Writes the whole array to the snapshot file. Runs on drop as well;
    /// call it directly to observe write errors.
    pub fn close(mut self) -> Result<()> {
        self.snapshot()
    }

    fn snapshot(&mut self) -> Result<()> {
        if self.snapshotted {
            return Ok(());
        }

        self.file.write(self.data.as_slice().as_bytes())?;
        self.snapshotted = true;

        Ok(())
    }
}

impl PointStorageWriter for RawMemPointStorageWriter {
    fn add_point(&mut self, id: u64, lat: f64, lng: f64) -> Result<()> {
        ensure!(
            (id as usize) < self.data.len(),
            "node id {} exceeds the dense storage capacity {}",
            id,
            self.data.len()
        );

        self.data[id as usize] = pack_point(lat, lng)?;
        self.processed += 1;

        Ok(())
    }

    fn processed_points(&self) -> u64 {
        self.processed
    }
}

impl Drop for RawMemPointStorageWriter {
    fn drop(&mut self) {
        if let Err(err) = self.snapshot() {
            error!(
                file = %self.file.path().display(),
                error = %err,
                "failed to snapshot dense point storage on drop"
            );
        }
    }
}

#[derive(Debug)]
pub struct RawMemPointStorageReader {
    data: Vec<LatLon>,
}

impl RawMemPointStorageReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_capacity(path, DENSE_NODE_CAPACITY)
    }

    pub fn with_capacity<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        let file = FileReader::open(&path)?;
        let file_size = file.size();

        ensure!(
            file_size % RECORD_SIZE == 0,
            "damaged dense point file '{}': size {} is not a multiple of {}",
            file.path().display(),
            file_size,
            RECORD_SIZE
        );

        let count = (file_size / RECORD_SIZE) as usize;
        ensure!(
            count <= capacity,
            "dense point file '{}' holds {} entries, which exceeds the capacity {}",
            file.path().display(),
            count,
            capacity
        );

        let mut data = vec![LatLon::default(); capacity];
        file.read_at(0, data[..count].as_mut_bytes())?;

        Ok(Self { data })
    }
}

impl PointStorageReader for RawMemPointStorageReader {
    fn get_point(&self, id: u64) -> Result<Option<(f64, f64)>> {
        let ll = match self.data.get(id as usize) {
            Some(ll) if !ll.is_absent() => ll,
            _ => {
                error!(id, "node not found in point storage");
                return Ok(None);
            }
        };

        Ok(Some((unpack_coord(ll.lat), unpack_coord(ll.lon))))
    }
}
