//! # Sparse Point Storage
//!
//! For regional extracts only a small slice of the node id space is
//! populated, and a dense array would be mostly holes. The sparse layout
//! appends one 16-byte `LatLonPos` record per point to a `.short` file;
//! the reader streams the file once into a hash map keyed by id.
//!
//! Unlike the dense layouts, a lookup miss here is expected (ways
//! routinely reference nodes outside the extract) and is not logged.

use std::mem::size_of;
use std::path::Path;

use eyre::{ensure, eyre, Result};
use hashbrown::HashMap;
use tracing::info;
use zerocopy::{FromBytes, IntoBytes};

use super::{pack_point, unpack_coord, LatLon, LatLonPos, PointStorageReader, PointStorageWriter};
use crate::io::{path_with_suffix, FileReader, SequentialWriter};

/// File name suffix of the sparse point file.
pub const SHORT_FILE_EXTENSION: &str = "short";

const RECORD_SIZE: usize = size_of::<LatLonPos>();

#[derive(Debug)]
pub struct MapFilePointStorageWriter {
    file: SequentialWriter,
    processed: u64,
}

impl MapFilePointStorageWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            file: SequentialWriter::create(path_with_suffix(
                path.as_ref(),
                SHORT_FILE_EXTENSION,
            ))?,
            processed: 0,
        })
    }
}

impl PointStorageWriter for MapFilePointStorageWriter {
    fn add_point(&mut self, id: u64, lat: f64, lng: f64) -> Result<()> {
        let ll = pack_point(lat, lng)?;
        let record = LatLonPos {
            pos: id,
            lat: ll.lat,
            lon: ll.lon,
        };

        self.file.write(record.as_bytes())?;
        self.processed += 1;

        Ok(())
    }

    fn processed_points(&self) -> u64 {
        self.processed
    }
}

#[derive(Debug)]
pub struct MapFilePointStorageReader {
    map: HashMap<u64, LatLon>,
}

impl MapFilePointStorageReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path_with_suffix(path.as_ref(), SHORT_FILE_EXTENSION);
        let file = FileReader::open(&path)?;
        let file_size = file.size();

        info!(file = %path.display(), "loading sparse point file");

        ensure!(
            file_size % RECORD_SIZE as u64 == 0,
            "damaged sparse point file '{}': size {} is not a multiple of {}",
            path.display(),
            file_size,
            RECORD_SIZE
        );

        let mut bytes = vec![0u8; file_size as usize];
        file.read_at(0, &mut bytes)?;

        let mut map = HashMap::with_capacity(bytes.len() / RECORD_SIZE);
        for record in bytes.chunks_exact(RECORD_SIZE) {
            let ll = LatLonPos::read_from_bytes(record)
                .map_err(|e| eyre!("invalid point record in '{}': {e:?}", path.display()))?;
            map.entry(ll.pos).or_insert(LatLon {
                lat: ll.lat,
                lon: ll.lon,
            });
        }

        info!(file = %path.display(), nodes = map.len(), "sparse point file loaded");

        Ok(Self { map })
    }
}

impl PointStorageReader for MapFilePointStorageReader {
    fn get_point(&self, id: u64) -> Result<Option<(f64, f64)>> {
        Ok(self
            .map
            .get(&id)
            .map(|ll| (unpack_coord(ll.lat), unpack_coord(ll.lon))))
    }
}
