//! # osmcache - Intermediate Cache for OSM Import Passes
//!
//! A map-data generator imports OpenStreetMap elements (nodes, ways,
//! relations) in multiple passes. The dataset is far larger than memory
//! but every pass needs random access by 64-bit element id, so the
//! intermediate state lives in flat files with memory-resident offset
//! indexes. This crate is that cache layer.
//!
//! ## Quick Start
//!
//! ```ignore
//! use osmcache::{ElementCacheReader, ElementCacheWriter};
//!
//! // first pass: persist encoded elements
//! let mut writer = ElementCacheWriter::create("ways.dat")?;
//! writer.write(way_id, &encoded_way)?;
//! writer.save_offsets()?;
//!
//! // later pass: random retrieval by id
//! let mut reader = ElementCacheReader::open("ways.dat", false)?;
//! reader.load_offsets()?;
//! let way: Option<Vec<u8>> = reader.read(way_id)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │  ElementCache      │  PointStorage strategies │
//! │  (payload + index) │  (dense file / dense RAM │
//! │                    │   / sparse map)          │
//! ├───────────────────────────────────────────────┤
//! │  IndexFile (sorted id -> offset table)        │
//! ├───────────────────────────────────────────────┤
//! │  io: SequentialWriter / FileReader / mmap     │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## File Layout
//!
//! ```text
//! intermediate_dir/
//! ├── ways.dat             # element payloads, [u32 size][bytes] records
//! ├── ways.dat.offsets     # packed (u64 id, u64 offset) index
//! ├── nodes.bin            # dense point array (RawFile / RawMem)
//! └── nodes.bin.short      # sparse point log (MapFile)
//! ```
//!
//! Every object is constructed either as a writer or as a reader; the two
//! are distinct types, so using a cache in the wrong direction does not
//! compile. Write-mode objects flush their buffered state when dropped.
//!
//! Files use host byte order and are produced and consumed on the same
//! machine; they are intermediate state, not an interchange format.
//!
//! ## Module Overview
//!
//! - [`io`]: sequential writer and random-access readers
//! - [`cache`]: offset index file and the id -> payload element cache
//! - [`points`]: dense and sparse node coordinate storage

pub mod cache;
pub mod io;
pub mod points;

pub use cache::{
    ElementCacheReader, ElementCacheWriter, IndexFileReader, IndexFileWriter, IndexValue, Payload,
    FLUSH_COUNT, OFFSETS_FILE_EXTENSION,
};
pub use points::{
    LatLon, LatLonPos, MapFilePointStorageReader, MapFilePointStorageWriter, PointStorageReader,
    PointStorageWriter, RawFilePointStorageReader, RawFilePointStorageWriter,
    RawMemPointStorageReader, RawMemPointStorageWriter, COORD_SCALE, DENSE_NODE_CAPACITY,
    SHORT_FILE_EXTENSION,
};
