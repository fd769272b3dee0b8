//! # Element Cache Layer
//!
//! During a bulk import the generator makes several passes over the OSM
//! data. The dataset is far larger than memory but must be addressable by
//! 64-bit element id, so each pass persists intermediate element payloads
//! into a flat file pair:
//!
//! ```text
//! nodes.dat            # payload file: [u32 size][bytes] records
//! nodes.dat.offsets    # index file: packed (u64 id, u64 offset) records
//! ```
//!
//! The payload file is append-only and sequentially written; the offset
//! index is small and dense enough to be fully memory-resident during
//! reads. Later passes load the index, sort it once, and then retrieve
//! elements by id with a binary search plus one or two positioned reads
//! (or a pure memory read when the payload file is preloaded).
//!
//! ## Write / Read Split
//!
//! Every cache object is either a writer or a reader, as two distinct
//! types. A pass that produces a cache holds the writer; passes that
//! consume it hold readers. There is no runtime mode flag and no way to
//! call a write operation on a reader.
//!
//! ## Failure Model
//!
//! Damaged files, allocation failure while loading an index, and I/O
//! errors are unrecoverable for the import: downstream passes depend on
//! complete, well-formed intermediate files. All such conditions surface
//! as errors that the pipeline treats as fatal. The only normal negative
//! result is a lookup for an id that was never written.

mod element;
mod index;

pub use element::{ElementCacheReader, ElementCacheWriter};
pub use index::{IndexFileReader, IndexFileWriter, IndexValue, FLUSH_COUNT};

use eyre::Result;

/// File name suffix of the offset index paired with a payload file.
pub const OFFSETS_FILE_EXTENSION: &str = "offsets";

/// Byte-level codec for one cached element.
///
/// The cache itself is payload-agnostic: each stored type encodes itself
/// into the writer's scratch buffer and decodes itself from the byte slice
/// the reader hands back.
pub trait Payload: Sized {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()>;
    fn decode(bytes: &[u8]) -> Result<Self>;
}

/// Raw-bytes elements, stored verbatim.
impl Payload for Vec<u8> {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(self);
        Ok(())
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}
