//! # Point Storage
//!
//! Node coordinates dominate the OSM input: billions of ids, eight bytes
//! of useful data each. Three interchangeable strategies store the
//! `id -> (lat, lon)` mapping, and the generator picks one per pass based
//! on dataset density and available RAM:
//!
//! | Strategy          | Layout                          | Best for           |
//! |-------------------|---------------------------------|--------------------|
//! | `RawFile*`        | on-disk dense array, mmap reads | planet-scale input |
//! | `RawMem*`         | in-RAM dense array (~32 GiB)    | big machines       |
//! | `MapFile*`        | append log + hash map           | regional extracts  |
//!
//! All three share the fixed-point coordinate encoding: degrees scaled by
//! 1e7 and truncated to `i32`, roughly 1.1 cm of precision at the equator.
//! A coordinate whose scaled value does not fit `i32` is unrecoverable
//! bad input.
//!
//! ## The (0, 0) Sentinel
//!
//! The dense layouts cannot mark absence explicitly: a missing id reads
//! back as filesystem zeros. `(lat, lon) == (0, 0)` therefore means
//! "absent", and a genuine point on the equator at the prime meridian
//! cannot be stored in the dense variants. Known limitation, kept as is;
//! the sparse variant does not share it.

mod map_file;
mod raw_file;
mod raw_mem;

pub use map_file::{MapFilePointStorageReader, MapFilePointStorageWriter, SHORT_FILE_EXTENSION};
pub use raw_file::{RawFilePointStorageReader, RawFilePointStorageWriter};
pub use raw_mem::{RawMemPointStorageReader, RawMemPointStorageWriter, DENSE_NODE_CAPACITY};

use eyre::{ensure, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Fixed-point scale: degrees to 1e-7-degree integer units.
pub const COORD_SCALE: f64 = 1e7;

/// Packed coordinate record of the dense layouts.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct LatLon {
    pub lat: i32,
    pub lon: i32,
}

const _: () = assert!(std::mem::size_of::<LatLon>() == 8);

impl LatLon {
    pub fn is_absent(&self) -> bool {
        self.lat == 0 && self.lon == 0
    }
}

/// Sparse coordinate record: the packed coordinate plus the node id it
/// belongs to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct LatLonPos {
    pub pos: u64,
    pub lat: i32,
    pub lon: i32,
}

const _: () = assert!(std::mem::size_of::<LatLonPos>() == 16);

/// Write half of a point storage strategy.
pub trait PointStorageWriter {
    fn add_point(&mut self, id: u64, lat: f64, lng: f64) -> Result<()>;

    /// Number of points stored so far.
    fn processed_points(&self) -> u64;
}

/// Read half of a point storage strategy.
pub trait PointStorageReader {
    fn get_point(&self, id: u64) -> Result<Option<(f64, f64)>>;
}

pub(crate) fn pack_point(lat: f64, lng: f64) -> Result<LatLon> {
    Ok(LatLon {
        lat: pack_coord(lat, "latitude")?,
        lon: pack_coord(lng, "longitude")?,
    })
}

fn pack_coord(value: f64, what: &str) -> Result<i32> {
    let fixed = (value * COORD_SCALE) as i64;
    ensure!(
        fixed as i32 as i64 == fixed,
        "{} {} does not fit the 32-bit fixed-point encoding",
        what,
        value
    );
    Ok(fixed as i32)
}

pub(crate) fn unpack_coord(value: i32) -> f64 {
    value as f64 / COORD_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_within_fixed_point_precision() {
        for &(lat, lng) in &[
            (55.7558, 37.6173),
            (-34.6037, -58.3816),
            (0.00000017, -0.00000017),
            (89.9999999, 179.9999999),
            (-90.0, -180.0),
        ] {
            let ll = pack_point(lat, lng).unwrap();
            assert!((unpack_coord(ll.lat) - lat).abs() <= 1e-7);
            assert!((unpack_coord(ll.lon) - lng).abs() <= 1e-7);
        }
    }

    #[test]
    fn packing_truncates_toward_zero() {
        let ll = pack_point(0.00000019, -0.00000019).unwrap();
        assert_eq!(ll.lat, 1);
        assert_eq!(ll.lon, -1);
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        assert!(pack_point(300.0, 0.0).is_err());
        assert!(pack_point(0.0, 300.0).is_err());
        assert!(pack_point(-300.0, 0.0).is_err());
        assert!(pack_point(200.0, -200.0).is_ok());
    }

    #[test]
    fn origin_is_the_absent_sentinel() {
        assert!(LatLon::default().is_absent());
        assert!(!pack_point(0.0, 0.0000001).unwrap().is_absent());
    }
}
