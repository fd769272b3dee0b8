//! # Point Storage Tests
//!
//! Exercises the three coordinate storage strategies end to end: write a
//! pass, reopen for reading, and check lookups, misses, and the
//! fixed-point tolerance.

use osmcache::{
    MapFilePointStorageReader, MapFilePointStorageWriter, PointStorageReader, PointStorageWriter,
    RawFilePointStorageReader, RawFilePointStorageWriter, RawMemPointStorageReader,
    RawMemPointStorageWriter,
};
use tempfile::tempdir;

const TOLERANCE: f64 = 1e-7;

fn assert_close(point: (f64, f64), lat: f64, lng: f64) {
    assert!(
        (point.0 - lat).abs() <= TOLERANCE && (point.1 - lng).abs() <= TOLERANCE,
        "got {point:?}, expected ({lat}, {lng})"
    );
}

mod raw_file_tests {
    use super::*;

    #[test]
    fn written_point_reads_back_within_tolerance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.bin");

        {
            let mut writer = RawFilePointStorageWriter::create(&path).unwrap();
            writer.add_point(5, 55.7558, 37.6173).unwrap();
            assert_eq!(writer.processed_points(), 1);
        }

        let reader = RawFilePointStorageReader::open(&path).unwrap();
        let point = reader.get_point(5).unwrap().expect("node 5 SHOULD exist");
        assert_close(point, 55.7558, 37.6173);

        assert_eq!(reader.get_point(6).unwrap(), None);
    }

    #[test]
    fn ids_skipped_by_the_writer_read_back_as_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.bin");

        {
            let mut writer = RawFilePointStorageWriter::create(&path).unwrap();
            writer.add_point(2, 48.8566, 2.3522).unwrap();
            writer.add_point(40, -34.6037, -58.3816).unwrap();
            assert_eq!(writer.processed_points(), 2);
        }

        let reader = RawFilePointStorageReader::open(&path).unwrap();
        assert_close(reader.get_point(2).unwrap().unwrap(), 48.8566, 2.3522);
        assert_close(reader.get_point(40).unwrap().unwrap(), -34.6037, -58.3816);

        // the hole between the two records and everything past the end
        assert_eq!(reader.get_point(10).unwrap(), None);
        assert_eq!(reader.get_point(1_000_000).unwrap(), None);
    }

    #[test]
    fn out_of_range_coordinates_fail_the_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.bin");

        let mut writer = RawFilePointStorageWriter::create(&path).unwrap();
        assert!(writer.add_point(0, 300.0, 0.0).is_err());
        assert_eq!(
            writer.processed_points(),
            0,
            "a rejected point SHOULD not count as processed"
        );
    }
}

mod raw_mem_tests {
    use super::*;

    #[test]
    fn snapshot_and_restore_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.mem");

        {
            let mut writer = RawMemPointStorageWriter::with_capacity(&path, 1024).unwrap();
            writer.add_point(0, 51.5074, -0.1278).unwrap();
            writer.add_point(1023, 35.6762, 139.6503).unwrap();
            assert_eq!(writer.processed_points(), 2);
            writer.close().unwrap();
        }

        let reader = RawMemPointStorageReader::with_capacity(&path, 1024).unwrap();
        assert_close(reader.get_point(0).unwrap().unwrap(), 51.5074, -0.1278);
        assert_close(reader.get_point(1023).unwrap().unwrap(), 35.6762, 139.6503);
        assert_eq!(reader.get_point(500).unwrap(), None);
        assert_eq!(reader.get_point(4096).unwrap(), None);
    }

    #[test]
    fn dropping_the_writer_snapshots_the_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.mem");

        {
            let mut writer = RawMemPointStorageWriter::with_capacity(&path, 64).unwrap();
            writer.add_point(7, 59.9311, 30.3609).unwrap();
            // no close()
        }

        let reader = RawMemPointStorageReader::with_capacity(&path, 64).unwrap();
        assert_close(reader.get_point(7).unwrap().unwrap(), 59.9311, 30.3609);
    }

    #[test]
    fn ids_beyond_the_capacity_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.mem");

        let mut writer = RawMemPointStorageWriter::with_capacity(&path, 64).unwrap();
        assert!(writer.add_point(64, 1.0, 1.0).is_err());
        writer.close().unwrap();
    }
}

mod map_file_tests {
    use super::*;

    #[test]
    fn sparse_ids_round_trip_and_misses_stay_silent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.bin");
        let base = 10u64.pow(10);

        {
            let mut writer = MapFilePointStorageWriter::create(&path).unwrap();
            writer.add_point(base, 55.7558, 37.6173).unwrap();
            writer.add_point(base + 1, 59.9311, 30.3609).unwrap();
            assert_eq!(writer.processed_points(), 2);
        }

        let reader = MapFilePointStorageReader::open(&path).unwrap();
        assert_close(reader.get_point(base).unwrap().unwrap(), 55.7558, 37.6173);
        assert_close(
            reader.get_point(base + 1).unwrap().unwrap(),
            59.9311,
            30.3609,
        );
        assert_eq!(reader.get_point(base + 2).unwrap(), None);
    }

    #[test]
    fn first_record_wins_for_a_duplicated_sparse_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.bin");

        {
            let mut writer = MapFilePointStorageWriter::create(&path).unwrap();
            writer.add_point(9, 1.0, 2.0).unwrap();
            writer.add_point(9, 3.0, 4.0).unwrap();
        }

        let reader = MapFilePointStorageReader::open(&path).unwrap();
        assert_close(reader.get_point(9).unwrap().unwrap(), 1.0, 2.0);
    }

    #[test]
    fn truncated_sparse_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.bin");

        {
            let mut writer = MapFilePointStorageWriter::create(&path).unwrap();
            writer.add_point(1, 10.0, 20.0).unwrap();
        }

        let short_path = dir.path().join("nodes.bin.short");
        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(&short_path)
            .unwrap();
        file.set_len(10).unwrap();
        drop(file);

        let err = MapFilePointStorageReader::open(&path).unwrap_err();
        assert!(
            err.to_string().contains("damaged"),
            "error SHOULD name the damaged file, got: {err}"
        );
    }
}
