//! Tests for the jplephem module, run against small kernels written on the
//! fly in the DAF/SPK layout.

use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::daf::{DAF, RECORD_SIZE};
use super::errors::JplephemError;
use super::spk::{jd_to_seconds, SPK};

/// One Chebyshev record: midpoint and radius in seconds, then coefficients
/// for x, y and z (km)
pub(crate) struct TestRecord {
    pub mid: f64,
    pub radius: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

/// A type 2 segment to be written into a test kernel
pub(crate) struct TestSegment {
    pub center: i32,
    pub target: i32,
    pub start_second: f64,
    pub end_second: f64,
    pub records: Vec<TestRecord>,
}

impl TestSegment {
    /// A body parked at a fixed offset (km) from its center
    pub fn fixed(center: i32, target: i32, position_km: [f64; 3]) -> Self {
        let start_second = jd_to_seconds(2_414_864.5); // 1899-07-29
        let end_second = jd_to_seconds(2_471_184.5); // 2053-10-09
        let radius = (end_second - start_second) / 2.0;
        TestSegment {
            center,
            target,
            start_second,
            end_second,
            records: vec![TestRecord {
                mid: start_second + radius,
                radius,
                x: vec![position_km[0], 0.0],
                y: vec![position_km[1], 0.0],
                z: vec![position_km[2], 0.0],
            }],
        }
    }
}

fn pad_to_record(buffer: &mut Vec<u8>) {
    let padded = buffer.len().div_ceil(RECORD_SIZE) * RECORD_SIZE;
    buffer.resize(padded, 0);
}

/// Write a little-endian DAF/SPK kernel holding the given segments
pub(crate) fn write_test_kernel(path: &Path, segments: &[TestSegment]) {
    // Summaries live in record 2, names in record 3, data from record 4
    let mut data: Vec<f64> = Vec::new();
    let mut addresses = Vec::new();
    let first_address = 3 * RECORD_SIZE / 8 + 1;

    for segment in segments {
        let start = first_address + data.len();
        let n_coefficients = segment.records[0].x.len();
        let rsize = 2 + 3 * n_coefficients;
        let intlen = 2.0 * segment.records[0].radius;
        for record in &segment.records {
            data.push(record.mid);
            data.push(record.radius);
            data.extend(&record.x);
            data.extend(&record.y);
            data.extend(&record.z);
        }
        data.extend([
            segment.records[0].mid - segment.records[0].radius,
            intlen,
            rsize as f64,
            segment.records.len() as f64,
        ]);
        addresses.push((start, first_address + data.len() - 1));
    }
    let free = first_address + data.len();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"DAF/SPK ");
    bytes.write_i32::<LittleEndian>(2).unwrap();
    bytes.write_i32::<LittleEndian>(6).unwrap();
    bytes.extend_from_slice(format!("{:<60}", "SKYLAPSE TEST KERNEL").as_bytes());
    bytes.write_i32::<LittleEndian>(2).unwrap();
    bytes.write_i32::<LittleEndian>(2).unwrap();
    bytes.write_i32::<LittleEndian>(free as i32).unwrap();
    bytes.extend_from_slice(b"LTL-IEEE");
    pad_to_record(&mut bytes);

    bytes.write_f64::<LittleEndian>(0.0).unwrap();
    bytes.write_f64::<LittleEndian>(0.0).unwrap();
    bytes.write_f64::<LittleEndian>(segments.len() as f64).unwrap();
    for (segment, (start, end)) in segments.iter().zip(&addresses) {
        bytes.write_f64::<LittleEndian>(segment.start_second).unwrap();
        bytes.write_f64::<LittleEndian>(segment.end_second).unwrap();
        for value in [
            segment.target,
            segment.center,
            1,
            2,
            *start as i32,
            *end as i32,
        ] {
            bytes.write_i32::<LittleEndian>(value).unwrap();
        }
    }
    pad_to_record(&mut bytes);

    for segment in segments {
        let name = format!("TEST {} -> {}", segment.center, segment.target);
        bytes.extend_from_slice(format!("{name:<40}").as_bytes());
    }
    pad_to_record(&mut bytes);

    for value in data {
        bytes.write_f64::<LittleEndian>(value).unwrap();
    }
    pad_to_record(&mut bytes);

    File::create(path).unwrap().write_all(&bytes).unwrap();
}

#[test]
fn test_daf_header_and_summaries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.bsp");
    write_test_kernel(
        &path,
        &[
            TestSegment::fixed(0, 3, [1.0, 2.0, 3.0]),
            TestSegment::fixed(3, 399, [-4.0, 5.0, -6.0]),
        ],
    );

    let daf = DAF::open(&path).unwrap();
    assert_eq!(daf.locidw, "DAF/SPK");
    assert_eq!(daf.nd, 2);
    assert_eq!(daf.ni, 6);
    assert_eq!(daf.ifname, "SKYLAPSE TEST KERNEL");

    let summaries = daf.summaries().unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[1].name, "TEST 3 -> 399");
    assert_eq!(&summaries[1].integers[..4], &[399, 3, 1, 2]);

    let (start, end) = (
        summaries[0].integers[4] as usize,
        summaries[0].integers[5] as usize,
    );
    let array = daf.read_array(start, end).unwrap();
    // mid, radius, 3 x 2 coefficients, then the 4-word directory
    assert_eq!(array.len(), 12);
    assert_eq!(array[2], 1.0);
    assert_eq!(array[11], 1.0);
}

#[test]
fn test_spk_compute_fixed_segment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.bsp");
    write_test_kernel(&path, &[TestSegment::fixed(3, 399, [-4.0, 5.0, -6.0])]);

    let spk = SPK::open(&path).unwrap();
    let t = jd_to_seconds(2_461_105.0);
    let position = spk.compute(3, 399, t).unwrap();
    assert_eq!(position.x, -4.0);
    assert_eq!(position.y, 5.0);
    assert_eq!(position.z, -6.0);

    assert!(matches!(
        spk.compute(0, 3, t),
        Err(JplephemError::BodyNotFound {
            center: 0,
            target: 3
        })
    ));
    assert!(spk.segments[0].describe().contains("EARTH (399)"));
}

#[test]
fn test_spk_multiple_records_and_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.bsp");

    // Two 100 s records: x runs linearly 0 -> 100 then holds at 500
    let segment = TestSegment {
        center: 0,
        target: 10,
        start_second: 0.0,
        end_second: 200.0,
        records: vec![
            TestRecord {
                mid: 50.0,
                radius: 50.0,
                x: vec![50.0, 50.0],
                y: vec![0.0, 0.0],
                z: vec![0.0, 0.0],
            },
            TestRecord {
                mid: 150.0,
                radius: 50.0,
                x: vec![500.0, 0.0],
                y: vec![1.0, 0.0],
                z: vec![2.0, 0.0],
            },
        ],
    };
    write_test_kernel(&path, &[segment]);

    let spk = SPK::open(&path).unwrap();
    assert!((spk.compute(0, 10, 25.0).unwrap().x - 25.0).abs() < 1e-12);
    assert_eq!(spk.compute(0, 10, 150.0).unwrap().x, 500.0);
    // The final boundary falls into the last record
    assert_eq!(spk.compute(0, 10, 200.0).unwrap().z, 2.0);

    assert!(matches!(
        spk.compute(0, 10, 250.0),
        Err(JplephemError::OutOfRangeError { .. })
    ));
}

#[test]
fn test_rejects_non_daf_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bogus.bsp");
    std::fs::write(&path, vec![b'x'; 2048]).unwrap();
    assert!(matches!(
        DAF::open(&path),
        Err(JplephemError::InvalidFormat(_))
    ));

    let missing = dir.path().join("missing.bsp");
    assert!(matches!(
        SPK::open(&missing),
        Err(JplephemError::FileError { .. })
    ));
}
