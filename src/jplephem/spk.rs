//! Spacecraft Planet Kernel (SPK) format handling
//!
//! This module provides functionality for reading NASA SPICE SPK files which
//! contain position data for solar system bodies.
//!
//! The SPK format is described in:
//! http://naif.jpl.nasa.gov/pub/naif/toolkit_docs/FORTRAN/req/spk.html

use nalgebra::Vector3;
use std::path::Path;

use crate::constants::{DAY_S, J2000};
use crate::jplephem::chebyshev;
use crate::jplephem::daf::DAF;
use crate::jplephem::errors::{JplephemError, Result};
use crate::jplephem::names::target_name;

/// Convert seconds since J2000 to Julian date
pub fn seconds_to_jd(seconds: f64) -> f64 {
    J2000 + seconds / DAY_S
}

/// Convert Julian date to seconds since J2000
pub fn jd_to_seconds(jd: f64) -> f64 {
    (jd - J2000) * DAY_S
}

/// Spacecraft Planet Kernel (SPK) file reader
#[derive(Debug)]
pub struct SPK {
    /// The underlying DAF file
    pub daf: DAF,
    /// Segments in file order
    pub segments: Vec<Segment>,
}

/// A segment in an SPK file covering one (center, target) pair
#[derive(Debug, Clone)]
pub struct Segment {
    /// Source of the segment (e.g., "DE-0421LE-0421")
    pub source: String,
    /// Initial epoch in TDB seconds since J2000
    pub start_second: f64,
    /// Final epoch in TDB seconds since J2000
    pub end_second: f64,
    /// Target body ID
    pub target: i32,
    /// Center body ID
    pub center: i32,
    /// Reference frame ID (1 = J2000/ICRF)
    pub frame: i32,
    /// Data type (2: Chebyshev position, 3: Chebyshev position and velocity)
    pub data_type: i32,
    /// First word address of the segment data
    pub start_i: usize,
    /// Last word address of the segment data
    pub end_i: usize,
    /// Record directory trailing the segment data
    directory: RecordDirectory,
}

/// The four words at the end of a type 2/3 segment
#[derive(Debug, Clone, Copy)]
struct RecordDirectory {
    /// Initial epoch of the first record (TDB seconds past J2000)
    init: f64,
    /// Length of each record's interval in seconds
    intlen: f64,
    /// Record size in doubles
    rsize: usize,
    /// Number of records
    n_records: usize,
}

impl SPK {
    /// Open an SPK file at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let daf = DAF::open(path)?;
        if daf.nd != 2 || daf.ni != 6 {
            return Err(JplephemError::InvalidFormat(format!(
                "SPK files have ND=2, NI=6; found ND={}, NI={}",
                daf.nd, daf.ni
            )));
        }

        let mut segments = Vec::new();
        for summary in daf.summaries()? {
            let (doubles, ints) = (&summary.doubles, &summary.integers);
            let (start_i, end_i) = (ints[4] as usize, ints[5] as usize);
            if end_i < start_i + 3 {
                return Err(JplephemError::InvalidFormat(format!(
                    "Segment {:?} has an empty data range",
                    summary.name
                )));
            }

            let trailer = daf.read_array(end_i - 3, end_i)?;
            let directory = RecordDirectory {
                init: trailer[0],
                intlen: trailer[1],
                rsize: trailer[2] as usize,
                n_records: trailer[3] as usize,
            };

            segments.push(Segment {
                source: summary.name,
                start_second: doubles[0],
                end_second: doubles[1],
                target: ints[0],
                center: ints[1],
                frame: ints[2],
                data_type: ints[3],
                start_i,
                end_i,
                directory,
            });
        }

        log::debug!("Loaded {} SPK segments", segments.len());
        Ok(SPK { daf, segments })
    }

    /// Get the segment for a specific (center, target) pair
    pub fn segment(&self, center: i32, target: i32) -> Result<&Segment> {
        self.segments
            .iter()
            .find(|s| s.center == center && s.target == target)
            .ok_or(JplephemError::BodyNotFound { center, target })
    }

    /// Segment that gives `target`'s position, whatever its center
    pub fn segment_for_target(&self, target: i32) -> Option<&Segment> {
        self.segments.iter().find(|s| s.target == target)
    }

    /// Position of `target` relative to `center` in km at the given TDB
    /// seconds past J2000
    pub fn compute(&self, center: i32, target: i32, tdb_seconds: f64) -> Result<Vector3<f64>> {
        self.segment(center, target)?.compute(&self.daf, tdb_seconds)
    }
}

impl Segment {
    /// Start of coverage as a TDB Julian date
    pub fn start_jd(&self) -> f64 {
        seconds_to_jd(self.start_second)
    }

    /// End of coverage as a TDB Julian date
    pub fn end_jd(&self) -> f64 {
        seconds_to_jd(self.end_second)
    }

    /// Compute the position (km) at the given TDB seconds past J2000
    pub fn compute(&self, daf: &DAF, tdb_seconds: f64) -> Result<Vector3<f64>> {
        if tdb_seconds < self.start_second || tdb_seconds > self.end_second {
            return Err(JplephemError::OutOfRangeError {
                jd: seconds_to_jd(tdb_seconds),
                start_jd: self.start_jd(),
                end_jd: self.end_jd(),
            });
        }

        let components = match self.data_type {
            2 => 3,
            3 => 6,
            other => return Err(JplephemError::UnsupportedDataType(other)),
        };

        let dir = self.directory;
        if dir.n_records == 0 || dir.intlen <= 0.0 || dir.rsize < 2 + components {
            return Err(JplephemError::InvalidFormat(format!(
                "Segment {} has a malformed record directory",
                self.source
            )));
        }
        let n_coefficients = (dir.rsize - 2) / components;

        let index = (((tdb_seconds - dir.init) / dir.intlen).floor().max(0.0) as usize)
            .min(dir.n_records - 1);
        let first = self.start_i + index * dir.rsize;
        let record = daf.read_array(first, first + dir.rsize - 1)?;

        let x = chebyshev::normalize_time(tdb_seconds, record[0], record[1])?;
        let component = |k: usize| {
            let offset = 2 + k * n_coefficients;
            chebyshev::evaluate(&record[offset..offset + n_coefficients], x)
        };

        Ok(Vector3::new(component(0), component(1), component(2)))
    }

    /// One-line description in the style of jplephem's segment listing
    pub fn describe(&self) -> String {
        let name = |id: i32| {
            target_name(id)
                .map(|n| format!("{n} ({id})"))
                .unwrap_or_else(|| id.to_string())
        };
        format!(
            "{:.2}..{:.2}  Type {}  {} -> {}",
            self.start_jd(),
            self.end_jd(),
            self.data_type,
            name(self.center),
            name(self.target)
        )
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}
