//! Double Array File (DAF) reader
//!
//! DAF is the container format underneath SPICE SPK kernels: a 1024-byte
//! file record, then chained summary records (each followed by a record of
//! segment names), then the double precision arrays the summaries point to.
//! Addresses inside the file are 1-based indices of 8-byte words.
//!
//! The format is described in
//! https://naif.jpl.nasa.gov/pub/naif/toolkit_docs/C/req/daf.html

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::jplephem::errors::{io_err, JplephemError, Result};

/// Size of a DAF record in bytes
pub const RECORD_SIZE: usize = 1024;
/// Size of one DAF word (a double) in bytes
const DOUBLE_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

/// A single summary (array descriptor) from a DAF
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Name stored in the paired name record, trimmed
    pub name: String,
    /// The ND double precision components
    pub doubles: Vec<f64>,
    /// The NI integer components
    pub integers: Vec<i32>,
}

/// A memory mapped DAF file
pub struct DAF {
    /// Path the file was opened from
    pub path: PathBuf,
    map: Mmap,
    endian: Endian,
    /// ID word, e.g. "DAF/SPK"
    pub locidw: String,
    /// Number of double precision components in each summary
    pub nd: usize,
    /// Number of integer components in each summary
    pub ni: usize,
    /// Internal file name
    pub ifname: String,
    /// Record number of the first summary record
    pub fward: usize,
    /// Record number of the last summary record
    pub bward: usize,
    /// First free address in the file
    pub free: usize,
}

impl DAF {
    /// Open and memory map a DAF file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| io_err(&path, e))?;

        // SAFETY: the kernel is opened read-only and is not modified while mapped
        let map = unsafe { Mmap::map(&file) }.map_err(|e| io_err(&path, e))?;

        if map.len() < RECORD_SIZE {
            return Err(JplephemError::InvalidFormat(format!(
                "{} is too short to be a DAF file ({} bytes)",
                path.display(),
                map.len()
            )));
        }

        let header = &map[..RECORD_SIZE];
        let locidw = String::from_utf8_lossy(&header[0..8]).trim_end().to_string();
        if !locidw.starts_with("DAF/") && !locidw.starts_with("NAIF/DAF") {
            return Err(JplephemError::InvalidFormat(format!(
                "Unrecognized DAF ID word {locidw:?}"
            )));
        }

        let endian = match &header[88..96] {
            b"LTL-IEEE" => Endian::Little,
            b"BIG-IEEE" => Endian::Big,
            // Pre-1995 files have no format word; ND is always small
            _ if LittleEndian::read_u32(&header[8..12]) < 128 => Endian::Little,
            _ => Endian::Big,
        };

        let read_u32 = |bytes: &[u8]| -> usize {
            let value = match endian {
                Endian::Little => LittleEndian::read_u32(bytes),
                Endian::Big => BigEndian::read_u32(bytes),
            };
            value as usize
        };

        let daf = DAF {
            nd: read_u32(&header[8..12]),
            ni: read_u32(&header[12..16]),
            ifname: String::from_utf8_lossy(&header[16..76]).trim_end().to_string(),
            fward: read_u32(&header[76..80]),
            bward: read_u32(&header[80..84]),
            free: read_u32(&header[84..88]),
            path,
            map,
            endian,
            locidw,
        };

        if daf.nd == 0 || daf.ni < 2 || daf.fward == 0 {
            return Err(JplephemError::InvalidFormat(format!(
                "Invalid DAF header: nd={}, ni={}, fward={}",
                daf.nd, daf.ni, daf.fward
            )));
        }

        log::debug!(
            "Opened DAF {} ({}, nd={}, ni={}, endian={:?})",
            daf.path.display(),
            daf.locidw,
            daf.nd,
            daf.ni,
            daf.endian
        );

        Ok(daf)
    }

    /// Size of one summary in doubles
    fn summary_length(&self) -> usize {
        self.nd + (self.ni + 1) / 2
    }

    /// Borrow a record (1-indexed)
    fn record(&self, record_number: usize) -> Result<&[u8]> {
        let start = record_number
            .checked_sub(1)
            .map(|r| r * RECORD_SIZE)
            .ok_or_else(|| {
                JplephemError::InvalidFormat("Record numbers start at 1".to_string())
            })?;
        self.map.get(start..start + RECORD_SIZE).ok_or_else(|| {
            JplephemError::InvalidFormat(format!(
                "Record {} lies beyond the end of {}",
                record_number,
                self.path.display()
            ))
        })
    }

    fn read_f64(&self, bytes: &[u8]) -> f64 {
        match self.endian {
            Endian::Little => LittleEndian::read_f64(bytes),
            Endian::Big => BigEndian::read_f64(bytes),
        }
    }

    fn read_i32(&self, bytes: &[u8]) -> i32 {
        match self.endian {
            Endian::Little => LittleEndian::read_i32(bytes),
            Endian::Big => BigEndian::read_i32(bytes),
        }
    }

    /// Walk the summary record chain and return every summary in file order
    pub fn summaries(&self) -> Result<Vec<Summary>> {
        let step = self.summary_length() * DOUBLE_SIZE;
        let mut summaries = Vec::new();
        let mut record_number = self.fward;
        let mut visited = 0usize;

        while record_number != 0 {
            visited += 1;
            if visited > self.map.len() / RECORD_SIZE {
                return Err(JplephemError::InvalidFormat(
                    "Summary record chain loops".to_string(),
                ));
            }

            let record = self.record(record_number)?;
            let names = self.record(record_number + 1)?;
            let next = self.read_f64(&record[0..8]) as usize;
            let count = self.read_f64(&record[16..24]) as usize;

            if 24 + count * step > RECORD_SIZE {
                return Err(JplephemError::InvalidFormat(format!(
                    "Summary record {record_number} claims {count} summaries"
                )));
            }

            for i in 0..count {
                let base = 24 + i * step;
                let doubles = (0..self.nd)
                    .map(|k| self.read_f64(&record[base + k * 8..base + k * 8 + 8]))
                    .collect();
                let int_base = base + self.nd * DOUBLE_SIZE;
                let integers = (0..self.ni)
                    .map(|k| self.read_i32(&record[int_base + k * 4..int_base + k * 4 + 4]))
                    .collect();
                let name = String::from_utf8_lossy(&names[i * step..(i + 1) * step])
                    .trim_end()
                    .to_string();

                summaries.push(Summary {
                    name,
                    doubles,
                    integers,
                });
            }

            record_number = next;
        }

        Ok(summaries)
    }

    /// Read the doubles at word addresses `start..=end` (1-based)
    pub fn read_array(&self, start: usize, end: usize) -> Result<Vec<f64>> {
        if start == 0 || end < start {
            return Err(JplephemError::InvalidFormat(format!(
                "Invalid array address range {start}..={end}"
            )));
        }
        let bytes = self
            .map
            .get((start - 1) * DOUBLE_SIZE..end * DOUBLE_SIZE)
            .ok_or_else(|| {
                JplephemError::InvalidFormat(format!(
                    "Array {}..={} lies beyond the end of {}",
                    start,
                    end,
                    self.path.display()
                ))
            })?;
        Ok(bytes
            .chunks_exact(DOUBLE_SIZE)
            .map(|chunk| self.read_f64(chunk))
            .collect())
    }
}

impl std::fmt::Debug for DAF {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DAF")
            .field("path", &self.path)
            .field("locidw", &self.locidw)
            .field("nd", &self.nd)
            .field("ni", &self.ni)
            .field("fward", &self.fward)
            .field("bward", &self.bward)
            .field("free", &self.free)
            .finish()
    }
}
