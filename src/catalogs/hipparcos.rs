//! Hipparcos star catalog implementation
//!
//! Reads the pipe separated `hip_main.dat` file published by CDS (plain or
//! gzip compressed). Rows keep their file order.

use flate2::read::GzDecoder;
use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use super::{StarCatalog, StarData};
use crate::constants::HIPPARCOS_EPOCH;
use crate::Result;
use crate::SkylapseError;

/// Struct representing an entry in the Hipparcos catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HipparcosEntry {
    /// Hipparcos identifier
    pub hip: usize,
    /// Right ascension in degrees (ICRS, epoch J1991.25)
    pub ra: f64,
    /// Declination in degrees (ICRS, epoch J1991.25)
    pub dec: f64,
    /// Visual magnitude
    pub mag: f64,
    /// B-V color index
    pub b_v: Option<f64>,
    /// Proper motion in RA*cos(dec) (mas/year)
    pub pm_ra: Option<f64>,
    /// Proper motion in declination (mas/year)
    pub pm_dec: Option<f64>,
    /// Parallax (mas)
    pub parallax: Option<f64>,
}

impl HipparcosEntry {
    /// Convert RA/Dec to unit vector in ICRS coordinates
    pub fn unit_vector(&self) -> na::Vector3<f64> {
        let ra_rad = self.ra.to_radians();
        let dec_rad = self.dec.to_radians();

        na::Vector3::new(
            dec_rad.cos() * ra_rad.cos(),
            dec_rad.cos() * ra_rad.sin(),
            dec_rad.sin(),
        )
    }

    /// Parse one pipe separated row of `hip_main.dat`
    ///
    /// Returns `None` for rows without an identifier, magnitude or position.
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < 10 {
            return None;
        }
        let number = |i: usize| fields.get(i).and_then(|s| s.trim().parse::<f64>().ok());

        Some(HipparcosEntry {
            hip: fields[1].trim().parse().ok()?,
            mag: number(5)?,
            ra: number(8)?,
            dec: number(9)?,
            parallax: number(11),
            pm_ra: number(12),
            pm_dec: number(13),
            b_v: number(37),
        })
    }
}

/// Hipparcos catalog
#[derive(Debug, Clone, Default)]
pub struct HipparcosCatalog {
    /// Stars in file order
    stars: Vec<HipparcosEntry>,
    /// Magnitude limit used when loading
    mag_limit: f64,
}

impl HipparcosCatalog {
    /// Build a catalog from already parsed entries, keeping their order
    pub fn from_entries(stars: Vec<HipparcosEntry>) -> Self {
        let mag_limit = stars.iter().map(|s| s.mag).fold(f64::MIN, f64::max);
        Self { stars, mag_limit }
    }

    /// Load from the Hipparcos .dat file (or a .gz of it)
    pub fn from_dat_file<P: AsRef<Path>>(path: P, mag_limit: f64) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        if file.metadata()?.len() == 0 {
            return Err(SkylapseError::DataError(format!(
                "Hipparcos data file {} is empty",
                path.display()
            )));
        }

        let gzipped = path.extension().is_some_and(|ext| ext == "gz");
        let reader: Box<dyn Read> = if gzipped {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        let catalog = Self::from_reader(BufReader::new(reader), mag_limit)?;
        log::info!(
            "Loaded {} stars from {} (magnitude <= {})",
            catalog.len(),
            path.display(),
            mag_limit
        );
        Ok(catalog)
    }

    /// Parse catalog rows from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R, mag_limit: f64) -> Result<Self> {
        let mut stars = Vec::new();
        let mut line_count = 0;
        let mut skipped_lines = 0;

        for line in reader.lines() {
            let line = line?;
            line_count += 1;

            if line.trim().is_empty() {
                continue;
            }

            match HipparcosEntry::parse_line(&line) {
                Some(entry) if entry.mag <= mag_limit => stars.push(entry),
                Some(_) => {}
                None => skipped_lines += 1,
            }
        }

        if stars.is_empty() {
            return Err(SkylapseError::DataError(format!(
                "No stars loaded. Read {line_count} lines, skipped {skipped_lines}, \
                 none within magnitude limit {mag_limit}"
            )));
        }

        log::debug!(
            "Hipparcos: read {line_count} lines, skipped {skipped_lines}, kept {}",
            stars.len()
        );
        Ok(Self { stars, mag_limit })
    }

    /// Get the magnitude limit used when loading this catalog
    pub fn mag_limit(&self) -> f64 {
        self.mag_limit
    }

    /// Catalog epoch as a TDB Julian date (J1991.25)
    pub fn epoch(&self) -> f64 {
        HIPPARCOS_EPOCH
    }

    /// Entries in file order
    pub fn entries(&self) -> &[HipparcosEntry] {
        &self.stars
    }

    /// Look a star up by HIP number
    pub fn get_star(&self, hip: usize) -> Option<&HipparcosEntry> {
        self.stars.iter().find(|s| s.hip == hip)
    }

    /// Magnitudes in catalog order
    pub fn magnitudes(&self) -> Vec<f64> {
        self.stars.iter().map(|s| s.mag).collect()
    }

    /// A handful of real bright stars, for tests and demos
    pub fn create_synthetic() -> Self {
        let star = |hip, ra, dec, mag, b_v, pm_ra, pm_dec, parallax| HipparcosEntry {
            hip,
            ra,
            dec,
            mag,
            b_v: Some(b_v),
            pm_ra: Some(pm_ra),
            pm_dec: Some(pm_dec),
            parallax: Some(parallax),
        };

        Self::from_entries(vec![
            star(32349, 101.2874, -16.7161, -1.46, 0.00, -546.05, -1223.14, 379.21), // Sirius
            star(91262, 279.2347, 38.7837, 0.03, 0.00, 200.94, 286.23, 130.23),      // Vega
            star(27989, 88.7929, 7.4070, 0.45, 1.50, 27.33, 10.86, 7.63),            // Betelgeuse
            star(11767, 37.9529, 89.2641, 1.97, 0.64, 44.22, -11.74, 7.56),          // Polaris
            star(26727, 85.1897, -1.9426, 1.74, -0.20, 3.99, 2.54, 3.99),            // Alnitak
            star(26311, 84.0534, -1.2019, 1.69, -0.18, 1.49, -1.06, 2.43),           // Alnilam
            star(25930, 83.0017, -0.2991, 2.25, -0.22, 1.67, 0.56, 3.56),            // Mintaka
            star(54061, 165.9320, 61.7510, 1.81, 1.06, -136.46, -35.25, 26.38),      // Dubhe
        ])
    }
}

impl StarCatalog for HipparcosCatalog {
    type Star = HipparcosEntry;

    fn stars(&self) -> impl Iterator<Item = &Self::Star> {
        self.stars.iter()
    }

    fn len(&self) -> usize {
        self.stars.len()
    }

    fn star_data(&self) -> impl Iterator<Item = StarData> + '_ {
        self.stars
            .iter()
            .map(|star| StarData::new(star.hip as u64, star.ra, star.dec, star.mag, star.b_v))
    }
}
