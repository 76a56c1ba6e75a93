//! Planetary ephemeris built on a JPL SPK kernel
//!
//! Answers "where is body X as seen from body Y at time T" by chaining the
//! kernel's segments through the solar system barycenter.

use nalgebra::Vector3;
use std::path::Path;

use crate::constants::AU_KM;
use crate::jplephem::names::{target_id, target_name};
use crate::jplephem::{JplephemError, SPK};
use crate::time::Time;
use crate::Result;

/// NAIF code of the solar system barycenter
const SSB: i32 = 0;
/// NAIF code of the Earth
pub const EARTH: i32 = 399;
/// NAIF code of the Sun
pub const SUN: i32 = 10;

/// Anything that can place the Earth in the barycentric frame
///
/// The frame generator only needs the Earth's position; keeping it behind a
/// trait lets tests run without a 16 MB kernel.
pub trait EarthPosition {
    /// Barycentric ICRS position of the geocenter in AU
    fn earth_barycentric(&self, t: &Time) -> Result<Vector3<f64>>;
}

/// Planetary ephemeris backed by an SPK kernel such as DE421
#[derive(Debug)]
pub struct Ephemeris {
    spk: SPK,
}

impl Ephemeris {
    /// Open an SPK kernel
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let spk = SPK::open(path)?;
        log::info!("Ephemeris loaded with {} segments", spk.segments.len());
        Ok(Self { spk })
    }

    /// Access the underlying kernel
    pub fn spk(&self) -> &SPK {
        &self.spk
    }

    /// Resolve a body name ("earth", "sun", "mars barycenter", "399") to its
    /// NAIF code
    pub fn body(&self, name: &str) -> Result<i32> {
        let id = target_id(name)
            .ok_or_else(|| crate::SkylapseError::ObjectNotFound(name.to_string()))?;
        if id != SSB && self.spk.segment_for_target(id).is_none() {
            return Err(crate::SkylapseError::ObjectNotFound(format!(
                "{name} is not covered by this ephemeris"
            )));
        }
        Ok(id)
    }

    /// Position of a body relative to the solar system barycenter in AU
    pub fn barycentric(&self, body: i32, t: &Time) -> Result<Vector3<f64>> {
        let tdb_seconds = t.tdb_seconds_from_j2000();
        let mut position = Vector3::zeros();
        let mut current = body;
        let mut hops = 0;

        while current != SSB {
            let segment = self
                .spk
                .segment_for_target(current)
                .ok_or(JplephemError::BodyNotFound {
                    center: SSB,
                    target: current,
                })?;
            position += segment.compute(&self.spk.daf, tdb_seconds)?;
            current = segment.center;

            hops += 1;
            if hops > self.spk.segments.len() {
                return Err(crate::SkylapseError::DataError(format!(
                    "Segment chain for {} never reaches the barycenter",
                    target_name(body).unwrap_or("body")
                )));
            }
        }

        Ok(position / AU_KM)
    }

    /// Position of `target` as seen from `center` in AU (geometric, no light
    /// time)
    pub fn position(&self, target: i32, center: i32, t: &Time) -> Result<Vector3<f64>> {
        Ok(self.barycentric(target, t)? - self.barycentric(center, t)?)
    }

    /// Same as `position`, addressing bodies by name
    pub fn position_of(&self, target: &str, center: &str, t: &Time) -> Result<Vector3<f64>> {
        self.position(self.body(target)?, self.body(center)?, t)
    }
}

impl EarthPosition for Ephemeris {
    fn earth_barycentric(&self, t: &Time) -> Result<Vector3<f64>> {
        self.barycentric(EARTH, t)
    }
}

/// An Earth pinned at a fixed barycentric position, for offline rendering
#[derive(Debug, Clone, Copy)]
pub struct FixedEarth(pub Vector3<f64>);

impl EarthPosition for FixedEarth {
    fn earth_barycentric(&self, _t: &Time) -> Result<Vector3<f64>> {
        Ok(self.0)
    }
}
