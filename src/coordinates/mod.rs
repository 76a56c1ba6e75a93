//! Equatorial coordinates and the unit-vector helpers shared by the
//! astrometry and projection code.
//!
//! All frames here are right handed: X toward the vernal equinox, Z toward
//! the north celestial pole.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::TAU;

/// Equatorial coordinates (RA/Dec), both stored in radians
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equatorial {
    /// Right ascension in radians, normalized to [0, 2π)
    pub ra: f64,
    /// Declination in radians
    pub dec: f64,
}

impl Equatorial {
    pub fn new(ra: f64, dec: f64) -> Self {
        Equatorial {
            ra: ra.rem_euclid(TAU),
            dec,
        }
    }

    /// Create a new Equatorial coordinate with values in degrees
    pub fn from_degrees(ra_deg: f64, dec_deg: f64) -> Self {
        Self::new(ra_deg.to_radians(), dec_deg.to_radians())
    }

    /// Direction of a (not necessarily unit) cartesian vector
    pub fn from_vector(v: &Vector3<f64>) -> Self {
        let r_xy = (v.x * v.x + v.y * v.y).sqrt();
        Equatorial::new(v.y.atan2(v.x), v.z.atan2(r_xy))
    }

    /// Get right ascension in degrees
    pub fn ra_degrees(&self) -> f64 {
        self.ra.to_degrees()
    }

    /// Get right ascension in hours
    pub fn ra_hours(&self) -> f64 {
        self.ra.to_degrees() / 15.0
    }

    /// Get declination in degrees
    pub fn dec_degrees(&self) -> f64 {
        self.dec.to_degrees()
    }

    /// Unit vector pointing at this direction
    pub fn unit_vector(&self) -> Vector3<f64> {
        let cos_dec = self.dec.cos();
        Vector3::new(
            cos_dec * self.ra.cos(),
            cos_dec * self.ra.sin(),
            self.dec.sin(),
        )
    }

    /// Angular distance to another coordinate in radians
    pub fn angular_distance(&self, other: &Equatorial) -> f64 {
        angle_between(&self.unit_vector(), &other.unit_vector())
    }
}

/// Angle between two vectors in radians, robust to rounding near 0 and π
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let cos_angle = a.dot(b) / (a.norm() * b.norm());
    cos_angle.clamp(-1.0, 1.0).acos()
}

/// Rotation of the reference frame about the X axis by `angle` radians
pub fn rot_x(angle: f64) -> nalgebra::Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    nalgebra::Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c)
}

/// Rotation of the reference frame about the Y axis by `angle` radians
pub fn rot_y(angle: f64) -> nalgebra::Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    nalgebra::Matrix3::new(c, 0.0, -s, 0.0, 1.0, 0.0, s, 0.0, c)
}

/// Rotation of the reference frame about the Z axis by `angle` radians
pub fn rot_z(angle: f64) -> nalgebra::Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    nalgebra::Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}
