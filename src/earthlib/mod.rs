//! Earth orientation and observer positions
//!
//! Places a geodetic observer (WGS84) in the celestial frame: ITRS
//! coordinates from latitude/longitude/elevation, rotated by Greenwich mean
//! sidereal time into the mean equator and equinox of date, then precessed
//! back to the J2000/ICRS axes. Nutation and polar motion are neglected;
//! both are far below what a star chart can show.

use nalgebra::{Matrix3, Vector3};

use crate::constants::{AU_M, ASEC2RAD, WGS84_INVERSE_FLATTENING, WGS84_RADIUS_M};
use crate::coordinates::{rot_y, rot_z, Equatorial};
use crate::planetlib::EarthPosition;
use crate::time::Time;
use crate::{Result, SkylapseError};

/// IAU 1976 precession matrix from J2000 to the mean equator of date
///
/// `P = R3(-z) R2(theta) R3(-zeta)`, so that `v_date = P v_j2000`.
pub fn precession_matrix(t: &Time) -> Matrix3<f64> {
    let t = t.tt_centuries();
    let zeta = t * (2306.2181 + t * (0.30188 + t * 0.017998)) * ASEC2RAD;
    let z = t * (2306.2181 + t * (1.09468 + t * 0.018203)) * ASEC2RAD;
    let theta = t * (2004.3109 + t * (-0.42665 + t * -0.041833)) * ASEC2RAD;

    rot_z(-z) * rot_y(theta) * rot_z(-zeta)
}

/// Rotation from the terrestrial frame into J2000 axes at time `t`
pub fn terrestrial_to_celestial(t: &Time) -> Matrix3<f64> {
    precession_matrix(t).transpose() * rot_z(-t.gmst())
}

/// An observer on the WGS84 ellipsoid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wgs84Position {
    /// Geodetic latitude in degrees, north positive
    pub latitude: f64,
    /// Longitude in degrees, east positive
    pub longitude: f64,
    /// Height above the ellipsoid in metres
    pub elevation_m: f64,
}

impl Wgs84Position {
    pub fn new(latitude: f64, longitude: f64, elevation_m: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !latitude.is_finite() {
            return Err(SkylapseError::ConfigError(format!(
                "Latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !(-180.0..=360.0).contains(&longitude) || !longitude.is_finite() {
            return Err(SkylapseError::ConfigError(format!(
                "Longitude {longitude} is outside [-180, 360]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
            elevation_m,
        })
    }

    /// Earth-fixed (ITRS) position in AU
    pub fn itrs_position(&self) -> Vector3<f64> {
        let f = 1.0 / WGS84_INVERSE_FLATTENING;
        let e2 = f * (2.0 - f);
        let (sin_lat, cos_lat) = self.latitude.to_radians().sin_cos();
        let (sin_lon, cos_lon) = self.longitude.to_radians().sin_cos();

        let n = WGS84_RADIUS_M / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let xy = (n + self.elevation_m) * cos_lat;
        Vector3::new(
            xy * cos_lon,
            xy * sin_lon,
            (n * (1.0 - e2) + self.elevation_m) * sin_lat,
        ) / AU_M
    }

    /// Geocentric position in J2000/ICRS axes, AU
    pub fn gcrs_position(&self, t: &Time) -> Vector3<f64> {
        terrestrial_to_celestial(t) * self.itrs_position()
    }

    /// Barycentric position of the observer, AU
    pub fn barycentric(&self, earth: &impl EarthPosition, t: &Time) -> Result<Vector3<f64>> {
        Ok(earth.earth_barycentric(t)? + self.gcrs_position(t))
    }

    /// RA/Dec of the point directly overhead, taken along the geocentric
    /// position vector of the observer
    pub fn zenith_radec(&self, t: &Time) -> Equatorial {
        Equatorial::from_vector(&self.gcrs_position(t))
    }
}
