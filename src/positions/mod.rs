//! Astrometric positions of catalog stars
//!
//! Each Hipparcos star becomes a barycentric position at the catalog epoch
//! plus a space velocity from its proper motion. Observing a star from a
//! barycentric observer at time `t` propagates it along that velocity
//! (including the light-time offset across the observer's position) and
//! subtracts the observer. No aberration or light deflection is applied.

use nalgebra::Vector3;
use ndarray::{Array1, Array2, Axis};

use crate::catalogs::{HipparcosCatalog, HipparcosEntry, StarCatalog};
use crate::constants::{C_AUDAY, JULIAN_YEAR, MAS2RAD};
use crate::time::Time;

/// Stand-in parallax for stars without a positive measurement
const MIN_PARALLAX_MAS: f64 = 1.0e-6;

/// A star with space motion, positioned in the BCRS
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    /// Barycentric position at the epoch, AU
    pub position: Vector3<f64>,
    /// Space velocity, AU/day
    pub velocity: Vector3<f64>,
    /// Epoch of the position as a TDB Julian date
    pub epoch: f64,
}

impl Star {
    /// Build a star from catalog astrometry
    ///
    /// `pm_ra_mas` is the proper motion in RA already multiplied by cos(dec).
    pub fn new(
        ra_deg: f64,
        dec_deg: f64,
        pm_ra_mas: f64,
        pm_dec_mas: f64,
        parallax_mas: f64,
        epoch: f64,
    ) -> Self {
        let parallax = if parallax_mas > 0.0 {
            parallax_mas
        } else {
            MIN_PARALLAX_MAS
        };
        let distance = 1.0 / (parallax * MAS2RAD).sin();

        let (sin_ra, cos_ra) = ra_deg.to_radians().sin_cos();
        let (sin_dec, cos_dec) = dec_deg.to_radians().sin_cos();

        let position = Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec) * distance;

        let pmr = pm_ra_mas / (parallax * JULIAN_YEAR);
        let pmd = pm_dec_mas / (parallax * JULIAN_YEAR);
        let velocity = Vector3::new(
            -pmr * sin_ra - pmd * sin_dec * cos_ra,
            pmr * cos_ra - pmd * sin_dec * sin_ra,
            pmd * cos_dec,
        );

        Self {
            position,
            velocity,
            epoch,
        }
    }

    /// Build a star from a Hipparcos entry; missing motions count as zero
    pub fn from_entry(entry: &HipparcosEntry, epoch: f64) -> Self {
        Self::new(
            entry.ra,
            entry.dec,
            entry.pm_ra.unwrap_or(0.0),
            entry.pm_dec.unwrap_or(0.0),
            entry.parallax.unwrap_or(0.0),
            epoch,
        )
    }

    /// Astrometric position (AU) as seen from a barycentric observer
    pub fn observe_from(&self, observer: &Vector3<f64>, t: &Time) -> Vector3<f64> {
        let light_time = light_time_difference(&self.position, observer);
        let position = self.position + self.velocity * (t.tdb() + light_time - self.epoch);
        position - observer
    }
}

/// Light travel time (days) across the projection of the observer's
/// offset onto the star direction
pub fn light_time_difference(position: &Vector3<f64>, observer: &Vector3<f64>) -> f64 {
    position.normalize().dot(observer) / C_AUDAY
}

/// A whole catalog prepared for repeated observation
///
/// Rows follow the catalog's order. Built once per run and shared by every
/// frame.
#[derive(Debug, Clone)]
pub struct StarField {
    positions: Array2<f64>,
    velocities: Array2<f64>,
    magnitudes: Array1<f64>,
    epoch: f64,
}

impl StarField {
    pub fn from_catalog(catalog: &HipparcosCatalog) -> Self {
        let n = catalog.len();
        let epoch = catalog.epoch();
        let mut positions = Array2::zeros((n, 3));
        let mut velocities = Array2::zeros((n, 3));
        let mut magnitudes = Array1::zeros(n);

        for (i, entry) in catalog.stars().enumerate() {
            let star = Star::from_entry(entry, epoch);
            for k in 0..3 {
                positions[[i, k]] = star.position[k];
                velocities[[i, k]] = star.velocity[k];
            }
            magnitudes[i] = entry.mag;
        }

        Self {
            positions,
            velocities,
            magnitudes,
            epoch,
        }
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Magnitudes in catalog order
    pub fn magnitudes(&self) -> &Array1<f64> {
        &self.magnitudes
    }

    /// Astrometric positions (AU), one row per star, as seen from a
    /// barycentric observer at `t`
    pub fn observe(&self, observer: &Vector3<f64>, t: &Time) -> Array2<f64> {
        let mut out = Array2::zeros((self.len(), 3));
        let tdb = t.tdb();

        for (i, (p, v)) in self
            .positions
            .axis_iter(Axis(0))
            .zip(self.velocities.axis_iter(Axis(0)))
            .enumerate()
        {
            let position = Vector3::new(p[0], p[1], p[2]);
            let dt = tdb + light_time_difference(&position, observer) - self.epoch;
            for k in 0..3 {
                out[[i, k]] = p[k] + v[k] * dt - observer[k];
            }
        }

        out
    }
}

/// Observe every star of a catalog from a barycentric observer
pub fn observe_catalog(
    catalog: &HipparcosCatalog,
    observer: &Vector3<f64>,
    t: &Time,
) -> Array2<f64> {
    StarField::from_catalog(catalog).observe(observer, t)
}
