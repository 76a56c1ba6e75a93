//! Stereographic projection of the sky onto the chart plane
//!
//! The projection is centred on a direction (the zenith for an all-sky
//! chart). The centre maps to the origin and the great circle 90 degrees away
//! (the horizon) maps to the unit circle. Axes follow the view of an
//! observer looking up: north at +y and east at -x.

use nalgebra::Vector3;
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Radius in the chart plane of the circle of points `angle` radians from
/// the centre
pub fn radius_for_distance(angle: f64) -> f64 {
    (angle / 2.0).tan()
}

/// Radius of the circle of constant altitude (degrees) on a zenith-centred
/// chart
pub fn altitude_radius(altitude_deg: f64) -> f64 {
    radius_for_distance((90.0 - altitude_deg).to_radians())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereographicProjection {
    center: Vector3<f64>,
    east: Vector3<f64>,
    north: Vector3<f64>,
}

impl StereographicProjection {
    /// Build a projection centred on the direction of `center`
    ///
    /// North is the direction of the celestial pole as seen from the centre.
    /// At the poles themselves, where that is undefined, the orientation
    /// reached by approaching along RA 0 is used.
    pub fn centered_on(center: &Vector3<f64>) -> Self {
        let c = center.normalize();
        let horizontal = (c.x * c.x + c.y * c.y).sqrt();

        let north = if horizontal > 1e-12 {
            Vector3::new(-c.z * c.x / horizontal, -c.z * c.y / horizontal, horizontal)
        } else {
            Vector3::new(-c.z.signum(), 0.0, 0.0)
        };
        let east = north.cross(&c);

        Self {
            center: c,
            east,
            north,
        }
    }

    pub fn center(&self) -> &Vector3<f64> {
        &self.center
    }

    /// Project a single direction (need not be normalised)
    pub fn project(&self, direction: &Vector3<f64>) -> (f64, f64) {
        let u = direction.normalize();
        let denominator = 1.0 + u.dot(&self.center);
        (
            -u.dot(&self.east) / denominator,
            u.dot(&self.north) / denominator,
        )
    }

    /// Project many directions at once, one per row
    ///
    /// Returns the x and y columns in row order.
    pub fn project_rows(&self, directions: ArrayView2<f64>) -> (Array1<f64>, Array1<f64>) {
        let n = directions.len_of(Axis(0));
        let mut x = Array1::zeros(n);
        let mut y = Array1::zeros(n);

        for (i, row) in directions.axis_iter(Axis(0)).enumerate() {
            let (px, py) = self.project(&Vector3::new(row[0], row[1], row[2]));
            x[i] = px;
            y[i] = py;
        }

        (x, y)
    }

    /// Project an owned array of directions
    pub fn project_array(&self, directions: &Array2<f64>) -> (Array1<f64>, Array1<f64>) {
        self.project_rows(directions.view())
    }
}
