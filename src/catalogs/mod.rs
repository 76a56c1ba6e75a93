//! Star catalogs module
//!
//! This module provides functionality for loading and using star catalogs:
//! the Hipparcos main catalog read from `hip_main.dat`, and seeded synthetic
//! catalogs for offline rendering and tests.

use crate::coordinates::Equatorial;

pub mod hipparcos;
pub mod synthetic;

pub use hipparcos::{HipparcosCatalog, HipparcosEntry};
pub use synthetic::{create_synthetic_catalog, MagnitudeDistribution, SyntheticCatalogConfig};

/// Common star properties that all catalog entries must provide
/// This represents the minimal set of properties required for rendering and calculations
#[derive(Debug, Clone, Copy)]
pub struct StarData {
    /// Star identifier
    pub id: u64,
    /// Catalog position (ICRS, catalog epoch)
    pub position: Equatorial,
    /// Apparent magnitude (lower is brighter)
    pub magnitude: f64,
    /// Optional B-V color index
    pub b_v: Option<f64>,
}

impl StarData {
    /// Create a new minimal star data structure with RA/Dec in degrees
    pub fn new(id: u64, ra_deg: f64, dec_deg: f64, magnitude: f64, b_v: Option<f64>) -> Self {
        Self {
            id,
            position: Equatorial::from_degrees(ra_deg, dec_deg),
            magnitude,
            b_v,
        }
    }

    /// Get right ascension in degrees
    pub fn ra_deg(&self) -> f64 {
        self.position.ra_degrees()
    }

    /// Get declination in degrees
    pub fn dec_deg(&self) -> f64 {
        self.position.dec_degrees()
    }
}

/// Generic trait for all star catalogs
///
/// Catalogs are read-only once loaded; iteration order is the catalog's own
/// row order and stays stable for the catalog's lifetime.
pub trait StarCatalog {
    /// Star entry type for this catalog
    type Star;

    /// Get all stars in the catalog
    fn stars(&self) -> impl Iterator<Item = &Self::Star>;

    /// Get the number of stars in the catalog
    fn len(&self) -> usize;

    /// Check if the catalog is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get stars as a unified StarData format
    fn star_data(&self) -> impl Iterator<Item = StarData> + '_;

    /// Filter stars and return them in the standard format
    fn filter_star_data<F>(&self, predicate: F) -> Vec<StarData>
    where
        F: Fn(&StarData) -> bool,
    {
        self.star_data().filter(|star| predicate(star)).collect()
    }

    /// Get stars brighter than (or as bright as) a specified magnitude
    fn brighter_than(&self, magnitude: f64) -> Vec<StarData> {
        self.filter_star_data(|star| star.magnitude <= magnitude)
    }
}
