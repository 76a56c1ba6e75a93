//! Synthetic star catalog generator with realistic stellar distributions
//!
//! Generates seeded, reproducible all-sky catalogs in the Hipparcos entry
//! format so that the full rendering pipeline can run without downloading
//! the real catalog.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f64::consts::PI;

use super::{HipparcosCatalog, HipparcosEntry};

/// Statistical star magnitude distribution parameters
#[derive(Debug, Clone, Copy)]
pub struct MagnitudeDistribution {
    /// Minimum star magnitude (brightest stars)
    pub min_magnitude: f64,
    /// Maximum star magnitude (dimmest stars)
    pub max_magnitude: f64,
    /// Growth factor of star counts per magnitude (~2.5 for the real sky)
    pub log_base: f64,
}

impl Default for MagnitudeDistribution {
    fn default() -> Self {
        Self {
            min_magnitude: -1.0,
            max_magnitude: 9.0,
            log_base: 2.5,
        }
    }
}

/// Configuration for synthetic star catalog generation
#[derive(Debug, Clone)]
pub struct SyntheticCatalogConfig {
    /// Number of stars to generate
    pub count: usize,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Magnitude distribution parameters
    pub magnitude_dist: MagnitudeDistribution,
    /// Give each star a random parallax and proper motion
    pub with_motion: bool,
}

impl Default for SyntheticCatalogConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            seed: 42,
            magnitude_dist: MagnitudeDistribution::default(),
            with_motion: true,
        }
    }
}

impl SyntheticCatalogConfig {
    /// Create a new synthetic catalog configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of stars to generate
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Set the random seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the magnitude distribution parameters
    pub fn with_magnitude_range(mut self, min: f64, max: f64) -> Self {
        self.magnitude_dist.min_magnitude = min;
        self.magnitude_dist.max_magnitude = max;
        self
    }

    /// Generate stars fixed on the sky (no parallax, no proper motion)
    pub fn without_motion(mut self) -> Self {
        self.with_motion = false;
        self
    }

    /// Generate the catalog
    pub fn generate(&self) -> HipparcosCatalog {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let unit = Uniform::from(0.0..1.0);
        let signed = Uniform::from(-1.0..1.0);

        let stars = (1..=self.count)
            .map(|hip| {
                // Uniform over the sphere: z uniform in [-1, 1]
                let z: f64 = signed.sample(&mut rng);
                let phi: f64 = unit.sample(&mut rng) * 2.0 * PI;
                let mag = self.sample_magnitude(unit.sample(&mut rng));

                let (parallax, pm_ra, pm_dec) = if self.with_motion {
                    (
                        Some(0.5 + unit.sample(&mut rng) * 50.0),
                        Some(signed.sample(&mut rng) * 100.0),
                        Some(signed.sample(&mut rng) * 100.0),
                    )
                } else {
                    (None, None, None)
                };

                HipparcosEntry {
                    hip,
                    ra: phi.to_degrees(),
                    dec: z.asin().to_degrees(),
                    mag,
                    b_v: Some(signed.sample(&mut rng) * 0.8 + 0.5),
                    pm_ra,
                    pm_dec,
                    parallax,
                }
            })
            .collect();

        HipparcosCatalog::from_entries(stars)
    }

    /// Map a uniform sample onto the magnitude range so that counts grow by
    /// `log_base` per magnitude
    fn sample_magnitude(&self, u: f64) -> f64 {
        let MagnitudeDistribution {
            min_magnitude,
            max_magnitude,
            log_base,
        } = self.magnitude_dist;
        let range = max_magnitude - min_magnitude;
        let t = u * (log_base.powf(range) - 1.0) + 1.0;
        min_magnitude + t.log(log_base).clamp(0.0, range)
    }
}

/// Convenience function to create a synthetic all-sky catalog
pub fn create_synthetic_catalog(
    count: usize,
    min_magnitude: f64,
    max_magnitude: f64,
    seed: u64,
) -> HipparcosCatalog {
    SyntheticCatalogConfig::new()
        .with_count(count)
        .with_magnitude_range(min_magnitude, max_magnitude)
        .with_seed(seed)
        .generate()
}
