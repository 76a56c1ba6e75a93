//! Skylapse: night-sky time-lapse animations from a star catalog
//!
//! This crate geocodes a place, works out its time zone, computes where the
//! Hipparcos stars sit overhead for a sequence of instants (using a JPL
//! ephemeris for the Earth's position), projects the visible hemisphere onto
//! a disk and renders one star chart per instant, finally assembling the
//! charts into a looping GIF.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod animation;
pub mod catalogs;
pub mod config;
pub mod constants;
pub mod coordinates;
pub mod data;
pub mod earthlib;
pub mod frame;
pub mod frames_dir;
pub mod jplephem;
pub mod location;
pub mod planetlib;
pub mod positions;
pub mod projection;
pub mod render;
pub mod schedule;
pub mod time;
pub mod timelapse;

// Re-export commonly used types
pub use config::TimelapseConfig;
pub use coordinates::Equatorial;
pub use time::{Time, Timescale};
pub use timelapse::Timelapse;

/// Main error type for the skylapse library
#[derive(Debug, Error)]
pub enum SkylapseError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Resolution error: {0}")]
    ResolutionError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Time error: {0}")]
    TimeError(#[from] time::TimeError),

    #[error("Ephemeris error: {0}")]
    EphemerisError(#[from] jplephem::JplephemError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),
}

/// Result type for skylapse operations
pub type Result<T> = std::result::Result<T, SkylapseError>;

/// Entry point for loading the star catalog and ephemeris, downloading and
/// caching them on first use
#[derive(Debug, Clone, Default)]
pub struct Loader {
    data_dir: Option<PathBuf>,
}

impl Loader {
    /// Create a new loader with default data directory
    pub fn new() -> Self {
        Self { data_dir: None }
    }

    /// Set a custom data directory
    pub fn with_data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Directory holding cached downloads
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(data::get_cache_dir)
    }

    /// Load the Hipparcos star catalog with a specified magnitude limit
    pub fn load_hipparcos_catalog(
        &self,
        magnitude_limit: f64,
    ) -> Result<catalogs::HipparcosCatalog> {
        let dat_path = data::download_hipparcos(&self.data_dir())?;
        catalogs::HipparcosCatalog::from_dat_file(dat_path, magnitude_limit)
    }

    /// Load the DE421 planetary ephemeris
    pub fn load_ephemeris(&self) -> Result<planetlib::Ephemeris> {
        let bsp_path = data::download_ephemeris(&self.data_dir())?;
        planetlib::Ephemeris::open(bsp_path)
    }

    /// Load a timescale for time conversions
    pub fn timescale(&self) -> Timescale {
        Timescale::default()
    }
}
