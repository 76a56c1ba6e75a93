//! Data module for downloading and managing astronomical data
//!
//! This module provides functionality for downloading, caching, and locating
//! the datasets the renderer needs: the Hipparcos catalog and the DE421
//! planetary ephemeris.

mod downloader;

pub use downloader::{
    download_ephemeris, download_hipparcos, ensure_cache_dir, get_cache_dir, EPHEMERIS_FILE,
    HIPPARCOS_FILE,
};
