//! Downloader module for retrieving astronomical data
//!
//! This module handles downloading and caching of astronomical data files.

use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Result;
use crate::SkylapseError;

/// Hipparcos main catalog file name
pub const HIPPARCOS_FILE: &str = "hip_main.dat";
/// Planetary ephemeris file name
pub const EPHEMERIS_FILE: &str = "de421.bsp";

const HIPPARCOS_URL: &str = "https://cdsarc.cds.unistra.fr/ftp/cats/I/239/hip_main.dat";
const EPHEMERIS_URL: &str =
    "https://naif.jpl.nasa.gov/pub/naif/generic_kernels/spk/planets/a_old_versions/de421.bsp";

/// Get the cache directory path
pub fn get_cache_dir() -> PathBuf {
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".cache").join("skylapse")
}

/// Ensure that the cache directory exists
pub fn ensure_cache_dir() -> io::Result<PathBuf> {
    let cache_dir = get_cache_dir();
    fs::create_dir_all(&cache_dir)?;
    Ok(cache_dir)
}

/// Check if a file exists and is not empty
fn file_exists_and_not_empty<P: AsRef<Path>>(path: P) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && metadata.len() > 0,
        Err(_) => false,
    }
}

/// Download a file from URL to a local path
fn download_file<P: AsRef<Path>>(url: &str, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .map_err(|e| SkylapseError::DataError(format!("Failed to create HTTP client: {e}")))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| SkylapseError::DataError(format!("Failed to download {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(SkylapseError::DataError(format!(
            "Failed to download {url}, status: {}",
            response.status()
        )));
    }

    // Stream into a temporary file first to avoid partial downloads
    let temp_path = path.with_extension("tmp");
    match write_response(&mut response, &temp_path) {
        Ok(bytes) => {
            fs::rename(&temp_path, path)?;
            log::info!("Downloaded {} bytes to {}", bytes, path.display());
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

fn write_response(response: &mut reqwest::blocking::Response, path: &Path) -> Result<u64> {
    let mut file = BufWriter::new(File::create(path)?);
    let bytes = response
        .copy_to(&mut file)
        .map_err(|e| SkylapseError::DataError(format!("Failed to read response: {e}")))?;
    file.flush()?;
    Ok(bytes)
}

/// Return a cached copy of `file_name` in `cache_dir`, seeding it from the
/// working directory or downloading it from `url` when missing
fn cached_or_download(cache_dir: &Path, file_name: &str, url: &str) -> Result<PathBuf> {
    fs::create_dir_all(cache_dir)?;
    let cached = cache_dir.join(file_name);

    if file_exists_and_not_empty(&cached) {
        log::info!("Using cached {}", cached.display());
        return Ok(cached);
    }

    // A copy in the working directory (CI environments, offline runs)
    let local = PathBuf::from(file_name);
    if file_exists_and_not_empty(&local) {
        fs::copy(&local, &cached)?;
        log::info!("Copied {} into cache {}", local.display(), cached.display());
        return Ok(cached);
    }

    println!("Downloading {url}...");
    download_file(url, &cached).map_err(|e| {
        log::error!("Failed to download {file_name}: {e}");
        e
    })?;
    Ok(cached)
}

/// Locate or download the Hipparcos catalog into `cache_dir`
pub fn download_hipparcos(cache_dir: &Path) -> Result<PathBuf> {
    cached_or_download(cache_dir, HIPPARCOS_FILE, HIPPARCOS_URL)
}

/// Locate or download the DE421 ephemeris into `cache_dir`
pub fn download_ephemeris(cache_dir: &Path) -> Result<PathBuf> {
    cached_or_download(cache_dir, EPHEMERIS_FILE, EPHEMERIS_URL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_dir() {
        let cache_dir = get_cache_dir();
        assert!(cache_dir.ends_with(".cache/skylapse"));
    }

    #[test]
    fn test_cached_file_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let cached = dir.path().join(EPHEMERIS_FILE);
        fs::write(&cached, b"DAF/SPK ").unwrap();

        // No network access needed when the cache is warm
        assert_eq!(download_ephemeris(dir.path()).unwrap(), cached);
    }

    #[test]
    fn test_empty_file_is_not_a_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, b"").unwrap();
        assert!(!file_exists_and_not_empty(&path));
        assert!(!file_exists_and_not_empty(dir.path()));
    }
}
