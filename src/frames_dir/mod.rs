//! Scoped directory for intermediate frame images
//!
//! Frames are written into a uniquely named directory that is removed when
//! the run finishes, whether it succeeds or fails.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::Result;

/// A temporary directory holding numbered PNG frames
#[derive(Debug)]
pub struct FrameDirectory {
    dir: TempDir,
    frames: Vec<PathBuf>,
}

impl FrameDirectory {
    /// Create `<parent>/<prefix>_XXXXXX`
    pub fn create(parent: &Path, prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{prefix}_"))
            .tempdir_in(parent)?;
        log::debug!("Frame directory {}", dir.path().display());
        Ok(Self {
            dir,
            frames: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for frame `index`, e.g. `frame_007.png`
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.path().join(format!("frame_{index:03}.png"))
    }

    /// Remember a written frame, in animation order
    pub fn record(&mut self, path: PathBuf) {
        self.frames.push(path);
    }

    /// Frames recorded so far
    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    /// Delete every recorded frame, then the directory itself
    ///
    /// Returns the number of frames removed. Dropping a `FrameDirectory`
    /// without calling this still removes the directory, silently.
    pub fn cleanup(self) -> Result<usize> {
        let Self { dir, frames } = self;
        for frame in &frames {
            fs::remove_file(frame)?;
        }
        dir.close()?;
        Ok(frames.len())
    }
}
