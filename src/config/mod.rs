//! Time-lapse configuration
//!
//! Everything a run needs to know, loaded from JSON (missing keys take the
//! defaults below) and overridable from the command line.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::render::ChartStyle;
use crate::schedule::TimeWindow;
use crate::{Result, SkylapseError};

/// Configuration of one time-lapse run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelapseConfig {
    /// Place to geocode, also used in chart titles
    pub location_name: String,
    /// Latitude override in degrees; skips geocoding together with `longitude`
    pub latitude: Option<f64>,
    /// Longitude override in degrees
    pub longitude: Option<f64>,
    /// IANA time zone override, e.g. "Europe/Madrid"
    pub timezone: Option<String>,
    /// Local calendar date of the first frame
    pub start_date: NaiveDate,
    /// Local hour of the first frame
    pub start_hour: u32,
    /// Local hour at which the window ends (exclusive), wrapping past midnight
    pub end_hour: u32,
    /// Minutes between frames
    pub interval_minutes: u32,
    /// Faintest magnitude plotted
    pub limiting_magnitude: f64,
    /// Animation frame rate
    pub fps: u32,
    /// Output animation path
    pub output: PathBuf,
    /// Prefix of the temporary frame directory
    pub frame_dir_prefix: String,
    /// Chart appearance
    pub style: ChartStyle,
}

impl Default for TimelapseConfig {
    fn default() -> Self {
        Self {
            location_name: "Artieda, Zaragoza, Spain".to_string(),
            latitude: None,
            longitude: None,
            timezone: None,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap_or_default(),
            start_hour: 19,
            end_hour: 7,
            interval_minutes: 5,
            limiting_magnitude: 9.0,
            fps: 20,
            output: PathBuf::from("cielo_nocturno_artieda.gif"),
            frame_dir_prefix: "temp_frames".to_string(),
            style: ChartStyle::default(),
        }
    }
}

impl TimelapseConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text).map_err(|e| match e {
            SkylapseError::ConfigError(msg) => {
                SkylapseError::ConfigError(format!("{}: {msg}", path.as_ref().display()))
            }
            other => other,
        })
    }

    /// Parse a configuration from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SkylapseError::ConfigError(e.to_string()))
    }

    /// Check the configuration for values the pipeline cannot honour
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(SkylapseError::ConfigError(msg));

        if self.location_name.trim().is_empty() && self.latitude.is_none() {
            return fail("A location name or coordinates are required".to_string());
        }
        if self.latitude.is_some() != self.longitude.is_some() {
            return fail("Latitude and longitude must be given together".to_string());
        }
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return fail(format!("Latitude {lat} is outside [-90, 90]"));
            }
        }
        if let Some(lon) = self.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return fail(format!("Longitude {lon} is outside [-180, 180]"));
            }
        }
        if self.start_hour >= 24 || self.end_hour >= 24 {
            return fail(format!(
                "Hours must be in 0..24 (start {}, end {})",
                self.start_hour, self.end_hour
            ));
        }
        if self.interval_minutes == 0 {
            return fail("Interval must be at least one minute".to_string());
        }
        if self.window().frame_count() == 0 {
            return fail(format!(
                "Interval of {} minutes is longer than the {}-minute window",
                self.interval_minutes,
                self.window().total_minutes()
            ));
        }
        if self.fps == 0 {
            return fail("Frame rate must be positive".to_string());
        }
        if !self.limiting_magnitude.is_finite() {
            return fail("Limiting magnitude must be a number".to_string());
        }
        if self.frame_dir_prefix.contains(std::path::is_separator) {
            return fail(format!(
                "Frame directory prefix {:?} must not contain a path separator",
                self.frame_dir_prefix
            ));
        }

        self.style.validate()
    }

    /// The observing window described by this configuration
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(
            self.start_date,
            self.start_hour,
            self.end_hour,
            self.interval_minutes,
        )
    }

    /// Display time of a single animation frame
    pub fn frame_duration(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.fps.max(1)))
    }
}
