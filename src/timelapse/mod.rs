//! The time-lapse pipeline
//!
//! configure, load data, resolve the site, render every frame, encode the
//! animation, clean up.

use std::path::Path;

use crate::animation::{AnimationEncoder, AnimationSummary};
use crate::catalogs::HipparcosCatalog;
use crate::config::TimelapseConfig;
use crate::frame::FrameGenerator;
use crate::frames_dir::FrameDirectory;
use crate::location::{Geocoder, Location, NominatimGeocoder, TimezoneResolver, TzfResolver};
use crate::planetlib::EarthPosition;
use crate::positions::StarField;
use crate::render::ChartRenderer;
use crate::{Loader, Result, SkylapseError};

/// One configured time-lapse run
pub struct Timelapse {
    config: TimelapseConfig,
    loader: Loader,
    geocoder: Box<dyn Geocoder>,
    timezones: Box<dyn TimezoneResolver>,
}

impl Timelapse {
    /// A run with the network geocoder, offline zone lookup and default
    /// data cache
    pub fn new(config: TimelapseConfig) -> Self {
        Self {
            config,
            loader: Loader::new(),
            geocoder: Box::new(NominatimGeocoder::new()),
            timezones: Box::new(TzfResolver::new()),
        }
    }

    pub fn with_loader(mut self, loader: Loader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_geocoder(mut self, geocoder: impl Geocoder + 'static) -> Self {
        self.geocoder = Box::new(geocoder);
        self
    }

    pub fn with_timezone_resolver(mut self, timezones: impl TimezoneResolver + 'static) -> Self {
        self.timezones = Box::new(timezones);
        self
    }

    pub fn config(&self) -> &TimelapseConfig {
        &self.config
    }

    /// Run the whole pipeline: load the ephemeris and catalog, then render
    /// and encode
    pub fn run(&self) -> Result<AnimationSummary> {
        self.config.validate()?;

        println!("Loading ephemeris and star catalog...");
        let ephemeris = self.loader.load_ephemeris()?;
        let catalog = self
            .loader
            .load_hipparcos_catalog(self.config.limiting_magnitude)?;
        println!(
            "{} stars down to magnitude {}",
            catalog.entries().len(),
            self.config.limiting_magnitude
        );

        self.render_frames(&catalog, &ephemeris)
    }

    /// Render and encode the animation for an already loaded catalog
    ///
    /// The frame directory is removed whatever the outcome.
    pub fn render_frames<E: EarthPosition>(
        &self,
        catalog: &HipparcosCatalog,
        earth: &E,
    ) -> Result<AnimationSummary> {
        self.config.validate()?;
        let encoder = AnimationEncoder::new(self.config.fps)?;
        let renderer = ChartRenderer::new(self.config.style.clone())?;

        let location = Location::resolve(
            &self.config,
            self.geocoder.as_ref(),
            self.timezones.as_ref(),
        )?;
        let instants = self.config.window().instants(&location);
        println!(
            "Rendering {} frames for {} ({:.4}, {:.4}, {})",
            instants.len(),
            location.name,
            location.latitude,
            location.longitude,
            location.timezone.name()
        );

        let stars = StarField::from_catalog(catalog);
        let generator = FrameGenerator::new(
            &stars,
            earth,
            location.observer()?,
            renderer,
            location.name.clone(),
            self.config.limiting_magnitude,
        );

        let mut frames = FrameDirectory::create(
            output_parent(&self.config.output),
            &self.config.frame_dir_prefix,
        )?;
        generator.render_all(&instants, &mut frames)?;

        if frames.frames().len() != instants.len() {
            return Err(SkylapseError::EncodingError(format!(
                "Rendered {} frames for {} instants",
                frames.frames().len(),
                instants.len()
            )));
        }

        println!("Encoding animation...");
        let summary = encoder.encode(frames.frames(), &self.config.output)?;
        println!("Animation written:\n{summary}");

        let removed = frames.cleanup()?;
        println!("Removed {removed} temporary frames");
        Ok(summary)
    }
}

/// Directory the output file lands in; frames are rendered next to it
fn output_parent(output: &Path) -> &Path {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct Unreachable;

    impl Geocoder for Unreachable {
        fn geocode(&self, place: &str) -> Result<(f64, f64)> {
            Err(SkylapseError::ResolutionError(format!("offline: {place}")))
        }
    }

    #[test]
    fn test_output_parent() {
        assert_eq!(output_parent(Path::new("sky.gif")), Path::new("."));
        assert_eq!(output_parent(Path::new("out/sky.gif")), Path::new("out"));
        assert_eq!(output_parent(Path::new("/tmp/a/sky.gif")), Path::new("/tmp/a"));
    }

    #[test]
    fn test_unresolved_place_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = TimelapseConfig {
            output: dir.path().join("sky.gif"),
            ..TimelapseConfig::default()
        };
        let timelapse = Timelapse::new(config).with_geocoder(Unreachable);
        let earth = crate::planetlib::FixedEarth(nalgebra::Vector3::new(1.0, 0.0, 0.0));
        let result = timelapse.render_frames(&HipparcosCatalog::create_synthetic(), &earth);

        assert!(matches!(result, Err(SkylapseError::ResolutionError(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_config_stops_before_work() {
        let timelapse = Timelapse::new(TimelapseConfig {
            interval_minutes: 0,
            output: PathBuf::from("never.gif"),
            ..TimelapseConfig::default()
        });
        assert!(matches!(timelapse.run(), Err(SkylapseError::ConfigError(_))));
        assert!(!Path::new("never.gif").exists());
    }
}
