//! End-to-end runs against a synthetic catalog and a pinned Earth, with no
//! network or kernel access.

use std::cell::Cell;
use std::fs::{self, File};
use std::path::Path;

use chrono::NaiveDate;
use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use nalgebra::Vector3;
use skylapse::catalogs::{create_synthetic_catalog, HipparcosCatalog};
use skylapse::location::{Geocoder, TimezoneResolver};
use skylapse::planetlib::{EarthPosition, FixedEarth};
use skylapse::render::ChartStyle;
use skylapse::{SkylapseError, Time, Timelapse, TimelapseConfig};

struct Artieda;

impl Geocoder for Artieda {
    fn geocode(&self, _place: &str) -> skylapse::Result<(f64, f64)> {
        Ok((42.5833, -0.9833))
    }
}

struct Madrid;

impl TimezoneResolver for Madrid {
    fn timezone_at(&self, _latitude: f64, _longitude: f64) -> skylapse::Result<chrono_tz::Tz> {
        Ok(chrono_tz::Europe::Madrid)
    }
}

/// An ephemeris that gives out after a few queries
struct FlakyEarth {
    remaining: Cell<usize>,
}

impl EarthPosition for FlakyEarth {
    fn earth_barycentric(&self, _t: &Time) -> skylapse::Result<Vector3<f64>> {
        match self.remaining.get() {
            0 => Err(SkylapseError::DataError("ephemeris went away".to_string())),
            n => {
                self.remaining.set(n - 1);
                Ok(Vector3::new(-0.98, 0.17, 0.07))
            }
        }
    }
}

fn earth() -> FixedEarth {
    FixedEarth(Vector3::new(-0.98, 0.17, 0.07))
}

fn config(dir: &Path) -> TimelapseConfig {
    TimelapseConfig {
        interval_minutes: 60,
        fps: 10,
        output: dir.join("night.gif"),
        style: ChartStyle {
            chart_size: 2.0,
            dpi: 80,
            show_labels: false,
            ..ChartStyle::default()
        },
        ..TimelapseConfig::default()
    }
}

fn timelapse(config: TimelapseConfig) -> Timelapse {
    Timelapse::new(config)
        .with_geocoder(Artieda)
        .with_timezone_resolver(Madrid)
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_hourly_night_makes_twelve_frame_gif() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = create_synthetic_catalog(500, -1.0, 7.0, 7);

    let summary = timelapse(config(dir.path()))
        .render_frames(&catalog, &earth())
        .unwrap();

    assert_eq!(summary.frames, 12);
    assert_eq!(summary.fps, 10);
    assert_eq!(summary.duration, std::time::Duration::from_millis(1200));
    assert_eq!(summary.bytes, fs::metadata(dir.path().join("night.gif")).unwrap().len());

    // Only the animation is left behind
    assert_eq!(entries(dir.path()), vec!["night.gif".to_string()]);

    let frames = GifDecoder::new(File::open(&summary.path).unwrap())
        .unwrap()
        .into_frames()
        .collect_frames()
        .unwrap();
    assert_eq!(frames.len(), 12);
    let (w, h) = frames[0].buffer().dimensions();
    assert_eq!((w, h), (160, 160 + (160.0f64 * 0.12).round() as u32));
}

#[test]
fn test_coordinate_and_zone_overrides_skip_collaborators() {
    struct Refuse;
    impl Geocoder for Refuse {
        fn geocode(&self, place: &str) -> skylapse::Result<(f64, f64)> {
            panic!("geocoded {place}")
        }
    }
    impl TimezoneResolver for Refuse {
        fn timezone_at(&self, _: f64, _: f64) -> skylapse::Result<chrono_tz::Tz> {
            panic!("looked up a zone")
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let config = TimelapseConfig {
        location_name: "Mauna Kea".to_string(),
        latitude: Some(19.82),
        longitude: Some(-155.47),
        timezone: Some("Pacific/Honolulu".to_string()),
        start_date: NaiveDate::from_ymd_opt(2026, 8, 12).unwrap(),
        start_hour: 22,
        end_hour: 1,
        ..config(dir.path())
    };

    let summary = Timelapse::new(config)
        .with_geocoder(Refuse)
        .with_timezone_resolver(Refuse)
        .render_frames(&HipparcosCatalog::create_synthetic(), &earth())
        .unwrap();
    assert_eq!(summary.frames, 3);
}

#[test]
fn test_failure_mid_run_leaves_no_frames() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = create_synthetic_catalog(200, -1.0, 6.0, 3);
    let flaky = FlakyEarth {
        remaining: Cell::new(4),
    };

    let result = timelapse(config(dir.path())).render_frames(&catalog, &flaky);

    assert!(matches!(result, Err(SkylapseError::DataError(_))));
    assert!(entries(dir.path()).is_empty());
}

#[test]
fn test_unknown_zone_override_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = TimelapseConfig {
        timezone: Some("Mars/Olympus_Mons".to_string()),
        ..config(dir.path())
    };
    let result = timelapse(config).render_frames(&HipparcosCatalog::create_synthetic(), &earth());
    assert!(matches!(result, Err(SkylapseError::ResolutionError(_))));
    assert!(entries(dir.path()).is_empty());
}
