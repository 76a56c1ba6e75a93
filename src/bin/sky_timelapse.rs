//! Night-sky time-lapse renderer
//!
//! Renders a star chart for every interval of a night at one place and
//! assembles them into a looping GIF.
//!
//! Usage:
//!   cargo run --release --bin sky_timelapse -- --location "Artieda, Zaragoza, Spain"
//!   cargo run --release --bin sky_timelapse -- --config night.json --interval 60

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use skylapse::{Loader, Timelapse, TimelapseConfig};

/// Type alias for the error type used throughout this binary
type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Night-sky time-lapse renderer
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Renders a looping GIF of the night sky turning over a place",
    long_about = None
)]
struct Args {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Place name to geocode
    #[arg(short, long)]
    location: Option<String>,

    /// Latitude in degrees (skips geocoding, needs --lon)
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude in degrees (skips geocoding, needs --lat)
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// IANA time zone, e.g. Europe/Madrid (skips the zone lookup)
    #[arg(short, long)]
    timezone: Option<String>,

    /// Local date of the first frame (YYYY-MM-DD)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Local hour of the first frame
    #[arg(long)]
    start_hour: Option<u32>,

    /// Local hour the night ends, wrapping past midnight
    #[arg(long)]
    end_hour: Option<u32>,

    /// Minutes between frames
    #[arg(short, long)]
    interval: Option<u32>,

    /// Faintest magnitude plotted
    #[arg(short, long, allow_negative_numbers = true)]
    magnitude: Option<f64>,

    /// Animation frame rate
    #[arg(short, long)]
    fps: Option<u32>,

    /// Output GIF path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for the downloaded catalog and ephemeris
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl Args {
    /// Defaults, then the JSON file, then command-line flags
    fn into_config(self) -> Result<(TimelapseConfig, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => TimelapseConfig::from_json_file(path)?,
            None => TimelapseConfig::default(),
        };

        if let Some(location) = self.location {
            config.location_name = location;
        }
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            config.latitude = Some(lat);
            config.longitude = Some(lon);
        }
        if let Some(timezone) = self.timezone {
            config.timezone = Some(timezone);
        }
        if let Some(date) = self.date {
            config.start_date = date;
        }
        if let Some(hour) = self.start_hour {
            config.start_hour = hour;
        }
        if let Some(hour) = self.end_hour {
            config.end_hour = hour;
        }
        if let Some(interval) = self.interval {
            config.interval_minutes = interval;
        }
        if let Some(magnitude) = self.magnitude {
            config.limiting_magnitude = magnitude;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(output) = self.output {
            config.output = output;
        }

        config.validate()?;
        Ok((config, self.data_dir))
    }
}

fn run(args: Args) -> Result<()> {
    let (config, data_dir) = args.into_config()?;

    println!("=== Night sky time-lapse ===");
    println!("Location: {}", config.location_name);
    println!(
        "Window:   {} {:02}:00 -> {:02}:00 every {} min ({} frames)",
        config.start_date,
        config.start_hour,
        config.end_hour,
        config.interval_minutes,
        config.window().frame_count()
    );
    println!("Stars:    magnitude <= {}", config.limiting_magnitude);

    let mut loader = Loader::new();
    if let Some(dir) = data_dir {
        loader = loader.with_data_dir(dir);
    }

    let summary = Timelapse::new(config).with_loader(loader).run()?;
    println!("Done: {}", summary.path.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
