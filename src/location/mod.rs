//! Observer location and civil time zone
//!
//! Turns a place name into coordinates (Nominatim geocoding), finds the IANA
//! time zone that governs those coordinates (offline polygon lookup), and
//! converts local wall-clock times into UTC instants.

use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};
use once_cell::unsync::OnceCell;
use serde::Deserialize;
use std::time::Duration;

use crate::config::TimelapseConfig;
use crate::earthlib::Wgs84Position;
use crate::{Result, SkylapseError};

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = concat!("skylapse/", env!("CARGO_PKG_VERSION"));

/// Something that can turn a free-form place name into coordinates
pub trait Geocoder {
    /// Latitude and longitude in degrees
    fn geocode(&self, place: &str) -> Result<(f64, f64)>;
}

/// Something that can find the time zone governing a point
pub trait TimezoneResolver {
    fn timezone_at(&self, latitude: f64, longitude: f64) -> Result<Tz>;
}

/// Geocoder backed by the OpenStreetMap Nominatim search API
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    endpoint: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self {
            endpoint: NOMINATIM_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl NominatimGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query a different Nominatim instance
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extract the first hit's coordinates from a Nominatim JSON response
    pub fn parse_response(place: &str, body: &str) -> Result<(f64, f64)> {
        let places: Vec<NominatimPlace> = serde_json::from_str(body).map_err(|e| {
            SkylapseError::ResolutionError(format!("Unexpected geocoder response: {e}"))
        })?;
        let first = places
            .into_iter()
            .next()
            .ok_or_else(|| SkylapseError::ResolutionError(format!("Place not found: {place}")))?;

        let coordinate = |value: &str| {
            value.trim().parse::<f64>().map_err(|_| {
                SkylapseError::ResolutionError(format!("Bad coordinate {value:?} for {place}"))
            })
        };
        let latitude = coordinate(&first.lat)?;
        let longitude = coordinate(&first.lon)?;

        if let Some(name) = &first.display_name {
            log::debug!("Geocoded {place:?} as {name}");
        }
        Ok((latitude, longitude))
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, place: &str) -> Result<(f64, f64)> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()
            .map_err(|e| SkylapseError::ResolutionError(format!("HTTP client: {e}")))?;

        let body = client
            .get(&self.endpoint)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|e| SkylapseError::ResolutionError(format!("Geocoding {place}: {e}")))?;

        Self::parse_response(place, &body)
    }
}

/// Offline time zone lookup using the tzf polygon data
///
/// The polygons are only decoded on the first lookup, so a run with a zone
/// override never pays for them.
pub struct TzfResolver {
    finder: OnceCell<tzf_rs::DefaultFinder>,
}

impl TzfResolver {
    pub fn new() -> Self {
        Self {
            finder: OnceCell::new(),
        }
    }

    fn finder(&self) -> &tzf_rs::DefaultFinder {
        self.finder.get_or_init(|| {
            log::debug!("Loading time zone polygons");
            tzf_rs::DefaultFinder::new()
        })
    }
}

impl Default for TzfResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TimezoneResolver for TzfResolver {
    fn timezone_at(&self, latitude: f64, longitude: f64) -> Result<Tz> {
        let name = self.finder().get_tz_name(longitude, latitude);
        if name.is_empty() {
            return Err(SkylapseError::ResolutionError(format!(
                "No time zone found at ({latitude}, {longitude})"
            )));
        }
        name.parse::<Tz>()
            .map_err(|_| SkylapseError::ResolutionError(format!("Unknown time zone {name:?}")))
    }
}

/// A resolved observing site
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Place name used in chart titles
    pub name: String,
    /// Degrees, north positive
    pub latitude: f64,
    /// Degrees, east positive
    pub longitude: f64,
    pub timezone: Tz,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, timezone: Tz) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            timezone,
        }
    }

    /// Resolve the configured place, using the configured coordinates and
    /// zone where given and the collaborators otherwise
    pub fn resolve(
        config: &TimelapseConfig,
        geocoder: &dyn Geocoder,
        timezones: &dyn TimezoneResolver,
    ) -> Result<Self> {
        let (latitude, longitude) = match (config.latitude, config.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => geocoder.geocode(&config.location_name)?,
        };

        let timezone = match &config.timezone {
            Some(name) => name.parse::<Tz>().map_err(|_| {
                SkylapseError::ResolutionError(format!("Unknown time zone {name:?}"))
            })?,
            None => timezones.timezone_at(latitude, longitude)?,
        };

        log::info!(
            "Location: {} ({:.4}, {:.4}), zone {}",
            config.location_name,
            latitude,
            longitude,
            timezone.name()
        );
        Ok(Self::new(
            config.location_name.clone(),
            latitude,
            longitude,
            timezone,
        ))
    }

    /// The site as a point on the WGS84 ellipsoid
    pub fn observer(&self) -> Result<Wgs84Position> {
        Wgs84Position::new(self.latitude, self.longitude, 0.0)
    }

    /// Convert a local wall-clock time at this site to UTC
    ///
    /// A repeated wall-clock time (clocks falling back) resolves to the
    /// standard-time instance. A skipped one (clocks springing forward) is
    /// read with the offset in force just before the gap.
    pub fn localize(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(first, second) => {
                let chosen = [first, second]
                    .into_iter()
                    .find(|dt| dt.offset().dst_offset().is_zero())
                    .unwrap_or(second);
                log::warn!(
                    "{naive} occurs twice in {}; using {}",
                    self.timezone.name(),
                    chosen.offset()
                );
                chosen.with_timezone(&Utc)
            }
            LocalResult::None => {
                let before = self
                    .timezone
                    .offset_from_utc_datetime(&(naive - TimeDelta::hours(24)))
                    .fix();
                log::warn!(
                    "{naive} does not exist in {}; reading it as UTC{before}",
                    self.timezone.name()
                );
                let utc = naive - TimeDelta::seconds(i64::from(before.local_minus_utc()));
                Utc.from_utc_datetime(&utc)
            }
        }
    }

    /// Convert a UTC instant to local wall-clock time
    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use std::cell::Cell;

    struct CountingGeocoder {
        calls: Cell<usize>,
    }

    impl Geocoder for CountingGeocoder {
        fn geocode(&self, _place: &str) -> Result<(f64, f64)> {
            self.calls.set(self.calls.get() + 1);
            Ok((42.5833, -0.9833))
        }
    }

    struct NoPlaces;

    impl Geocoder for NoPlaces {
        fn geocode(&self, place: &str) -> Result<(f64, f64)> {
            Err(SkylapseError::ResolutionError(format!(
                "Place not found: {place}"
            )))
        }
    }

    struct Madrid;

    impl TimezoneResolver for Madrid {
        fn timezone_at(&self, _latitude: f64, _longitude: f64) -> Result<Tz> {
            Ok(chrono_tz::Europe::Madrid)
        }
    }

    fn madrid() -> Location {
        Location::new("Artieda", 42.5833, -0.9833, chrono_tz::Europe::Madrid)
    }

    fn local(y: i32, m: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[rstest]
    // Winter: CET, UTC+1
    #[case(local(2026, 3, 5, 19, 0), local(2026, 3, 5, 18, 0))]
    #[case(local(2026, 3, 6, 6, 0), local(2026, 3, 6, 5, 0))]
    // Summer: CEST, UTC+2
    #[case(local(2026, 7, 1, 22, 0), local(2026, 7, 1, 20, 0))]
    // Spring-forward gap: read with the pre-gap offset
    #[case(local(2026, 3, 29, 2, 30), local(2026, 3, 29, 1, 30))]
    // Fall-back repeat: the standard-time instance
    #[case(local(2026, 10, 25, 2, 30), local(2026, 10, 25, 1, 30))]
    fn test_localize(#[case] wall: NaiveDateTime, #[case] expected_utc: NaiveDateTime) {
        assert_eq!(madrid().localize(wall).naive_utc(), expected_utc);
    }

    #[test]
    fn test_to_local_round_trip() {
        let loc = madrid();
        let wall = local(2026, 3, 5, 23, 55);
        assert_eq!(loc.to_local(loc.localize(wall)).naive_local(), wall);
    }

    #[test]
    fn test_resolve_uses_collaborators() {
        let geocoder = CountingGeocoder {
            calls: Cell::new(0),
        };
        let config = TimelapseConfig::default();
        let loc = Location::resolve(&config, &geocoder, &Madrid).unwrap();
        assert_eq!(geocoder.calls.get(), 1);
        assert_eq!(loc.timezone, chrono_tz::Europe::Madrid);
        assert_eq!(loc.name, "Artieda, Zaragoza, Spain");
    }

    #[test]
    fn test_resolve_honours_overrides() {
        let config = TimelapseConfig {
            latitude: Some(-33.87),
            longitude: Some(151.21),
            timezone: Some("Australia/Sydney".to_string()),
            ..TimelapseConfig::default()
        };
        // Neither collaborator is consulted
        let loc = Location::resolve(&config, &NoPlaces, &Madrid).unwrap();
        assert_eq!(loc.timezone, chrono_tz::Australia::Sydney);
        assert_eq!(loc.latitude, -33.87);
    }

    #[test]
    fn test_resolve_failures_are_fatal() {
        let config = TimelapseConfig::default();
        assert!(matches!(
            Location::resolve(&config, &NoPlaces, &Madrid),
            Err(SkylapseError::ResolutionError(_))
        ));

        let bad_zone = TimelapseConfig {
            timezone: Some("Mars/Olympus_Mons".to_string()),
            ..TimelapseConfig::default()
        };
        let geocoder = CountingGeocoder {
            calls: Cell::new(0),
        };
        assert!(Location::resolve(&bad_zone, &geocoder, &Madrid).is_err());
    }

    #[test]
    fn test_parse_nominatim_response() {
        let body = r#"[{"place_id":1,"lat":"42.5846","lon":"-0.9791",
                        "display_name":"Artieda, Jacetania, Zaragoza, Aragón, España"}]"#;
        let (lat, lon) = NominatimGeocoder::parse_response("Artieda", body).unwrap();
        assert_eq!(lat, 42.5846);
        assert_eq!(lon, -0.9791);

        assert!(matches!(
            NominatimGeocoder::parse_response("Nowhere", "[]"),
            Err(SkylapseError::ResolutionError(_))
        ));
        assert!(NominatimGeocoder::parse_response("x", "not json").is_err());
    }

    #[test]
    fn test_tzf_resolver() {
        let resolver = TzfResolver::new();
        assert!(resolver.finder.get().is_none());
        assert_eq!(
            resolver.timezone_at(42.5833, -0.9833).unwrap(),
            chrono_tz::Europe::Madrid
        );
        assert_eq!(
            resolver.timezone_at(40.7128, -74.0060).unwrap(),
            chrono_tz::America::New_York
        );
        assert!(resolver.finder.get().is_some());
    }

    #[test]
    fn test_zone_override_never_loads_polygons() {
        let resolver = TzfResolver::new();
        let config = TimelapseConfig {
            latitude: Some(42.5833),
            longitude: Some(-0.9833),
            timezone: Some("Europe/Madrid".to_string()),
            ..TimelapseConfig::default()
        };
        let loc = Location::resolve(&config, &NoPlaces, &resolver).unwrap();
        assert_eq!(loc.timezone, chrono_tz::Europe::Madrid);
        assert!(resolver.finder.get().is_none());
    }

    #[test]
    fn test_geocoder_settings() {
        let geocoder = NominatimGeocoder::new()
            .with_endpoint("http://127.0.0.1:9/search")
            .with_timeout(Duration::from_millis(500));
        assert_eq!(geocoder.endpoint, "http://127.0.0.1:9/search");
        assert_eq!(geocoder.timeout, Duration::from_millis(500));
        assert_eq!(NominatimGeocoder::default().endpoint, NOMINATIM_URL);

        // Nothing listens on the discard port: the lookup fails, it does not hang
        assert!(matches!(
            geocoder.geocode("Artieda"),
            Err(SkylapseError::ResolutionError(_))
        ));
    }
}
