//! Time module for astronomical time calculations
//!
//! Converts civil UTC instants into the Julian dates the astrometry needs:
//! TT (leap seconds plus the fixed TT-TAI offset), UT1 for Earth rotation and
//! TDB for ephemeris lookups. Dates are carried as a whole day plus a
//! fraction to keep sub-millisecond precision at modern epochs.

use crate::constants::{DAY_S, J2000, JULIAN_CENTURY, TAU, TT_MINUS_TAI_S, UNIX_EPOCH_JD};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use thiserror::Error;

/// Error type for time operations
#[derive(Debug, Error)]
pub enum TimeError {
    #[error("Time out of range: {0}")]
    OutOfRange(String),

    #[error("Calendar error: {0}")]
    CalendarError(String),
}

/// Result type for time operations
pub type Result<T> = std::result::Result<T, TimeError>;

/// TAI-UTC offsets as (UTC Julian date the offset takes effect, seconds)
const LEAP_SECONDS: [(f64, f64); 28] = [
    (2441317.5, 10.0), // 1972-01-01
    (2441499.5, 11.0), // 1972-07-01
    (2441683.5, 12.0), // 1973-01-01
    (2442048.5, 13.0), // 1974-01-01
    (2442413.5, 14.0), // 1975-01-01
    (2442778.5, 15.0), // 1976-01-01
    (2443144.5, 16.0), // 1977-01-01
    (2443509.5, 17.0), // 1978-01-01
    (2443874.5, 18.0), // 1979-01-01
    (2444239.5, 19.0), // 1980-01-01
    (2444786.5, 20.0), // 1981-07-01
    (2445151.5, 21.0), // 1982-07-01
    (2445516.5, 22.0), // 1983-07-01
    (2446247.5, 23.0), // 1985-07-01
    (2447161.5, 24.0), // 1988-01-01
    (2447892.5, 25.0), // 1990-01-01
    (2448257.5, 26.0), // 1991-01-01
    (2448804.5, 27.0), // 1992-07-01
    (2449169.5, 28.0), // 1993-07-01
    (2449534.5, 29.0), // 1994-07-01
    (2450083.5, 30.0), // 1996-01-01
    (2450630.5, 31.0), // 1997-07-01
    (2451179.5, 32.0), // 1999-01-01
    (2453736.5, 33.0), // 2006-01-01
    (2454832.5, 34.0), // 2009-01-01
    (2456109.5, 35.0), // 2012-07-01
    (2457204.5, 36.0), // 2015-07-01
    (2457754.5, 37.0), // 2017-01-01
];

/// Represents a time scale for astronomical calculations
///
/// Holds the leap second table used for UTC -> TAI conversion. UT1 is taken
/// equal to UTC: |UT1 - UTC| stays below 0.9 s, far under a chart pixel.
#[derive(Debug, Clone)]
pub struct Timescale {
    leap_dates: Vec<f64>,
    leap_offsets: Vec<f64>,
}

impl Default for Timescale {
    fn default() -> Self {
        let (leap_dates, leap_offsets) = LEAP_SECONDS.iter().copied().unzip();
        Self {
            leap_dates,
            leap_offsets,
        }
    }
}

impl Timescale {
    /// Create a timescale from an explicit leap second table
    pub fn new(leap_dates: Vec<f64>, leap_offsets: Vec<f64>) -> Self {
        Self {
            leap_dates,
            leap_offsets,
        }
    }

    /// TAI - UTC in seconds at the given UTC Julian date
    pub fn leap_seconds(&self, utc_jd: f64) -> f64 {
        match self
            .leap_dates
            .partition_point(|&date| date <= utc_jd)
            .checked_sub(1)
        {
            Some(index) => self.leap_offsets[index],
            // Before 1972 the table does not apply; use the first offset
            None => self.leap_offsets.first().copied().unwrap_or(0.0),
        }
    }

    /// Create a time from a UTC datetime
    pub fn from_datetime(&self, dt: DateTime<Utc>) -> Time {
        let seconds = dt.timestamp();
        let days = seconds.div_euclid(86_400);
        let second_of_day =
            seconds.rem_euclid(86_400) as f64 + dt.timestamp_subsec_nanos() as f64 * 1e-9;

        let whole = UNIX_EPOCH_JD + days as f64;
        let utc_fraction = second_of_day / DAY_S;

        let leap = self.leap_seconds(whole + utc_fraction);
        let tt_fraction = utc_fraction + (leap + TT_MINUS_TAI_S) / DAY_S;

        Time {
            whole,
            utc_fraction,
            tt_fraction,
            ut1_fraction: utc_fraction,
            tdb_fraction: tt_fraction + tdb_minus_tt(whole + tt_fraction) / DAY_S,
        }
    }

    /// Create a time from UTC calendar fields
    pub fn utc(
        &self,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Result<Time> {
        let dt = Utc
            .with_ymd_and_hms(year, month, day, hour, minute, second)
            .single()
            .ok_or_else(|| {
                TimeError::CalendarError(format!(
                    "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02} is not a valid UTC time"
                ))
            })?;
        Ok(self.from_datetime(dt))
    }

    /// Create a time from a TT Julian date (UT1 and UTC are derived with the
    /// current leap second offset)
    pub fn tt_jd(&self, jd: f64) -> Time {
        let whole = jd.floor();
        let tt_fraction = jd - whole;
        let leap = self.leap_seconds(jd);
        let utc_fraction = tt_fraction - (leap + TT_MINUS_TAI_S) / DAY_S;
        Time {
            whole,
            utc_fraction,
            tt_fraction,
            ut1_fraction: utc_fraction,
            tdb_fraction: tt_fraction + tdb_minus_tt(jd) / DAY_S,
        }
    }
}

/// TDB - TT in seconds (periodic terms from the Earth's orbital eccentricity)
fn tdb_minus_tt(jd_tt: f64) -> f64 {
    let g = (357.53 + 0.985_600_28 * (jd_tt - J2000)).to_radians();
    0.001_657 * g.sin() + 0.000_014 * (2.0 * g).sin()
}

/// An instant carried simultaneously in the UTC, TT, UT1 and TDB scales
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Time {
    whole: f64,
    utc_fraction: f64,
    tt_fraction: f64,
    ut1_fraction: f64,
    tdb_fraction: f64,
}

impl Time {
    /// UTC as a Julian date
    pub fn utc_jd(&self) -> f64 {
        self.whole + self.utc_fraction
    }

    /// Terrestrial Time as a Julian date
    pub fn tt(&self) -> f64 {
        self.whole + self.tt_fraction
    }

    /// Universal Time (UT1) as a Julian date
    pub fn ut1(&self) -> f64 {
        self.whole + self.ut1_fraction
    }

    /// Barycentric Dynamical Time as a Julian date
    pub fn tdb(&self) -> f64 {
        self.whole + self.tdb_fraction
    }

    /// TDB seconds elapsed since J2000, the ephemeris kernel time argument
    pub fn tdb_seconds_from_j2000(&self) -> f64 {
        ((self.whole - J2000) + self.tdb_fraction) * DAY_S
    }

    /// Julian centuries of TT since J2000
    pub fn tt_centuries(&self) -> f64 {
        ((self.whole - J2000) + self.tt_fraction) / JULIAN_CENTURY
    }

    /// TT - UT1 in seconds
    pub fn delta_t(&self) -> f64 {
        (self.tt_fraction - self.ut1_fraction) * DAY_S
    }

    /// Earth Rotation Angle in radians (IAU 2000)
    pub fn earth_rotation_angle(&self) -> f64 {
        let du = self.ut1() - J2000;
        let turns = 0.779_057_273_264_0 + 0.002_737_811_911_354_48 * du + du.rem_euclid(1.0);
        turns.rem_euclid(1.0) * TAU
    }

    /// Greenwich Mean Sidereal Time in radians (ERA based, IAU 2006)
    pub fn gmst(&self) -> f64 {
        let t = self.tt_centuries();
        let arcsec = 0.014_506
            + t * (4612.156_534 + t * (1.391_581_7 + t * (-0.000_000_44 + t * -0.000_029_956)));
        (self.earth_rotation_angle() + arcsec.to_radians() / 3600.0).rem_euclid(TAU)
    }

    /// Greenwich Mean Sidereal Time in hours
    pub fn gmst_hours(&self) -> f64 {
        self.gmst().to_degrees() / 15.0
    }

    /// Back to a chrono UTC datetime (rounded to the microsecond)
    pub fn utc_datetime(&self) -> Result<DateTime<Utc>> {
        let micros = ((self.whole - UNIX_EPOCH_JD) * DAY_S * 1e6
            + self.utc_fraction * DAY_S * 1e6)
            .round();
        if !micros.is_finite() || micros.abs() > i64::MAX as f64 {
            return Err(TimeError::OutOfRange(format!(
                "Julian date {} cannot be represented",
                self.utc_jd()
            )));
        }
        DateTime::from_timestamp_micros(micros as i64).ok_or_else(|| {
            TimeError::OutOfRange(format!(
                "Julian date {} cannot be represented",
                self.utc_jd()
            ))
        })
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.utc_datetime() {
            Ok(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S UTC")),
            Err(_) => write!(f, "JD {:.6} TT", self.tt()),
        }
    }
}
