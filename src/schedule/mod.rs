//! Frame schedule
//!
//! A nightly window of local wall-clock times, stepped in whole minutes,
//! that may run past midnight into the next calendar date.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};

use crate::location::Location;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// The local time span covered by the animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_date: NaiveDate,
    pub start_hour: u32,
    /// Exclusive; an end hour at or before the start hour falls on the next day
    pub end_hour: u32,
    pub interval_minutes: u32,
}

/// One scheduled frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInstant {
    /// Zero-based position in the animation
    pub index: usize,
    /// Local wall-clock time shown in the title
    pub local: NaiveDateTime,
    /// The instant the sky is computed for
    pub utc: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start_date: NaiveDate, start_hour: u32, end_hour: u32, interval_minutes: u32) -> Self {
        Self {
            start_date,
            start_hour,
            end_hour,
            interval_minutes,
        }
    }

    /// Length of the window in minutes; equal hours mean a full day
    pub fn total_minutes(&self) -> u32 {
        let hours = (self.end_hour + 24 - self.start_hour % 24) % 24;
        if hours == 0 {
            MINUTES_PER_DAY
        } else {
            hours * 60
        }
    }

    /// Number of frames: whole intervals that fit in the window
    pub fn frame_count(&self) -> usize {
        if self.interval_minutes == 0 {
            return 0;
        }
        (self.total_minutes() / self.interval_minutes) as usize
    }

    /// Local wall-clock time of the first frame
    pub fn start(&self) -> NaiveDateTime {
        let time = NaiveTime::from_hms_opt(self.start_hour % 24, 0, 0).unwrap_or(NaiveTime::MIN);
        self.start_date.and_time(time)
    }

    /// Local wall-clock time of every frame, in order
    pub fn local_times(&self) -> Vec<NaiveDateTime> {
        let start = self.start();
        (0..self.frame_count())
            .map(|i| start + TimeDelta::minutes(i as i64 * i64::from(self.interval_minutes)))
            .collect()
    }

    /// Every frame with its UTC instant at the given location
    pub fn instants(&self, location: &Location) -> Vec<FrameInstant> {
        self.local_times()
            .into_iter()
            .enumerate()
            .map(|(index, local)| FrameInstant {
                index,
                local,
                utc: location.localize(local),
            })
            .collect()
    }
}
