//! Simulation Timestamp Types
//!
//! Simulated time is a count of seconds since day 0 at midnight. The calendar
//! view (year, season, day) and the time-of-day view (hour, minute) are both
//! derived from that single counter so they can never disagree.
//!
//! # Example
//!
//! ```
//! use tavern_events::{SimTime, Season};
//!
//! let t = SimTime::at(2, 14).plus_minutes(5);
//! assert_eq!(t.hour(), 14);
//! assert_eq!(t.date().season, Season::Spring);
//! assert_eq!(t.to_string(), "year_1.spring.day_3 14:05:00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of days in each season.
pub const DAYS_PER_SEASON: u8 = 30;

/// Number of days in a year (four seasons).
pub const DAYS_PER_YEAR: u64 = DAYS_PER_SEASON as u64 * 4;

pub const SECONDS_PER_MINUTE: u64 = 60;
pub const SECONDS_PER_HOUR: u64 = 3_600;
pub const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Seasons in calendar order
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }

    fn ordinal(self) -> u64 {
        self as u64
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Season {
    type Err = ParseDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Season::ALL
            .into_iter()
            .find(|season| season.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseDateError::Season(s.to_string()))
    }
}

/// Why a calendar date string was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDateError {
    #[error("expected 'year_N.season.day_M', got '{0}'")]
    Malformed(String),

    #[error("year must be a positive number, got '{0}'")]
    Year(String),

    #[error("unknown season '{0}'")]
    Season(String),

    #[error("day must be between 1 and {max}, got '{0}'", max = DAYS_PER_SEASON)]
    Day(String),
}

/// Calendar date, written as `year_3.winter.day_12`.
///
/// Years and days count from 1. Stored as that string in save files and
/// event logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SimDate {
    pub year: u32,
    pub season: Season,
    pub day: u8,
}

impl SimDate {
    pub fn new(year: u32, season: Season, day: u8) -> Self {
        Self { year, season, day }
    }

    /// Calendar date of a zero-based day index.
    pub fn from_day_index(index: u64) -> Self {
        let per_season = DAYS_PER_SEASON as u64;
        let day_of_year = index % DAYS_PER_YEAR;
        Self {
            year: (index / DAYS_PER_YEAR) as u32 + 1,
            season: Season::ALL[(day_of_year / per_season) as usize],
            day: (day_of_year % per_season) as u8 + 1,
        }
    }

    /// Zero-based day index of this date.
    pub fn day_index(&self) -> u64 {
        let years = self.year.saturating_sub(1) as u64;
        let seasons = years * 4 + self.season.ordinal();
        seasons * DAYS_PER_SEASON as u64 + self.day.saturating_sub(1) as u64
    }
}

impl fmt::Display for SimDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "year_{}.{}.day_{}", self.year, self.season, self.day)
    }
}

/// Strips `prefix` and parses the positive number that follows.
fn numbered<T: FromStr + Default + PartialEq>(field: &str, prefix: &str) -> Option<T> {
    let value = field.strip_prefix(prefix)?.parse::<T>().ok()?;
    (value != T::default()).then_some(value)
}

impl FromStr for SimDate {
    type Err = ParseDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseDateError::Malformed(s.to_string());
        let (year_field, rest) = s.split_once('.').ok_or_else(malformed)?;
        let (season_field, day_field) = rest.split_once('.').ok_or_else(malformed)?;
        if !year_field.starts_with("year_") || !day_field.starts_with("day_") {
            return Err(malformed());
        }

        let year = numbered::<u32>(year_field, "year_")
            .ok_or_else(|| ParseDateError::Year(year_field.to_string()))?;
        let season = season_field.parse()?;
        let day = numbered::<u8>(day_field, "day_")
            .filter(|d| *d <= DAYS_PER_SEASON)
            .ok_or_else(|| ParseDateError::Day(day_field.to_string()))?;

        Ok(SimDate { year, season, day })
    }
}

impl TryFrom<String> for SimDate {
    type Error = ParseDateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SimDate> for String {
    fn from(date: SimDate) -> Self {
        date.to_string()
    }
}

/// A point in simulated time, in whole seconds since day 0 at 00:00:00.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// Start of the given hour on the given zero-based day.
    pub fn at(day: u64, hour: u32) -> Self {
        SimTime(day * SECONDS_PER_DAY + hour as u64 * SECONDS_PER_HOUR)
    }

    pub fn seconds(self) -> u64 {
        self.0
    }

    /// Zero-based day index.
    pub fn day_index(self) -> u64 {
        self.0 / SECONDS_PER_DAY
    }

    pub fn second_of_day(self) -> u64 {
        self.0 % SECONDS_PER_DAY
    }

    pub fn hour(self) -> u32 {
        (self.second_of_day() / SECONDS_PER_HOUR) as u32
    }

    pub fn minute(self) -> u32 {
        ((self.second_of_day() % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE) as u32
    }

    pub fn date(self) -> SimDate {
        SimDate::from_day_index(self.day_index())
    }

    pub fn plus_seconds(self, seconds: u64) -> Self {
        SimTime(self.0.saturating_add(seconds))
    }

    pub fn plus_minutes(self, minutes: u64) -> Self {
        self.plus_seconds(minutes.saturating_mul(SECONDS_PER_MINUTE))
    }

    pub fn plus_hours(self, hours: u64) -> Self {
        self.plus_seconds(hours.saturating_mul(SECONDS_PER_HOUR))
    }

    /// Seconds from `earlier` to `self`, zero if `earlier` is later.
    pub fn since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.second_of_day() % SECONDS_PER_MINUTE;
        write!(
            f,
            "{} {:02}:{:02}:{:02}",
            self.date(),
            self.hour(),
            self.minute(),
            secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_names_ignore_case() {
        for season in Season::ALL {
            assert_eq!(season.name().to_uppercase().parse::<Season>(), Ok(season));
        }
        assert_eq!("monsoon".parse::<Season>(), Err(ParseDateError::Season("monsoon".into())));
    }

    #[test]
    fn test_date_text_form() {
        let date = SimDate::new(3, Season::Winter, 12);
        assert_eq!(date.to_string(), "year_3.winter.day_12");
        assert_eq!("year_3.winter.day_12".parse::<SimDate>(), Ok(date));
    }

    #[test]
    fn test_rejected_dates_say_why() {
        let cases = [
            ("winter", ParseDateError::Malformed("winter".into())),
            ("year_1.spring.3", ParseDateError::Malformed("year_1.spring.3".into())),
            ("year_one.spring.day_1", ParseDateError::Year("year_one".into())),
            ("year_0.spring.day_1", ParseDateError::Year("year_0".into())),
            ("year_1.dusk.day_1", ParseDateError::Season("dusk".into())),
            ("year_1.spring.day_0", ParseDateError::Day("day_0".into())),
            ("year_1.spring.day_31", ParseDateError::Day("day_31".into())),
        ];
        for (text, expected) in cases {
            assert_eq!(text.parse::<SimDate>(), Err(expected), "{}", text);
        }
    }

    #[test]
    fn test_day_index_mapping() {
        assert_eq!(SimDate::from_day_index(0), SimDate::new(1, Season::Spring, 1));
        assert_eq!(SimDate::from_day_index(29), SimDate::new(1, Season::Spring, 30));
        assert_eq!(SimDate::from_day_index(30), SimDate::new(1, Season::Summer, 1));
        assert_eq!(SimDate::from_day_index(119), SimDate::new(1, Season::Winter, 30));
        assert_eq!(SimDate::from_day_index(120), SimDate::new(2, Season::Spring, 1));

        for index in [0, 17, 45, 119, 120, 365] {
            assert_eq!(SimDate::from_day_index(index).day_index(), index);
        }
    }

    #[test]
    fn test_sim_time_components() {
        let t = SimTime::at(1, 22).plus_minutes(30).plus_seconds(15);
        assert_eq!(t.day_index(), 1);
        assert_eq!(t.hour(), 22);
        assert_eq!(t.minute(), 30);
        assert_eq!(t.to_string(), "year_1.spring.day_2 22:30:15");
    }

    #[test]
    fn test_sim_time_day_rollover() {
        let t = SimTime::at(0, 23).plus_minutes(59).plus_seconds(59);
        assert_eq!(t.day_index(), 0);
        assert_eq!(t.plus_seconds(1).day_index(), 1);
        assert_eq!(t.plus_seconds(1).hour(), 0);
    }

    #[test]
    fn test_sim_time_since_saturates() {
        assert_eq!(SimTime(10).since(SimTime(4)), 6);
        assert_eq!(SimTime(4).since(SimTime(10)), 0);
    }

    #[test]
    fn test_sim_time_serializes_as_seconds() {
        let json = serde_json::to_string(&SimTime(3_600)).unwrap();
        assert_eq!(json, "3600");
        let parsed: SimTime = serde_json::from_str("7200").unwrap();
        assert_eq!(parsed.hour(), 2);
    }

    #[test]
    fn test_date_stored_as_text() {
        let json = serde_json::to_string(&SimTime::at(200, 6).date()).unwrap();
        assert_eq!(json, r#""year_2.autumn.day_21""#);
        assert!(serde_json::from_str::<SimDate>(r#""year_2.autumn.day_40""#).is_err());
    }
}
