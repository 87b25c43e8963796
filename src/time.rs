//! Date parsing, Julian dates and Horizons step sizes

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{AstroViewError, Result};

/// Julian date of the Unix epoch
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;
/// Julian date of J2000.0
pub const J2000_JD: f64 = 2_451_545.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a user supplied date or date-time, always as UTC
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AstroViewError::validation("date cannot be empty"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(midnight(date));
    }

    Err(AstroViewError::validation(format!(
        "could not parse '{input}' as a date, expected YYYY-MM-DD or YYYY-MM-DD HH:MM"
    )))
}

/// Build a UTC midnight timestamp from a `(year, month, day)` triple
pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(midnight)
        .ok_or_else(|| {
            AstroViewError::validation(format!("invalid date {year:04}-{month:02}-{day:02}"))
        })
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Julian date of a UTC timestamp
#[must_use]
pub fn julian_date(time: DateTime<Utc>) -> f64 {
    let seconds = time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) * 1e-9;
    seconds / SECONDS_PER_DAY + UNIX_EPOCH_JD
}

/// Inverse of [`julian_date`], rounded to the millisecond
pub fn from_julian_date(jd: f64) -> Result<DateTime<Utc>> {
    let millis = ((jd - UNIX_EPOCH_JD) * SECONDS_PER_DAY * 1000.0).round();
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return Err(AstroViewError::validation(format!(
            "Julian date {jd} is out of range"
        )));
    }
    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .ok_or_else(|| AstroViewError::validation(format!("Julian date {jd} is out of range")))
}

/// Julian centuries since J2000.0
#[must_use]
pub fn centuries_since_j2000(jd: f64) -> f64 {
    (jd - J2000_JD) / 36_525.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepUnit {
    Minutes,
    Hours,
    Days,
    Months,
    Years,
}

impl StepUnit {
    fn suffix(self) -> &'static str {
        match self {
            StepUnit::Minutes => "m",
            StepUnit::Hours => "h",
            StepUnit::Days => "d",
            StepUnit::Months => "mo",
            StepUnit::Years => "y",
        }
    }

    /// Approximate length in days, used for row estimates only
    fn approx_days(self) -> f64 {
        match self {
            StepUnit::Minutes => 1.0 / 1440.0,
            StepUnit::Hours => 1.0 / 24.0,
            StepUnit::Days => 1.0,
            StepUnit::Months => 30.436_875,
            StepUnit::Years => 365.25,
        }
    }
}

/// Table step size as understood by Horizons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepSize {
    Interval { amount: u32, unit: StepUnit },
    /// Split the span into this many equal intervals
    Count(u32),
}

impl StepSize {
    #[must_use]
    pub fn days(amount: u32) -> Self {
        StepSize::Interval {
            amount,
            unit: StepUnit::Days,
        }
    }
}

impl FromStr for StepSize {
    type Err = AstroViewError;

    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s.split_whitespace().collect::<String>().to_ascii_lowercase();
        let split = compact
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(compact.len());
        let (digits, suffix) = compact.split_at(split);

        let amount: u32 = digits
            .parse()
            .map_err(|_| AstroViewError::validation(format!("invalid step size '{s}'")))?;
        if amount == 0 {
            return Err(AstroViewError::validation("step size must be positive"));
        }

        let unit = match suffix {
            "" => return Ok(StepSize::Count(amount)),
            "m" | "min" | "mins" | "minute" | "minutes" => StepUnit::Minutes,
            "h" | "hr" | "hrs" | "hour" | "hours" => StepUnit::Hours,
            "d" | "day" | "days" => StepUnit::Days,
            "mo" | "mon" | "month" | "months" => StepUnit::Months,
            "y" | "yr" | "yrs" | "year" | "years" => StepUnit::Years,
            _ => {
                return Err(AstroViewError::validation(format!(
                    "unknown step unit '{suffix}' in '{s}'"
                )));
            }
        };
        Ok(StepSize::Interval { amount, unit })
    }
}

impl fmt::Display for StepSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepSize::Interval { amount, unit } => write!(f, "{amount}{}", unit.suffix()),
            StepSize::Count(count) => write!(f, "{count}"),
        }
    }
}

/// A start/stop/step table request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub step: StepSize,
}

impl TimeSpan {
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>, step: StepSize) -> Result<Self> {
        if stop <= start {
            return Err(AstroViewError::validation(format!(
                "stop time {stop} must be after start time {start}"
            )));
        }
        Ok(Self { start, stop, step })
    }

    /// Parse the textual form used on the command line and in config
    pub fn parse(start: &str, stop: &str, step: &str) -> Result<Self> {
        Self::new(parse_datetime(start)?, parse_datetime(stop)?, step.parse()?)
    }

    /// Rough number of table rows Horizons will produce
    #[must_use]
    pub fn estimated_points(&self) -> u64 {
        match self.step {
            StepSize::Count(count) => u64::from(count) + 1,
            StepSize::Interval { amount, unit } => {
                let span_days = (self.stop - self.start).num_seconds() as f64 / SECONDS_PER_DAY;
                let step_days = f64::from(amount) * unit.approx_days();
                (span_days / step_days).floor() as u64 + 1
            }
        }
    }
}

/// Which epochs an ephemeris is evaluated at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Epochs {
    Range(TimeSpan),
    /// Discrete Julian dates
    List(Vec<f64>),
}

impl Epochs {
    pub fn list(jds: Vec<f64>) -> Result<Self> {
        if jds.is_empty() {
            return Err(AstroViewError::validation("at least one epoch is required"));
        }
        if let Some(bad) = jds.iter().find(|jd| !jd.is_finite()) {
            return Err(AstroViewError::validation(format!(
                "epoch {bad} is not a valid Julian date"
            )));
        }
        Ok(Epochs::List(jds))
    }

    #[must_use]
    pub fn single(time: DateTime<Utc>) -> Self {
        Epochs::List(vec![julian_date(time)])
    }

    #[must_use]
    pub fn estimated_points(&self) -> u64 {
        match self {
            Epochs::Range(span) => span.estimated_points(),
            Epochs::List(jds) => jds.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2025-01-01", 2_460_676.5)]
    #[case("2000-01-01 12:00", J2000_JD)]
    #[case("1970-01-01T00:00:00Z", UNIX_EPOCH_JD)]
    #[case("2025-08-05 10:00", 2_460_892.916_666_7)]
    fn test_julian_date(#[case] input: &str, #[case] expected: f64) {
        let jd = julian_date(parse_datetime(input).unwrap());
        assert!((jd - expected).abs() < 1e-6, "{input}: {jd} != {expected}");
    }

    #[test]
    fn test_julian_round_trip() {
        let time = parse_datetime("2025-08-05 10:00:30").unwrap();
        assert_eq!(from_julian_date(julian_date(time)).unwrap(), time);
    }

    #[test]
    fn test_from_ymd_rejects_invalid() {
        assert!(from_ymd(2025, 2, 30).is_err());
        assert_eq!(
            julian_date(from_ymd(2025, 1, 2).unwrap()),
            2_460_677.5
        );
    }

    #[test]
    fn test_parse_datetime_errors() {
        assert!(parse_datetime("").is_err());
        assert!(parse_datetime("05/08/2025").is_err());
    }

    #[rstest]
    #[case("1d", StepSize::Interval { amount: 1, unit: StepUnit::Days })]
    #[case("12 h", StepSize::Interval { amount: 12, unit: StepUnit::Hours })]
    #[case("30m", StepSize::Interval { amount: 30, unit: StepUnit::Minutes })]
    #[case("1mo", StepSize::Interval { amount: 1, unit: StepUnit::Months })]
    #[case("2Y", StepSize::Interval { amount: 2, unit: StepUnit::Years })]
    #[case("100", StepSize::Count(100))]
    fn test_step_parsing(#[case] input: &str, #[case] expected: StepSize) {
        assert_eq!(input.parse::<StepSize>().unwrap(), expected);
    }

    #[rstest]
    #[case("0d")]
    #[case("d")]
    #[case("5 fortnights")]
    fn test_step_parsing_errors(#[case] input: &str) {
        assert!(input.parse::<StepSize>().is_err());
    }

    #[test]
    fn test_step_display_is_horizons_form() {
        assert_eq!("12 h".parse::<StepSize>().unwrap().to_string(), "12h");
        assert_eq!(StepSize::Count(10).to_string(), "10");
    }

    #[test]
    fn test_time_span_validation() {
        assert!(TimeSpan::parse("2025-12-31", "2025-01-01", "1d").is_err());
        let span = TimeSpan::parse("2025-01-01", "2025-12-31", "1d").unwrap();
        assert_eq!(span.estimated_points(), 365);
    }

    #[test]
    fn test_epoch_list_requires_entries() {
        assert!(Epochs::list(vec![]).is_err());
        assert_eq!(Epochs::list(vec![1.0, 2.0]).unwrap().estimated_points(), 2);
    }
}
