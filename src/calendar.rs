use std::f64::consts::PI;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Accepted layouts for instants without an explicit offset
const NAIVE_FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Accepted layouts with a numeric offset that RFC 3339 parsing does not cover
const OFFSET_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Parses an ISO-like instant into a naive UTC date time.
///
/// Instants carrying an offset (or 'Z') are converted to UTC, instants without one are
/// taken as UTC as they are, and a bare date means midnight. Seconds may be left out,
/// so the forecast output format parses back to the same instant.
///
/// # Arguments
///
/// * 'text' - the instant to parse
pub fn parse_instant(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.naive_utc());
        }
    }

    // A trailing Z already means UTC
    let naive = text.strip_suffix(['Z', 'z']).unwrap_or(text);
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Formats a forecast instant to minute precision with a UTC marker
pub fn format_forecast_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%MZ").to_string()
}

/// Calendar fields and their cyclic encodings for one forecast hour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarFeatures {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub weekday: u32,
    pub day_of_year: u32,
    pub hour_sin: f64,
    pub hour_cos: f64,
    pub doy_sin: f64,
    pub doy_cos: f64,
    pub weekday_sin: f64,
    pub weekday_cos: f64,
}

impl CalendarFeatures {
    /// Derives calendar fields from an instant, weekday counts from Monday = 0 and
    /// day of year from 1
    ///
    /// # Arguments
    ///
    /// * 'ts' - the instant to derive features for
    pub fn from_instant(ts: NaiveDateTime) -> CalendarFeatures {
        let hour = ts.hour();
        let weekday = ts.weekday().num_days_from_monday();
        let day_of_year = ts.ordinal();

        let (hour_sin, hour_cos) = cyclic(hour as f64, 24.0);
        let (doy_sin, doy_cos) = cyclic(day_of_year as f64, 365.25);
        let (weekday_sin, weekday_cos) = cyclic(weekday as f64, 7.0);

        CalendarFeatures {
            year: ts.year(),
            month: ts.month(),
            day: ts.day(),
            hour,
            weekday,
            day_of_year,
            hour_sin,
            hour_cos,
            doy_sin,
            doy_cos,
            weekday_sin,
            weekday_cos,
        }
    }
}

fn cyclic(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}
