use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;

/// Rendered in place of any time value that is missing or cannot be parsed.
pub const PLACEHOLDER: &str = "---";

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 365 * DAY;

/// A non-negative span of whole seconds broken into calendar-ish units.
///
/// Months are 30 days and years 365 days; the spans shown on a dashboard only
/// need to be roughly right at that scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    total_seconds: u64,
}

impl Span {
    pub fn from_seconds(total_seconds: u64) -> Self {
        Self { total_seconds }
    }

    pub fn years(&self) -> u64 {
        self.total_seconds / YEAR
    }

    pub fn months(&self) -> u64 {
        self.total_seconds % YEAR / MONTH
    }

    pub fn days(&self) -> u64 {
        self.total_seconds % YEAR % MONTH / DAY
    }

    pub fn hours(&self) -> u64 {
        self.total_seconds % DAY / HOUR
    }

    pub fn minutes(&self) -> u64 {
        self.total_seconds % HOUR / MINUTE
    }

    pub fn seconds(&self) -> u64 {
        self.total_seconds % MINUTE
    }

    fn units(&self) -> [(&'static str, u64); 6] {
        [
            ("year", self.years()),
            ("month", self.months()),
            ("day", self.days()),
            ("hour", self.hours()),
            ("minute", self.minutes()),
            ("second", self.seconds()),
        ]
    }
}

/// Shows the largest non-zero unit followed by the next smaller one,
/// e.g. `3 hours 12 minutes` or `5 minutes 30 seconds`.
impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.units();
        let Some(first) = units.iter().position(|(_, value)| *value != 0) else {
            return f.write_str("0 seconds");
        };

        let shown = &units[first..units.len().min(first + 2)];
        let parts: Vec<String> = shown
            .iter()
            .map(|(unit, value)| pluralize(*value, unit))
            .collect();
        f.write_str(&parts.join(" "))
    }
}

fn pluralize(value: u64, unit: &str) -> String {
    if value == 1 {
        format!("{value} {unit}")
    } else {
        format!("{value} {unit}s")
    }
}

/// Renders how long ago a run started, relative to `now`.
///
/// Returns [`PLACEHOLDER`] for a missing or unparseable timestamp. Timestamps
/// in the future are treated as "now".
pub fn format_start_time(started_at: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(raw) = started_at else {
        return PLACEHOLDER.to_string();
    };

    match parse_timestamp(raw) {
        Some(started) => {
            let elapsed = now.signed_duration_since(started).num_seconds().max(0);
            #[allow(clippy::cast_sign_loss)]
            let span = Span::from_seconds(elapsed as u64);
            format!("{span} ago")
        }
        None => {
            debug!("Unparseable timestamp: {raw:?}");
            PLACEHOLDER.to_string()
        }
    }
}

/// Renders a run duration such as `0:05:30` as `5 minutes 30 seconds`.
///
/// Returns [`PLACEHOLDER`] for a missing or malformed duration; never panics.
pub fn format_duration(duration: Option<&str>) -> String {
    let Some(raw) = duration else {
        return PLACEHOLDER.to_string();
    };

    match parse_duration(raw) {
        Some(span) => span.to_string(),
        None => {
            debug!("Unparseable duration: {raw:?}");
            PLACEHOLDER.to_string()
        }
    }
}

/// Parses an RFC 3339 timestamp, or a naive ISO-8601 one which is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(raw, pattern).ok())
        .map(|naive| naive.and_utc())
}

/// A run duration as the backend reports it: an optional day count plus a
/// clock reading.
///
/// Hours are not folded into days, so `25:00:00` stays 25 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLength {
    days: u64,
    hours: u64,
    minutes: u64,
    seconds: u64,
}

impl fmt::Display for RunLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor) = if self.days != 0 {
            (("day", self.days), ("hour", self.hours))
        } else if self.hours != 0 {
            (("hour", self.hours), ("minute", self.minutes))
        } else if self.minutes != 0 {
            (("minute", self.minutes), ("second", self.seconds))
        } else {
            return f.write_str(&pluralize(self.seconds, "second"));
        };
        write!(
            f,
            "{} {}",
            pluralize(major.1, major.0),
            pluralize(minor.1, minor.0)
        )
    }
}

/// Parses `H:MM:SS[.ffffff]` with an optional `N day(s), ` prefix.
///
/// Minutes and seconds must be below 60. Fractional seconds are truncated.
pub fn parse_duration(raw: &str) -> Option<RunLength> {
    let raw = raw.trim();
    let (days, clock) = match raw.split_once(',') {
        Some((days, clock)) => (parse_days(days)?, clock.trim()),
        None => (0, raw),
    };

    let mut fields = clock.split(':');
    let (hours, minutes, seconds) = (fields.next()?, fields.next()?, fields.next()?);
    if fields.next().is_some() {
        return None;
    }

    let hours = parse_digits(hours)?;
    let minutes = parse_digits(minutes).filter(|m| *m < 60)?;
    let seconds = match seconds.split_once('.') {
        Some((whole, fraction)) => {
            parse_digits(fraction)?;
            parse_digits(whole)?
        }
        None => parse_digits(seconds)?,
    };
    if seconds >= 60 {
        return None;
    }

    Some(RunLength {
        days,
        hours,
        minutes,
        seconds,
    })
}

fn parse_days(raw: &str) -> Option<u64> {
    let (count, unit) = raw.trim().split_once(' ')?;
    match unit {
        "day" | "days" => parse_digits(count),
        _ => None,
    }
}

fn parse_digits(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
