//! Temporal attribute values: date, time, dateTime and the two duration types.
//!
//! Values remember whether they carried a timezone. Ordering between a
//! time-zoned value and a non-time-zoned one is undefined and reported as
//! [`CoreError::TimezoneMismatch`]; no default timezone is ever assumed.

use crate::error::{CoreError, CoreResult};
use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use std::cmp::Ordering;

/// Largest timezone offset allowed by XML Schema, in minutes
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Calendar date with optional timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Date {
    /// Calendar date
    pub date: NaiveDate,
    /// Timezone, if one was given
    pub offset: Option<FixedOffset>,
}

/// Time of day with optional timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Time {
    /// Time of day
    pub time: NaiveTime,
    /// Timezone, if one was given
    pub offset: Option<FixedOffset>,
}

/// Date and time of day with optional timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    /// Local date and time
    pub date_time: NaiveDateTime,
    /// Timezone, if one was given
    pub offset: Option<FixedOffset>,
}

impl Date {
    /// Parse `YYYY-MM-DD[tz]`
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a valid date
    pub fn parse(s: &str) -> CoreResult<Self> {
        let (body, offset) = split_zone(s).map_err(|r| CoreError::data_type("date", s, r))?;
        let date = NaiveDate::parse_from_str(body, "%Y-%m-%d")
            .map_err(|e| CoreError::data_type("date", s, e.to_string()))?;
        Ok(Self { date, offset })
    }

    /// Compare using calendar semantics
    ///
    /// # Errors
    ///
    /// Returns error if exactly one side carries a timezone
    pub fn compare(&self, other: &Date) -> CoreResult<Ordering> {
        compare_zoned(
            self.date.and_time(NaiveTime::default()),
            self.offset,
            other.date.and_time(NaiveTime::default()),
            other.offset,
        )
    }
}

impl Time {
    /// Parse `hh:mm:ss[.fraction][tz]`
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a valid time
    pub fn parse(s: &str) -> CoreResult<Self> {
        let (body, offset) = split_zone(s).map_err(|r| CoreError::data_type("time", s, r))?;
        let time = NaiveTime::parse_from_str(body, "%H:%M:%S%.f")
            .map_err(|e| CoreError::data_type("time", s, e.to_string()))?;
        Ok(Self { time, offset })
    }

    /// Compare two times of day
    ///
    /// # Errors
    ///
    /// Returns error if exactly one side carries a timezone
    pub fn compare(&self, other: &Time) -> CoreResult<Ordering> {
        let epoch = NaiveDate::default();
        compare_zoned(
            epoch.and_time(self.time),
            self.offset,
            epoch.and_time(other.time),
            other.offset,
        )
    }
}

impl DateTime {
    /// Parse `YYYY-MM-DDThh:mm:ss[.fraction][tz]`
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a valid dateTime
    pub fn parse(s: &str) -> CoreResult<Self> {
        let (body, offset) = split_zone(s).map_err(|r| CoreError::data_type("dateTime", s, r))?;
        let date_time = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| CoreError::data_type("dateTime", s, e.to_string()))?;
        Ok(Self { date_time, offset })
    }

    /// Compare two instants
    ///
    /// # Errors
    ///
    /// Returns error if exactly one side carries a timezone
    pub fn compare(&self, other: &DateTime) -> CoreResult<Ordering> {
        compare_zoned(self.date_time, self.offset, other.date_time, other.offset)
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_date(f, &self.date)?;
        write_zone(f, self.offset)
    }
}

impl std::fmt::Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_time(f, &self.time)?;
        write_zone(f, self.offset)
    }
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_date(f, &self.date_time.date())?;
        f.write_str("T")?;
        write_time(f, &self.date_time.time())?;
        write_zone(f, self.offset)
    }
}

/// `xs:dayTimeDuration`, kept component-wise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DayTimeDuration {
    /// Negative duration
    pub negative: bool,
    /// Days
    pub days: u64,
    /// Hours
    pub hours: u64,
    /// Minutes
    pub minutes: u64,
    /// Whole seconds
    pub seconds: u64,
    /// Fractional seconds, in nanoseconds
    pub nanos: u32,
}

impl DayTimeDuration {
    /// Parse `[-]P[nD][T[nH][nM][n[.f]S]]`
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a valid dayTimeDuration
    pub fn parse(s: &str) -> CoreResult<Self> {
        let err = |reason: &str| CoreError::data_type("dayTimeDuration", s, reason);
        let (negative, rest) = split_sign(s);
        let rest = rest.strip_prefix('P').ok_or_else(|| err("missing 'P' designator"))?;
        let (date_part, time_part) = match rest.split_once('T') {
            Some((_, t)) if t.is_empty() => return Err(err("empty time part")),
            Some((d, t)) => (d, Some(t)),
            None => (rest, None),
        };

        let mut duration = Self {
            negative,
            ..Self::default()
        };
        let mut seen = false;

        for (value, designator) in components(date_part).map_err(|r| err(&r))? {
            match designator {
                'D' => duration.days = parse_whole(value).map_err(|r| err(&r))?,
                _ => return Err(err("unexpected designator in date part")),
            }
            seen = true;
        }

        if let Some(time_part) = time_part {
            let mut order = 0;
            for (value, designator) in components(time_part).map_err(|r| err(&r))? {
                let rank = match designator {
                    'H' => 1,
                    'M' => 2,
                    'S' => 3,
                    _ => return Err(err("unexpected designator in time part")),
                };
                if rank <= order {
                    return Err(err("components out of order"));
                }
                order = rank;
                match designator {
                    'H' => duration.hours = parse_whole(value).map_err(|r| err(&r))?,
                    'M' => duration.minutes = parse_whole(value).map_err(|r| err(&r))?,
                    _ => {
                        let (whole, nanos) = parse_seconds(value).map_err(|r| err(&r))?;
                        duration.seconds = whole;
                        duration.nanos = nanos;
                    }
                }
                seen = true;
            }
        }

        if !seen {
            return Err(err("no components"));
        }
        if duration.is_zero() {
            duration.negative = false;
        }
        Ok(duration)
    }

    /// Check whether every component is zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.days == 0 && self.hours == 0 && self.minutes == 0 && self.seconds == 0 && self.nanos == 0
    }

    /// Convert to a signed chrono delta, if it fits
    #[must_use]
    pub fn to_time_delta(&self) -> Option<TimeDelta> {
        let secs = self
            .days
            .checked_mul(86_400)?
            .checked_add(self.hours.checked_mul(3_600)?)?
            .checked_add(self.minutes.checked_mul(60)?)?
            .checked_add(self.seconds)?;
        let delta = TimeDelta::new(i64::try_from(secs).ok()?, self.nanos)?;
        Some(if self.negative { -delta } else { delta })
    }
}

impl std::fmt::Display for DayTimeDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds > 0 || self.nanos > 0 {
            f.write_str("T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds > 0 || self.nanos > 0 {
                write!(f, "{}{}S", self.seconds, fraction(self.nanos))?;
            }
        }
        Ok(())
    }
}

/// `xs:yearMonthDuration`, kept component-wise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct YearMonthDuration {
    /// Negative duration
    pub negative: bool,
    /// Years
    pub years: u64,
    /// Months
    pub months: u64,
}

impl YearMonthDuration {
    /// Parse `[-]P[nY][nM]`
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a valid yearMonthDuration
    pub fn parse(s: &str) -> CoreResult<Self> {
        let err = |reason: &str| CoreError::data_type("yearMonthDuration", s, reason);
        let (negative, rest) = split_sign(s);
        let rest = rest.strip_prefix('P').ok_or_else(|| err("missing 'P' designator"))?;

        let mut duration = Self {
            negative,
            ..Self::default()
        };
        let mut order = 0;
        for (value, designator) in components(rest).map_err(|r| err(&r))? {
            let rank = match designator {
                'Y' => 1,
                'M' => 2,
                _ => return Err(err("unexpected designator")),
            };
            if rank <= order {
                return Err(err("components out of order"));
            }
            order = rank;
            let parsed = parse_whole(value).map_err(|r| err(&r))?;
            if designator == 'Y' {
                duration.years = parsed;
            } else {
                duration.months = parsed;
            }
        }
        if order == 0 {
            return Err(err("no components"));
        }
        if duration.years == 0 && duration.months == 0 {
            duration.negative = false;
        }
        Ok(duration)
    }
}

impl std::fmt::Display for YearMonthDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.years == 0 && self.months == 0 {
            return f.write_str("P0M");
        }
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        if self.years > 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months > 0 {
            write!(f, "{}M", self.months)?;
        }
        Ok(())
    }
}

fn compare_zoned(
    a: NaiveDateTime,
    a_offset: Option<FixedOffset>,
    b: NaiveDateTime,
    b_offset: Option<FixedOffset>,
) -> CoreResult<Ordering> {
    match (a_offset, b_offset) {
        (Some(ao), Some(bo)) => Ok(to_utc(a, ao).cmp(&to_utc(b, bo))),
        (None, None) => Ok(a.cmp(&b)),
        _ => Err(CoreError::TimezoneMismatch),
    }
}

fn to_utc(local: NaiveDateTime, offset: FixedOffset) -> NaiveDateTime {
    let shift = TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    local.checked_sub_signed(shift).unwrap_or(local)
}

/// Split a trailing `Z` or `±hh:mm` timezone from the text
fn split_zone(s: &str) -> Result<(&str, Option<FixedOffset>), String> {
    if let Some(body) = s.strip_suffix('Z') {
        return Ok((body, FixedOffset::east_opt(0)));
    }
    let bytes = s.as_bytes();
    if bytes.len() > 6 {
        let sign_at = bytes.len() - 6;
        let sign = bytes[sign_at];
        if (sign == b'+' || sign == b'-') && bytes[sign_at + 3] == b':' {
            let hours: i32 = s[sign_at + 1..sign_at + 3]
                .parse()
                .map_err(|_| "invalid timezone hours".to_string())?;
            let minutes: i32 = s[sign_at + 4..]
                .parse()
                .map_err(|_| "invalid timezone minutes".to_string())?;
            let total = hours * 60 + minutes;
            if minutes >= 60 || total > MAX_OFFSET_MINUTES {
                return Err("timezone out of range".to_string());
            }
            let seconds = if sign == b'-' { -total * 60 } else { total * 60 };
            let offset = FixedOffset::east_opt(seconds).ok_or("timezone out of range")?;
            return Ok((&s[..sign_at], Some(offset)));
        }
    }
    Ok((s, None))
}

fn write_zone(f: &mut std::fmt::Formatter<'_>, offset: Option<FixedOffset>) -> std::fmt::Result {
    match offset {
        None => Ok(()),
        Some(o) if o.local_minus_utc() == 0 => f.write_str("Z"),
        Some(o) => {
            let secs = o.local_minus_utc();
            let sign = if secs < 0 { '-' } else { '+' };
            let minutes = secs.abs() / 60;
            write!(f, "{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
        }
    }
}

fn write_date(f: &mut std::fmt::Formatter<'_>, date: &NaiveDate) -> std::fmt::Result {
    write!(f, "{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

fn write_time(f: &mut std::fmt::Formatter<'_>, time: &NaiveTime) -> std::fmt::Result {
    write!(
        f,
        "{:02}:{:02}:{:02}{}",
        time.hour(),
        time.minute(),
        time.second(),
        fraction(time.nanosecond())
    )
}

/// Fractional seconds without trailing zeros, empty when zero
fn fraction(nanos: u32) -> String {
    if nanos == 0 {
        return String::new();
    }
    let digits = format!("{:09}", nanos);
    format!(".{}", digits.trim_end_matches('0'))
}

fn split_sign(s: &str) -> (bool, &str) {
    match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    }
}

/// Split `12D3H` style text into (number, designator) pairs
fn components(s: &str) -> Result<Vec<(&str, char)>, String> {
    let mut out = Vec::new();
    let mut start = 0;
    for (idx, ch) in s.char_indices() {
        if ch.is_ascii_alphabetic() {
            if idx == start {
                return Err(format!("designator '{}' without a number", ch));
            }
            out.push((&s[start..idx], ch));
            start = idx + ch.len_utf8();
        } else if !(ch.is_ascii_digit() || ch == '.') {
            return Err(format!("unexpected character '{}'", ch));
        }
    }
    if start != s.len() {
        return Err("trailing number without designator".to_string());
    }
    Ok(out)
}

fn parse_whole(value: &str) -> Result<u64, String> {
    value.parse().map_err(|_| format!("invalid number \"{}\"", value))
}

fn parse_seconds(value: &str) -> Result<(u64, u32), String> {
    match value.split_once('.') {
        None => Ok((parse_whole(value)?, 0)),
        Some((whole, frac)) => {
            if frac.is_empty() || frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("invalid fractional seconds \"{}\"", value));
            }
            let nanos: u32 = format!("{:0<9}", frac)
                .parse()
                .map_err(|_| format!("invalid fractional seconds \"{}\"", value))?;
            Ok((parse_whole(whole)?, nanos))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_parse_and_display() {
        let d = Date::parse("2024-02-29").unwrap();
        assert!(d.offset.is_none());
        assert_eq!(d.to_string(), "2024-02-29");

        let d = Date::parse("2024-02-29-05:00").unwrap();
        assert_eq!(d.offset, FixedOffset::west_opt(5 * 3600));
        assert_eq!(d.to_string(), "2024-02-29-05:00");

        assert!(Date::parse("2023-02-29").is_err());
    }

    #[test]
    fn test_time_fraction_display() {
        let t = Time::parse("12:30:05.500Z").unwrap();
        assert_eq!(t.to_string(), "12:30:05.5Z");

        let t = Time::parse("23:59:59").unwrap();
        assert_eq!(t.to_string(), "23:59:59");
    }

    #[test]
    fn test_date_time_compare_with_zones() {
        let a = DateTime::parse("2024-01-15T12:00:00+02:00").unwrap();
        let b = DateTime::parse("2024-01-15T10:00:00Z").unwrap();
        assert_eq!(a.compare(&b).unwrap(), Ordering::Equal);

        let c = DateTime::parse("2024-01-15T11:00:00Z").unwrap();
        assert_eq!(a.compare(&c).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_timezone_mismatch_is_error() {
        let zoned = DateTime::parse("2024-01-15T12:00:00Z").unwrap();
        let naive = DateTime::parse("2024-01-15T12:00:00").unwrap();
        assert_eq!(zoned.compare(&naive), Err(CoreError::TimezoneMismatch));

        let zoned = Time::parse("12:00:00Z").unwrap();
        let naive = Time::parse("12:00:00").unwrap();
        assert_eq!(naive.compare(&zoned), Err(CoreError::TimezoneMismatch));

        let zoned = Date::parse("2024-01-15Z").unwrap();
        let naive = Date::parse("2024-01-15").unwrap();
        assert_eq!(zoned.compare(&naive), Err(CoreError::TimezoneMismatch));
    }

    #[test]
    fn test_naive_compare() {
        let a = Date::parse("2024-01-15").unwrap();
        let b = Date::parse("2024-01-16").unwrap();
        assert_eq!(a.compare(&b).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_day_time_duration() {
        let d = DayTimeDuration::parse("P1DT2H30M1.25S").unwrap();
        assert_eq!(d.days, 1);
        assert_eq!(d.hours, 2);
        assert_eq!(d.minutes, 30);
        assert_eq!(d.seconds, 1);
        assert_eq!(d.nanos, 250_000_000);
        assert_eq!(d.to_string(), "P1DT2H30M1.25S");

        let d = DayTimeDuration::parse("-PT5M").unwrap();
        assert!(d.negative);
        assert_eq!(d.to_string(), "-PT5M");
        assert_eq!(d.to_time_delta(), Some(TimeDelta::minutes(-5)));
    }

    #[test]
    fn test_day_time_duration_structural_equality() {
        let a = DayTimeDuration::parse("P1D").unwrap();
        let b = DayTimeDuration::parse("PT24H").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.to_time_delta(), b.to_time_delta());
    }

    #[test]
    fn test_day_time_duration_errors() {
        assert!(DayTimeDuration::parse("1D").is_err());
        assert!(DayTimeDuration::parse("P").is_err());
        assert!(DayTimeDuration::parse("PT").is_err());
        assert!(DayTimeDuration::parse("PT5M2H").is_err());
        assert!(DayTimeDuration::parse("P1Y").is_err());
    }

    #[test]
    fn test_year_month_duration() {
        let d = YearMonthDuration::parse("P2Y6M").unwrap();
        assert_eq!(d.years, 2);
        assert_eq!(d.months, 6);
        assert_eq!(d.to_string(), "P2Y6M");
        assert_eq!(YearMonthDuration::parse("-P0Y").unwrap().to_string(), "P0M");
        assert!(YearMonthDuration::parse("P6M2Y").is_err());
    }
}
