//! Instants and the zones they are read in.
//!
//! A [`DateTime`] is an epoch-millisecond instant, optionally tagged with the
//! zone it was parsed in. Calendar reads go through a [`Zone`]: the caller
//! picks it (explicit argument, then the stored zone, then a default).

use std::fmt::{self, Write as _};

use chrono::format::{Item, Parsed, StrftimeItems};
use chrono::{FixedOffset, Local, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::pattern::DatePattern;

/// Default rendering of a date value: `Mon Nov 18 10:22:27 CST 2013`.
pub const DEFAULT_FORMAT: &str = "%a %b %d %H:%M:%S %Z %Y";

/// Calendar failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("date out of range")]
    OutOfRange,
    #[error("invalid date pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("cannot parse {text:?} with pattern {pattern:?}")]
    Unparseable { text: String, pattern: String },
    #[error("pattern {pattern:?} has a zone name field, which can be formatted but not parsed")]
    FormatOnly { pattern: String },
}

/// A time zone: the host's, an IANA region, or a fixed offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Zone {
    #[default]
    Local,
    Named(Tz),
    Fixed(FixedOffset),
}

impl Zone {
    /// Resolve a zone id: `local`, an IANA name (`Asia/Shanghai`, `GMT`),
    /// or an offset (`GMT+8`, `UTC-05:30`, `+0800`, `Z`).
    pub fn parse(id: &str) -> Option<Zone> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        if id.eq_ignore_ascii_case("local") {
            return Some(Zone::Local);
        }
        if let Ok(tz) = id.parse::<Tz>() {
            return Some(Zone::Named(tz));
        }
        parse_offset_id(id).map(Zone::Fixed)
    }

    pub fn utc() -> Zone {
        Zone::Named(Tz::UTC)
    }

    /// Wall-clock time of `millis` in this zone.
    pub fn local_datetime(&self, millis: i64) -> Result<NaiveDateTime, DateError> {
        let utc = chrono::DateTime::<Utc>::from_timestamp_millis(millis).ok_or(DateError::OutOfRange)?;
        Ok(match self {
            Zone::Local => utc.with_timezone(&Local).naive_local(),
            Zone::Named(tz) => utc.with_timezone(tz).naive_local(),
            Zone::Fixed(offset) => utc.with_timezone(offset).naive_local(),
        })
    }

    /// Instant of a wall-clock time in this zone.
    ///
    /// Ambiguous times take the earlier instant; times inside a gap are
    /// pushed forward an hour.
    pub fn instant(&self, local: &NaiveDateTime) -> Result<i64, DateError> {
        match self {
            Zone::Local => resolve(&Local, local),
            Zone::Named(tz) => resolve(tz, local),
            Zone::Fixed(offset) => resolve(offset, local),
        }
    }

    /// Render `millis` with a strftime string.
    pub fn format(&self, millis: i64, strftime: &str) -> Result<String, DateError> {
        let utc = chrono::DateTime::<Utc>::from_timestamp_millis(millis).ok_or(DateError::OutOfRange)?;
        match self {
            Zone::Local => format_in(&Local, &utc, strftime),
            Zone::Named(tz) => format_in(tz, &utc, strftime),
            Zone::Fixed(offset) => format_in(offset, &utc, strftime),
        }
    }

    /// Parse `text` strictly. An offset in the text wins over this zone.
    pub fn parse_datetime(&self, text: &str, pattern: &DatePattern) -> Result<i64, DateError> {
        let unparseable = || DateError::Unparseable {
            text: text.to_string(),
            pattern: pattern.source().to_string(),
        };

        if pattern.fields().zone_name {
            return Err(DateError::FormatOnly {
                pattern: pattern.source().to_string(),
            });
        }

        let mut parsed = Parsed::new();
        chrono::format::parse(&mut parsed, text, StrftimeItems::new(pattern.strftime()))
            .map_err(|_| unparseable())?;

        let fields = pattern.fields();
        let mut defaults = || -> chrono::format::ParseResult<()> {
            if !fields.year {
                parsed.set_year(1970)?;
            }
            if !fields.month {
                parsed.set_month(1)?;
            }
            if !fields.day {
                parsed.set_day(1)?;
            }
            if fields.hour12 && !fields.am_pm {
                parsed.set_ampm(false)?;
            }
            if !fields.hour && !fields.hour12 {
                parsed.set_hour(0)?;
            }
            if !fields.minute {
                parsed.set_minute(0)?;
            }
            if !fields.second {
                parsed.set_second(0)?;
            }
            Ok(())
        };
        defaults().map_err(|_| unparseable())?;

        if fields.offset {
            let dt = parsed.to_datetime().map_err(|_| unparseable())?;
            return Ok(dt.timestamp_millis());
        }
        let local = parsed
            .to_naive_datetime_with_offset(0)
            .map_err(|_| unparseable())?;
        self.instant(&local)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Local => f.write_str("local"),
            Zone::Named(tz) => f.write_str(tz.name()),
            Zone::Fixed(offset) => {
                let secs = offset.local_minus_utc();
                let sign = if secs < 0 { '-' } else { '+' };
                let secs = secs.unsigned_abs();
                write!(f, "GMT{sign}{:02}:{:02}", secs / 3600, secs / 60 % 60)
            }
        }
    }
}

/// `GMT+8`, `UTC-05:30`, `+0800`, `Z`.
fn parse_offset_id(id: &str) -> Option<FixedOffset> {
    if id == "Z" {
        return FixedOffset::east_opt(0);
    }
    let rest = id
        .strip_prefix("GMT")
        .or_else(|| id.strip_prefix("UTC"))
        .unwrap_or(id);
    let (sign, body) = match rest.as_bytes().first()? {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => return None,
    };
    let (hours, minutes) = match body.split_once(':') {
        Some(parts) => parts,
        None if body.len() > 2 => body.split_at(body.len() - 2),
        None => (body, "00"),
    };
    let numeric = |s: &str| !s.is_empty() && s.len() <= 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !numeric(hours) || !numeric(minutes) || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn resolve<Z: TimeZone>(zone: &Z, local: &NaiveDateTime) -> Result<i64, DateError> {
    match zone.from_local_datetime(local) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt.timestamp_millis()),
        LocalResult::None => {
            let shifted = local
                .checked_add_signed(TimeDelta::hours(1))
                .ok_or(DateError::OutOfRange)?;
            zone.from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.timestamp_millis())
                .ok_or(DateError::OutOfRange)
        }
    }
}

fn format_in<Z: TimeZone>(
    zone: &Z,
    utc: &chrono::DateTime<Utc>,
    strftime: &str,
) -> Result<String, DateError>
where
    Z::Offset: fmt::Display,
{
    let invalid = || DateError::InvalidPattern {
        pattern: strftime.to_string(),
        reason: "not renderable".to_string(),
    };
    let items: Vec<Item<'_>> = StrftimeItems::new(strftime).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    let mut out = String::new();
    write!(out, "{}", utc.with_timezone(zone).format_with_items(items.iter()))
        .map_err(|_| invalid())?;
    Ok(out)
}

/// An instant with the zone it belongs to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    millis: i64,
    zone: Option<Zone>,
}

impl DateTime {
    pub fn new(millis: i64) -> Self {
        Self { millis, zone: None }
    }

    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Same zone tag, different instant.
    pub fn with_millis(mut self, millis: i64) -> Self {
        self.millis = millis;
        self
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }

    pub fn zone(&self) -> Option<Zone> {
        self.zone
    }

    /// The stored zone, or `default` when the value has none.
    pub fn zone_or(&self, default: Zone) -> Zone {
        self.zone.unwrap_or(default)
    }

    /// `Mon Nov 18 10:22:27 CST 2013` in the applicable zone. Instants
    /// chrono cannot represent fall back to their millisecond count.
    pub fn render(&self, default_zone: Zone) -> String {
        self.zone_or(default_zone)
            .format(self.millis, DEFAULT_FORMAT)
            .unwrap_or_else(|_| self.millis.to_string())
    }
}
