//! Parameters for creating or editing a status update.
//!
//! # Design
//! `Update` is a mutable parameter object filled in by the caller and read
//! by the create/edit payload builders. Media keys are restricted to the
//! three the service understands, and every scheduling input is normalized
//! to one canonical text form at the moment it is set, so the payload never
//! carries an unparsed date.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use std::time::SystemTime;

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use serde::Serialize;

use crate::error::ValidationError;

pub const MEDIA_KEYS: [&str; 3] = ["link", "description", "picture"];

/// Output format for `scheduled_at`, always rendered in UTC.
const SCHEDULED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Accepted media attachment fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKey {
    Link,
    Description,
    Picture,
}

impl MediaKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKey::Link => "link",
            MediaKey::Description => "description",
            MediaKey::Picture => "picture",
        }
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "link" => Ok(MediaKey::Link),
            "description" => Ok(MediaKey::Description),
            "picture" => Ok(MediaKey::Picture),
            _ => Err(ValidationError::InvalidMediaKey { key: s.to_string() }),
        }
    }
}

/// When an update should go out: a Unix timestamp, free-form text, or an
/// already resolved instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleTime {
    Timestamp(i64),
    Text(String),
    Instant(DateTime<Utc>),
}

impl From<i64> for ScheduleTime {
    fn from(timestamp: i64) -> Self {
        ScheduleTime::Timestamp(timestamp)
    }
}

impl From<i32> for ScheduleTime {
    fn from(timestamp: i32) -> Self {
        ScheduleTime::Timestamp(i64::from(timestamp))
    }
}

impl From<u32> for ScheduleTime {
    fn from(timestamp: u32) -> Self {
        ScheduleTime::Timestamp(i64::from(timestamp))
    }
}

/// Values above `i64::MAX` saturate and fail with `TimestampOutOfRange`.
impl From<u64> for ScheduleTime {
    fn from(timestamp: u64) -> Self {
        ScheduleTime::Timestamp(i64::try_from(timestamp).unwrap_or(i64::MAX))
    }
}

impl From<SystemTime> for ScheduleTime {
    fn from(time: SystemTime) -> Self {
        ScheduleTime::Instant(DateTime::<Utc>::from(time))
    }
}

impl From<&str> for ScheduleTime {
    fn from(text: &str) -> Self {
        ScheduleTime::Text(text.to_string())
    }
}

impl From<String> for ScheduleTime {
    fn from(text: String) -> Self {
        ScheduleTime::Text(text)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for ScheduleTime {
    fn from(instant: DateTime<Tz>) -> Self {
        ScheduleTime::Instant(instant.with_timezone(&Utc))
    }
}

impl ScheduleTime {
    /// Resolve to a concrete instant against the local clock and zone.
    pub fn resolve(&self) -> Result<DateTime<Utc>, ValidationError> {
        self.resolve_at(&Local::now())
    }

    /// Resolve relative to `now`. Naive, keyword and relative text is read
    /// in the time zone of `now`.
    pub fn resolve_at<Tz>(&self, now: &DateTime<Tz>) -> Result<DateTime<Utc>, ValidationError>
    where
        Tz: TimeZone,
        Tz::Offset: Copy,
    {
        match self {
            ScheduleTime::Timestamp(ts) => from_timestamp(*ts),
            ScheduleTime::Instant(instant) => Ok(*instant),
            ScheduleTime::Text(text) => parse_text(text, now),
        }
    }

    /// Resolve and render in the canonical `scheduled_at` form.
    pub fn normalize(&self) -> Result<String, ValidationError> {
        self.normalize_at(&Local::now())
    }

    pub fn normalize_at<Tz>(&self, now: &DateTime<Tz>) -> Result<String, ValidationError>
    where
        Tz: TimeZone,
        Tz::Offset: Copy,
    {
        Ok(self.resolve_at(now)?.format(SCHEDULED_AT_FORMAT).to_string())
    }
}

/// Keywords naming a wall-clock time: (keyword, day offset, hour).
const DAY_KEYWORDS: [(&str, i64, u32); 5] = [
    ("today", 0, 0),
    ("midnight", 0, 0),
    ("noon", 0, 12),
    ("tomorrow", 1, 0),
    ("yesterday", -1, 0),
];

const NAIVE_FORMATS: [&str; 4] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

const UTC_ZONE_NAMES: [&str; 3] = ["utc", "gmt", "z"];

fn from_timestamp(ts: i64) -> Result<DateTime<Utc>, ValidationError> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .ok_or(ValidationError::TimestampOutOfRange(ts))
}

fn parse_text<Tz>(text: &str, now: &DateTime<Tz>) -> Result<DateTime<Utc>, ValidationError>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    let trimmed = text.trim();
    let unparseable = || ValidationError::UnparseableDate {
        value: text.to_string(),
    };

    if trimmed.is_empty() {
        return Err(unparseable());
    }

    // Numeric strings, bare or `@`-prefixed, are timestamps.
    if let Ok(ts) = trimmed.strip_prefix('@').unwrap_or(trimmed).parse::<i64>() {
        return from_timestamp(ts);
    }

    if let Some(instant) = parse_with_offset(trimmed) {
        return Ok(instant);
    }

    if let Some(naive) = strip_utc_zone(trimmed).and_then(parse_naive) {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    // Naive forms are wall-clock time in the zone of `now`.
    if let Some(naive) = parse_naive(trimmed) {
        return in_zone(&now.timezone(), naive).ok_or_else(unparseable);
    }

    let lowered = trimmed.to_ascii_lowercase();
    if lowered == "now" {
        return Ok(now.with_timezone(&Utc));
    }
    if let Some(&(_, days, hour)) = DAY_KEYWORDS.iter().find(|(keyword, _, _)| *keyword == lowered) {
        let wall_clock = now
            .date_naive()
            .checked_add_signed(TimeDelta::days(days))
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .ok_or_else(unparseable)?;
        return in_zone(&now.timezone(), wall_clock).ok_or_else(unparseable);
    }

    if let Some(instant) = relative_offset(&lowered, now) {
        return Ok(instant);
    }

    chrono_english::parse_date_string(trimmed, now.clone(), chrono_english::Dialect::Us)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| unparseable())
}

fn parse_with_offset(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, SCHEDULED_AT_FORMAT))
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// `2013-12-23 02:00:00 UTC` -> `2013-12-23 02:00:00`.
fn strip_utc_zone(text: &str) -> Option<&str> {
    let (head, zone) = text.rsplit_once(' ')?;
    UTC_ZONE_NAMES
        .contains(&zone.to_ascii_lowercase().as_str())
        .then(|| head.trim_end())
}

/// `+1 day`, `-2 hours`, `in 90 minutes`.
fn relative_offset<Tz: TimeZone>(lowered: &str, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let (forward, rest) = if let Some(rest) = lowered.strip_prefix('+') {
        (true, rest)
    } else if let Some(rest) = lowered.strip_prefix('-') {
        (false, rest)
    } else if let Some(rest) = lowered.strip_prefix("in ") {
        (true, rest)
    } else {
        return None;
    };

    let delta = TimeDelta::from_std(humantime::parse_duration(rest.trim()).ok()?).ok()?;
    let delta = if forward { delta } else { -delta };
    now.with_timezone(&Utc).checked_add_signed(delta)
}

/// Wall-clock time in `tz`. Ambiguous times take the earlier instant; times
/// skipped by a forward transition move forward by the length of the gap.
fn in_zone<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.with_timezone(&Utc)),
        LocalResult::None => {
            let day_before = naive.checked_sub_signed(TimeDelta::days(1))?;
            let offset = tz.from_local_datetime(&day_before).earliest()?.offset().fix();
            let utc = naive.checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))?;
            Some(Utc.from_utc_datetime(&utc))
        }
    }
}

/// A status update to create or edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    text: Option<String>,
    profiles: Vec<String>,
    shorten: bool,
    now: bool,
    top: bool,
    media: BTreeMap<MediaKey, String>,
    scheduled_at: Option<String>,
}

impl Default for Update {
    fn default() -> Self {
        Self {
            text: None,
            profiles: Vec::new(),
            shorten: true,
            now: false,
            top: false,
            media: BTreeMap::new(),
            scheduled_at: None,
        }
    }
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(text.into());
        self
    }

    /// Links in the text are shortened unless this is turned off.
    pub fn set_shorten(&mut self, shorten: bool) -> &mut Self {
        self.shorten = shorten;
        self
    }

    /// Send immediately instead of adding to the queue.
    pub fn set_now(&mut self, now: bool) -> &mut Self {
        self.now = now;
        self
    }

    /// Add to the top of the queue.
    pub fn set_top(&mut self, top: bool) -> &mut Self {
        self.top = top;
        self
    }

    pub fn add_profile(&mut self, id: impl Into<String>) -> &mut Self {
        self.profiles.push(id.into());
        self
    }

    /// Attach a media field. Only `link`, `description` and `picture` are
    /// accepted; setting the same key twice keeps the last value.
    pub fn add_media(&mut self, key: &str, value: impl Into<String>) -> Result<&mut Self, ValidationError> {
        let key = key.parse::<MediaKey>()?;
        self.media.insert(key, value.into());
        Ok(self)
    }

    /// Schedule the update, replacing any earlier schedule.
    pub fn schedule(&mut self, when: impl Into<ScheduleTime>) -> Result<&mut Self, ValidationError> {
        self.scheduled_at = Some(when.into().normalize()?);
        Ok(self)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    pub fn shorten(&self) -> bool {
        self.shorten
    }

    pub fn now(&self) -> bool {
        self.now
    }

    pub fn top(&self) -> bool {
        self.top
    }

    pub fn media(&self) -> &BTreeMap<MediaKey, String> {
        &self.media
    }

    pub fn scheduled_at(&self) -> Option<&str> {
        self.scheduled_at.as_deref()
    }
}
