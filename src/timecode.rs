use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;

use crate::errors::SubtitleError;

// @module: Timecode model (microsecond offsets from film start)

// @const: Microseconds in one second
pub const MICROSECONDS_PER_SECOND: i64 = 1_000_000;

// @const: Separator used when rendering a timing line
pub const TIMECODE_SEPARATOR: &str = " --> ";

// @const: SRT timing line regex
static TIMECODE_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

// @const: Single SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})$").unwrap()
});

/// A closed time interval, in microseconds since the start of the film
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimeSpan {
    // @field: Start offset in microseconds
    pub start: i64,

    // @field: End offset in microseconds
    pub end: i64,
}

impl TimeSpan {
    pub fn new(start: i64, end: i64) -> Self {
        TimeSpan { start, end }
    }

    /// Parse a timing line such as `00:00:10,000 --> 00:00:12,000`
    pub fn parse(line: &str) -> Result<Self, SubtitleError> {
        let trimmed = line.trim();
        let malformed = || SubtitleError::MalformedTimecode { line: trimmed.to_string() };

        let caps = TIMECODE_LINE_REGEX.captures(trimmed).ok_or_else(malformed)?;
        let start = timestamp_from_captures(&caps, 1).ok_or_else(malformed)?;
        let end = timestamp_from_captures(&caps, 5).ok_or_else(malformed)?;

        if end < start {
            return Err(malformed());
        }

        Ok(TimeSpan { start, end })
    }

    /// Render as an SRT timing line
    pub fn timestring(&self) -> String {
        format!("{}{}{}", format_timestamp(self.start), TIMECODE_SEPARATOR, format_timestamp(self.end))
    }

    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Length of the intersection with `other`, zero when disjoint
    pub fn overlap(&self, other: &TimeSpan) -> i64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (end - start).max(0)
    }

    /// Inclusive intersection test; touching intervals count
    pub fn intersects(&self, other: &TimeSpan) -> bool {
        self.end >= other.start && self.start <= other.end
    }

    /// Exclusive intersection test; touching intervals do not count
    pub fn overlaps_strictly(&self, other: &TimeSpan) -> bool {
        self.end > other.start && self.start < other.end
    }

    /// Smallest span covering both
    pub fn union(&self, other: &TimeSpan) -> TimeSpan {
        TimeSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Silence between the end of `self` and the start of `later` (negative when they overlap)
    pub fn gap_to(&self, later: &TimeSpan) -> i64 {
        later.start - self.end
    }

    /// Apply a constant offset; results below zero saturate at zero
    pub fn shifted(&self, offset_micros: i64) -> TimeSpan {
        TimeSpan {
            start: self.start.saturating_add(offset_micros).max(0),
            end: self.end.saturating_add(offset_micros).max(0),
        }
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.timestring())
    }
}

/// Anything that occupies an interval on the film timeline
pub trait Timed {
    fn span(&self) -> TimeSpan;

    fn start(&self) -> i64 {
        self.span().start
    }

    fn end(&self) -> i64 {
        self.span().end
    }
}

impl Timed for TimeSpan {
    fn span(&self) -> TimeSpan {
        *self
    }
}

impl<T: Timed + ?Sized> Timed for &T {
    fn span(&self) -> TimeSpan {
        (**self).span()
    }
}

/// Overlap between any two timed items
pub fn overlap<A: Timed + ?Sized, B: Timed + ?Sized>(a: &A, b: &B) -> i64 {
    a.span().overlap(&b.span())
}

/// Parse a single `HH:MM:SS,mmm` timestamp into microseconds
pub fn parse_timestamp(timestamp: &str) -> Result<i64, SubtitleError> {
    let trimmed = timestamp.trim();
    TIMESTAMP_REGEX
        .captures(trimmed)
        .and_then(|caps| timestamp_from_captures(&caps, 1))
        .ok_or_else(|| SubtitleError::MalformedTimecode { line: trimmed.to_string() })
}

/// Format microseconds as `HH:MM:SS,mmm` (millisecond precision, truncating)
pub fn format_timestamp(micros: i64) -> String {
    let millis_total = micros.max(0) / 1_000;
    let hours = millis_total / 3_600_000;
    let minutes = (millis_total % 3_600_000) / 60_000;
    let seconds = (millis_total % 60_000) / 1_000;
    let millis = millis_total % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Convert a threshold given in (possibly fractional) seconds
pub fn seconds_to_micros(seconds: f64) -> i64 {
    (seconds * MICROSECONDS_PER_SECOND as f64).round() as i64
}

pub fn micros_to_seconds(micros: i64) -> f64 {
    micros as f64 / MICROSECONDS_PER_SECOND as f64
}

fn timestamp_from_captures(caps: &regex::Captures, start_idx: usize) -> Option<i64> {
    let field = |offset: usize| -> Option<i64> {
        caps.get(start_idx + offset)?.as_str().parse().ok()
    };
    let hours = field(0)?;
    let minutes = field(1)?;
    let seconds = field(2)?;
    let millis = field(3)?;

    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)?
        .checked_mul(1000)?
        .checked_add(millis)?
        .checked_mul(1000)
}
