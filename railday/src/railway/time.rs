use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

pub const SECONDS_PER_DAY: i64 = 24 * 3600;

#[derive(Debug, Fail, PartialEq)]
pub enum ParseError {
    #[fail(display = "malformed clock string: {:?}", _0)]
    Malformed(String),
    #[fail(display = "clock field out of range: {:?}", _0)]
    OutOfRange(String),
}

/// Time of day, kept normalized so that minutes and seconds are below 60.
/// Hours are not wrapped; the day boundary is enforced by the simulation driver.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time {
    hours: u32,
    minutes: u32,
    seconds: u32,
}

impl Time {
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Time {
        Time::from_seconds(hours as i64 * 3600 + minutes as i64 * 60 + seconds as i64)
    }

    /// Negative totals are clamped to midnight.
    pub fn from_seconds(total: i64) -> Time {
        let total = total.max(0);
        Time {
            hours: (total / 3600) as u32,
            minutes: ((total % 3600) / 60) as u32,
            seconds: (total % 60) as u32,
        }
    }

    pub fn hours(&self) -> u32 { self.hours }
    pub fn minutes(&self) -> u32 { self.minutes }
    pub fn seconds(&self) -> u32 { self.seconds }

    pub fn to_seconds(&self) -> i64 {
        self.hours as i64 * 3600 + self.minutes as i64 * 60 + self.seconds as i64
    }

    pub fn add_seconds(&mut self, dt: i64) {
        *self = Time::from_seconds(self.to_seconds() + dt);
    }
}

/// Signed difference in seconds.
impl Sub for Time {
    type Output = i64;
    fn sub(self, other: Time) -> i64 {
        self.to_seconds() - other.to_seconds()
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

lazy_static! {
    static ref CLOCK_RE: Regex =
        Regex::new(r"^\s*(\d{1,2}):(\d{2})(?::(\d{2}))?\s*$").expect("clock regex");
}

/// Parses `HH:MM:SS` or `HH:MM`.
impl FromStr for Time {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Time, ParseError> {
        let groups = CLOCK_RE.captures(s).ok_or_else(|| ParseError::Malformed(s.to_string()))?;
        let field = |i: usize| -> Result<u32, ParseError> {
            match groups.get(i) {
                Some(m) => m.as_str().parse::<u32>().map_err(|_e| ParseError::Malformed(s.to_string())),
                None => Ok(0),
            }
        };
        let (h, m, sec) = (field(1)?, field(2)?, field(3)?);
        if h > 47 || m > 59 || sec > 59 {
            return Err(ParseError::OutOfRange(s.to_string()));
        }
        Ok(Time::new(h, m, sec))
    }
}

impl Serialize for Time {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Time {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Time, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
