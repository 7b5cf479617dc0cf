// time.rs — Wall-clock time of day in canonical `HH:mm` form.
//
// Schedule rules, overrides and occurrences all carry a time of day without a
// date or zone. The canonical wire form is exactly five characters, two-digit
// hour 00–23 and two-digit minute 00–59. Anything looser ("9", "9am") is only
// accepted by the repair pass, never by strict parsing.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A time of day with minute precision, serialized as `"HH:mm"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Build from hour and minute. Returns `None` when out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(TimeOfDay)
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// The underlying chrono time (seconds are always zero).
    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }

    /// Strict `HH:mm` parse. This is the only form the validator accepts.
    pub fn parse_strict(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return None;
        }
        if !bytes[..2].iter().chain(&bytes[3..]).all(u8::is_ascii_digit) {
            return None;
        }
        let hour: u32 = s[..2].parse().ok()?;
        let minute: u32 = s[3..].parse().ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }
        Self::from_hm(hour, minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Error returned when a string is not a canonical `HH:mm` time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time '{0}': expected HH:mm between 00:00 and 23:59")]
pub struct InvalidTime(pub String);

impl FromStr for TimeOfDay {
    type Err = InvalidTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_strict(s).ok_or_else(|| InvalidTime(s.to_string()))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_accepts_canonical_times() {
        assert_eq!(TimeOfDay::parse_strict("00:00"), TimeOfDay::from_hm(0, 0));
        assert_eq!(TimeOfDay::parse_strict("23:59"), TimeOfDay::from_hm(23, 59));
        assert_eq!(TimeOfDay::parse_strict("07:30"), TimeOfDay::from_hm(7, 30));
    }

    #[test]
    fn strict_parse_rejects_loose_forms() {
        for bad in ["9", "9:00", "9am", "24:00", "12:60", "12-30", " 12:30", "ab:cd"] {
            assert!(TimeOfDay::parse_strict(bad).is_none(), "accepted {bad:?}");
        }
    }

    #[test]
    fn display_is_zero_padded() {
        let t = TimeOfDay::from_hm(6, 5).unwrap();
        assert_eq!(t.to_string(), "06:05");
    }

    #[test]
    fn serde_uses_hh_mm_strings() {
        let t = TimeOfDay::from_hm(18, 45).unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"18:45\"");
        let restored: TimeOfDay = serde_json::from_str("\"18:45\"").unwrap();
        assert_eq!(restored, t);
        assert!(serde_json::from_str::<TimeOfDay>("\"6pm\"").is_err());
    }

    #[test]
    fn ordering_follows_clock() {
        let early = TimeOfDay::from_hm(8, 0).unwrap();
        let late = TimeOfDay::from_hm(20, 0).unwrap();
        assert!(early < late);
    }
}
