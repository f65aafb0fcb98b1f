//! Lesson duration labels.
//!
//! Lessons carry their running time as a display label such as `"10:32"`
//! (or `"1:05:00"` for long recordings). The watch-ratio computation needs
//! that label as seconds.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Parsed running time of a lesson, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LessonDuration(u32);

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(?:(\d{1,3}):)?(\d{1,3}):([0-5]\d)\s*$").expect("static pattern compiles")
    })
}

impl LessonDuration {
    /// Build a duration from whole seconds.
    pub fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Parse a `mm:ss` or `h:mm:ss` label. Returns `None` for anything else.
    pub fn parse(label: &str) -> Option<Self> {
        let caps = label_pattern().captures(label)?;
        let hours: u32 = match caps.get(1) {
            Some(h) => h.as_str().parse().ok()?,
            None => 0,
        };
        let minutes: u32 = caps[2].parse().ok()?;
        let seconds: u32 = caps[3].parse().ok()?;

        // h:mm:ss keeps minutes below an hour
        if caps.get(1).is_some() && minutes >= 60 {
            return None;
        }

        Some(Self(hours * 3600 + minutes * 60 + seconds))
    }

    /// Total seconds.
    pub fn as_secs(&self) -> u32 {
        self.0
    }

    /// Percentage of this duration covered by `watched` seconds, floored and
    /// capped at 100. A zero-length duration reports 0.
    pub fn watched_percent(&self, watched: u32) -> u8 {
        if self.0 == 0 {
            return 0;
        }
        let covered = u64::from(watched.min(self.0));
        (covered * 100 / u64::from(self.0)) as u8
    }
}

impl std::fmt::Display for LessonDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hours = self.0 / 3600;
        let minutes = (self.0 % 3600) / 60;
        let seconds = self.0 % 60;
        if hours > 0 {
            write!(f, "{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            write!(f, "{:02}:{:02}", minutes, seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes_seconds() {
        assert_eq!(LessonDuration::parse("10:32").map(|d| d.as_secs()), Some(632));
        assert_eq!(LessonDuration::parse("0:05").map(|d| d.as_secs()), Some(5));
        assert_eq!(LessonDuration::parse("125:00").map(|d| d.as_secs()), Some(7500));
    }

    #[test]
    fn test_parse_hours() {
        assert_eq!(LessonDuration::parse("1:05:00").map(|d| d.as_secs()), Some(3900));
        assert!(LessonDuration::parse("1:75:00").is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(LessonDuration::parse("").is_none());
        assert!(LessonDuration::parse("8 semanas").is_none());
        assert!(LessonDuration::parse("10:75").is_none());
        assert!(LessonDuration::parse("-1:00").is_none());
    }

    #[test]
    fn test_watched_percent_floors_and_caps() {
        let d = LessonDuration::from_secs(300);
        assert_eq!(d.watched_percent(0), 0);
        assert_eq!(d.watched_percent(269), 89);
        assert_eq!(d.watched_percent(270), 90);
        assert_eq!(d.watched_percent(10_000), 100);
        assert_eq!(LessonDuration::from_secs(0).watched_percent(50), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(LessonDuration::from_secs(632).to_string(), "10:32");
        assert_eq!(LessonDuration::from_secs(3900).to_string(), "1:05:00");
    }
}
