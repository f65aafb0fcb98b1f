//! Tracker configuration.

use serde::{Deserialize, Serialize};

/// Tuning for the progress service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Fraction of a lesson's running time after which clients are told the
    /// lesson may be marked completed. Advisory only: completion is still
    /// set exclusively by an explicit report.
    pub watch_completion_ratio: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            watch_completion_ratio: 0.9,
        }
    }
}

impl TrackerConfig {
    /// The ratio as a whole percentage. A ratio that is not a number in
    /// `0..=1` falls back to the default.
    pub fn completion_threshold_percent(&self) -> u8 {
        let ratio = if (0.0..=1.0).contains(&self.watch_completion_ratio) {
            self.watch_completion_ratio
        } else {
            Self::default().watch_completion_ratio
        };
        (ratio * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threshold(ratio: f32) -> u8 {
        TrackerConfig { watch_completion_ratio: ratio }.completion_threshold_percent()
    }

    #[test]
    fn test_threshold_from_ratio() {
        assert_eq!(TrackerConfig::default().completion_threshold_percent(), 90);
        assert_eq!(threshold(0.75), 75);
        assert_eq!(threshold(1.0), 100);
        assert_eq!(threshold(0.0), 0);
    }

    #[test]
    fn test_invalid_ratio_uses_default() {
        assert_eq!(threshold(f32::NAN), 90);
        assert_eq!(threshold(f32::INFINITY), 90);
        assert_eq!(threshold(-1.0), 90);
        assert_eq!(threshold(1.5), 90);
    }
}
