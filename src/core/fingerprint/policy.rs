//! Threshold policy turning distortion scores into match kinds.

use super::MatchKind;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Two thresholds on the distortion score.
///
/// `score < low` is identical, `low <= score < high` is similar, anything
/// else is not a match. Lowering either threshold can only remove matches
/// or downgrade identical to similar, never add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchPolicy {
    low: f64,
    high: f64,
}

impl MatchPolicy {
    /// Build a policy, rejecting non-finite or inverted thresholds
    pub fn new(low: f64, high: f64) -> Result<Self, ConfigError> {
        let valid = low.is_finite() && high.is_finite() && 0.0 <= low && low <= high;
        if !valid {
            return Err(ConfigError::InvalidThresholds { low, high });
        }
        Ok(Self { low, high })
    }

    /// Classify a score. NaN scores never match.
    pub fn classify(&self, score: f64) -> Option<MatchKind> {
        if score < self.low {
            Some(MatchKind::Identical)
        } else if score < self.high {
            Some(MatchKind::Similar)
        } else {
            None
        }
    }

    /// Human-readable summary, printed by `find-duplicates` before its totals
    pub fn description(&self) -> String {
        format!(
            "identical below {:.2}% of pixels differing, similar below {:.2}%",
            self.low * 100.0,
            self.high * 100.0
        )
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            low: 0.01,
            high: 0.10,
        }
    }
}
