//! Quality bands for coverage and confidence scores.
//!
//! Industry rate records carry two scores in `[0, 1]`: data coverage and
//! confidence. Both are reported in three bands for summaries and validator
//! warnings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse band of a coverage or confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBand {
    /// Coverage >= 70%, or confidence >= 0.7
    High,
    /// Coverage 30-70%, or confidence 0.4-0.7
    Medium,
    /// Everything below
    Low,
}

impl QualityBand {
    /// Band of an employment-weighted data coverage fraction.
    pub fn from_coverage(coverage: f64) -> Self {
        match coverage {
            c if c >= 0.7 => Self::High,
            c if c >= 0.3 => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Band of a confidence score.
    pub fn from_confidence(confidence: f64) -> Self {
        match confidence {
            c if c >= 0.7 => Self::High,
            c if c >= 0.4 => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Whether the score counts against the validator's low-band warnings.
    pub fn needs_attention(&self) -> bool {
        matches!(self, Self::Low)
    }
}

impl fmt::Display for QualityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let band = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_bands_use_closed_lower_bounds() {
        assert_eq!(QualityBand::from_coverage(1.0), QualityBand::High);
        assert_eq!(QualityBand::from_coverage(0.7), QualityBand::High);
        assert_eq!(QualityBand::from_coverage(0.6999), QualityBand::Medium);
        assert_eq!(QualityBand::from_coverage(0.3), QualityBand::Medium);
        assert_eq!(QualityBand::from_coverage(0.2999), QualityBand::Low);
        assert_eq!(QualityBand::from_coverage(0.0), QualityBand::Low);
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(QualityBand::from_confidence(0.75), QualityBand::High);
        assert_eq!(QualityBand::from_confidence(0.4), QualityBand::Medium);
        assert_eq!(QualityBand::from_confidence(0.39), QualityBand::Low);
    }

    #[test]
    fn only_low_needs_attention() {
        assert!(!QualityBand::High.needs_attention());
        assert!(!QualityBand::Medium.needs_attention());
        assert!(QualityBand::Low.needs_attention());
    }

    #[test]
    fn display_and_serde_agree() {
        assert_eq!(QualityBand::Medium.to_string(), "medium");
        assert_eq!(
            serde_json::to_string(&QualityBand::High).unwrap(),
            "\"high\""
        );
    }
}
