//! Title-based SOC inference.
//!
//! Occupation records from third-party sources sometimes carry only a job
//! title. The classifier matches the lowercased title against an ordered
//! list of regular expressions, each naming a detailed SOC code. The first
//! matching pattern wins.
//!
//! ## Example
//!
//! ```rust
//! use ailmi::economic::classifier::TitleClassifier;
//!
//! let classifier = TitleClassifier::new();
//! let matched = classifier.classify("Senior Software Engineer").unwrap();
//! assert_eq!(matched.soc_code, "15-1252");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A title pattern with the SOC code it implies.
#[derive(Debug, Clone)]
pub struct TitlePattern {
    pub regex: Regex,
    pub soc_code: &'static str,
}

/// Result of inferring a SOC code from a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleMatch {
    /// Raw (not yet standardized) SOC code
    pub soc_code: String,
    /// Source of the pattern that matched
    pub pattern: String,
}

/// Ordered title → SOC pattern table.
#[derive(Debug, Clone)]
pub struct TitleClassifier {
    patterns: Vec<TitlePattern>,
}

impl Default for TitleClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleClassifier {
    /// Create a classifier with the built-in pattern table.
    pub fn new() -> Self {
        Self {
            patterns: Self::load_patterns(),
        }
    }

    fn load_patterns() -> Vec<TitlePattern> {
        [
            // Computer and mathematical
            (r"software\s+(developer|engineer|programmer)", "15-1252"),
            (r"data\s+scientist", "15-2051"),
            (r"computer\s+programmer", "15-1251"),
            (r"web\s+developer", "15-1254"),
            (r"database\s+administrator", "15-1141"),
            (r"information\s+security", "15-1122"),
            // Business and financial
            (r"financial\s+analyst", "13-2051"),
            (r"market\s+research\s+analyst", "13-1161"),
            (r"accountant", "13-2011"),
            (r"budget\s+analyst", "13-2031"),
            // Management
            (r"general\s+manager", "11-1021"),
            (r"operations\s+manager", "11-1021"),
            (r"chief\s+executive", "11-1011"),
            // Office and administrative support
            (r"customer\s+service", "43-4051"),
            (r"secretary", "43-6014"),
            (r"bookkeeping\s+clerk", "43-3031"),
            // Healthcare practitioners
            (r"registered\s+nurse", "29-1141"),
            (r"physician", "29-1062"),
            (r"pharmacist", "29-1051"),
        ]
        .into_iter()
        .map(|(pattern, soc_code)| TitlePattern {
            regex: Regex::new(pattern).expect("static title pattern"),
            soc_code,
        })
        .collect()
    }

    /// Infer a SOC code from an occupation title.
    pub fn classify(&self, title: &str) -> Option<TitleMatch> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        let lower = title.to_lowercase();
        let matched = self.patterns.iter().find(|p| p.regex.is_match(&lower))?;
        tracing::debug!(title, soc_code = matched.soc_code, "inferred SOC code from title");

        Some(TitleMatch {
            soc_code: matched.soc_code.to_string(),
            pattern: matched.regex.as_str().to_string(),
        })
    }

    /// All patterns, in match order.
    pub fn patterns(&self) -> &[TitlePattern] {
        &self.patterns
    }
}
