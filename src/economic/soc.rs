//! SOC code standardization and occupation-group defaults.
//!
//! Standard Occupational Classification codes arrive in many shapes
//! (`151252`, `15.1252`, `15-1252.00`, ...). [`SocCodeMapper`] reduces them
//! to the canonical `XX-XXXX` form, validated against the 23 BLS major
//! groups, and supplies per-group automation/augmentation defaults for
//! occupations without direct impact data.
//!
//! ## Example
//!
//! ```rust
//! use ailmi::economic::soc::SocCodeMapper;
//!
//! let mapper = SocCodeMapper::default();
//! let code = mapper.standardize("15-1252.00").unwrap();
//! assert_eq!(code.as_str(), "15-1252");
//! assert_eq!(mapper.major_group_name("151252"), Some("Computer and Mathematical Occupations"));
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A canonical `XX-XXXX` SOC code whose major group is one of the 23 BLS groups.
///
/// Only constructed through [`SocCodeMapper::standardize`] or the strict
/// canonical check in [`SocCode::from_canonical`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SocCode(String);

impl SocCode {
    /// Accept only an already-canonical code with a known major group.
    pub fn from_canonical(code: &str) -> Option<Self> {
        let bytes = code.as_bytes();
        let shape_ok = bytes.len() == 7
            && bytes[2] == b'-'
            && bytes[..2].iter().all(u8::is_ascii_digit)
            && bytes[3..].iter().all(u8::is_ascii_digit);
        if shape_ok && is_major_group(&code[..2]) {
            Some(Self(code.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-digit major group prefix, e.g. `"15"`.
    pub fn major_group(&self) -> &str {
        &self.0[..2]
    }

    /// The six digits without the dash, as used in BLS series ids.
    pub fn digits(&self) -> String {
        self.0.replace('-', "")
    }
}

impl fmt::Display for SocCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SocCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_canonical(&value).ok_or_else(|| format!("not a canonical SOC code: {value}"))
    }
}

impl From<SocCode> for String {
    fn from(code: SocCode) -> Self {
        code.0
    }
}

/// One BLS major occupational group with its AI susceptibility defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocGroup {
    pub code: String,
    pub name: String,
    pub automation: f64,
    pub augmentation: f64,
}

/// Automation/augmentation pair used when an occupation has no direct data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SusceptibilityDefaults {
    pub automation: f64,
    pub augmentation: f64,
}

/// Used when a code fails to standardize or its group has no entry.
pub const FALLBACK_SUSCEPTIBILITY: SusceptibilityDefaults = SusceptibilityDefaults {
    automation: 0.45,
    augmentation: 0.35,
};

const MAJOR_GROUPS: [(&str, &str, f64, f64); 23] = [
    ("11", "Management Occupations", 0.15, 0.60),
    ("13", "Business and Financial Operations Occupations", 0.35, 0.70),
    ("15", "Computer and Mathematical Occupations", 0.25, 0.80),
    ("17", "Architecture and Engineering Occupations", 0.30, 0.65),
    ("19", "Life, Physical, and Social Science Occupations", 0.20, 0.75),
    ("21", "Community and Social Service Occupations", 0.40, 0.50),
    ("23", "Legal Occupations", 0.25, 0.60),
    ("25", "Educational Instruction and Library Occupations", 0.20, 0.70),
    ("27", "Arts, Design, Entertainment, Sports, and Media Occupations", 0.15, 0.65),
    ("29", "Healthcare Practitioners and Technical Occupations", 0.30, 0.70),
    ("31", "Healthcare Support Occupations", 0.45, 0.40),
    ("33", "Protective Service Occupations", 0.50, 0.35),
    ("35", "Food Preparation and Serving Related Occupations", 0.60, 0.25),
    ("37", "Building and Grounds Cleaning and Maintenance Occupations", 0.55, 0.30),
    ("39", "Personal Care and Service Occupations", 0.50, 0.40),
    ("41", "Sales and Related Occupations", 0.65, 0.30),
    ("43", "Office and Administrative Support Occupations", 0.70, 0.25),
    ("45", "Farming, Fishing, and Forestry Occupations", 0.60, 0.20),
    ("47", "Construction and Extraction Occupations", 0.45, 0.35),
    ("49", "Installation, Maintenance, and Repair Occupations", 0.50, 0.40),
    ("51", "Production Occupations", 0.75, 0.20),
    ("53", "Transportation and Material Moving Occupations", 0.80, 0.15),
    ("55", "Military Specific Occupations", 0.35, 0.45),
];

fn is_major_group(prefix: &str) -> bool {
    MAJOR_GROUPS.iter().any(|(code, ..)| *code == prefix)
}

/// Ordered NAICS supersector lookup used by the BLS OEWS collectors.
const INDUSTRY_NAICS: [(&str, &str); 12] = [
    ("Information", "51"),
    ("Professional and Business Services", "54"),
    ("Financial Activities", "52"),
    ("Education and Health Services", "62"),
    ("Manufacturing", "31-33"),
    ("Trade, Transportation, and Utilities", "44-45"),
    ("Construction", "23"),
    ("Leisure and Hospitality", "72"),
    ("Mining and Logging", "21"),
    ("Other Services", "81"),
    ("Government", "92"),
    ("Agriculture", "11"),
];

/// Per-group defaults table. Swappable in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SocGroupTable {
    groups: Vec<SocGroup>,
}

impl Default for SocGroupTable {
    fn default() -> Self {
        let groups = MAJOR_GROUPS
            .iter()
            .map(|&(code, name, automation, augmentation)| SocGroup {
                code: code.into(),
                name: name.into(),
                automation,
                augmentation,
            })
            .collect();
        Self { groups }
    }
}

impl SocGroupTable {
    pub fn new(groups: Vec<SocGroup>) -> Self {
        Self { groups }
    }

    pub fn get(&self, code: &str) -> Option<&SocGroup> {
        self.groups.iter().find(|g| g.code == code)
    }

    pub fn groups(&self) -> &[SocGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Result of checking a processed occupation map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OccupationDataReport {
    pub total_occupations: usize,
    pub valid_soc_codes: usize,
    pub invalid_soc_codes: Vec<String>,
    pub missing_fields: Vec<String>,
    pub warnings: Vec<String>,
    pub validation_passed: bool,
}

/// Standardizes SOC codes and looks up per-group defaults.
#[derive(Debug, Clone)]
pub struct SocCodeMapper {
    patterns: Vec<Regex>,
    groups: SocGroupTable,
}

impl Default for SocCodeMapper {
    fn default() -> Self {
        Self::new(SocGroupTable::default())
    }
}

impl SocCodeMapper {
    /// Build a mapper over the given group table.
    pub fn new(groups: SocGroupTable) -> Self {
        // Tried in order; each captures (group, detail).
        let patterns = [
            r"^([0-9]{2})-([0-9]{4})$",
            r"^([0-9]{2})-([0-9]{4})\.[0-9]{2}$",
            r"^([0-9]{2})([0-9]{4})$",
            r"^([0-9]{2})\.([0-9]{4})$",
            r"^([0-9]{2})\s+([0-9]{4})$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static SOC pattern"))
        .collect();

        Self { patterns, groups }
    }

    pub fn groups(&self) -> &SocGroupTable {
        &self.groups
    }

    /// Standardize a raw code to `XX-XXXX`, or `None` when no accepted
    /// format matches or the major group is unknown.
    pub fn standardize(&self, raw: &str) -> Option<SocCode> {
        let cleaned = raw.trim();
        if cleaned.is_empty() {
            return None;
        }

        for pattern in &self.patterns {
            if let Some(caps) = pattern.captures(cleaned) {
                let candidate = format!("{}-{}", &caps[1], &caps[2]);
                if let Some(code) = self.validate(&candidate) {
                    return Some(code);
                }
            }
        }

        tracing::debug!(raw, "could not standardize SOC code");
        None
    }

    fn validate(&self, candidate: &str) -> Option<SocCode> {
        let code = SocCode::from_canonical(candidate)?;
        self.groups.get(code.major_group()).map(|_| code)
    }

    /// Human-readable major group name for a raw code.
    pub fn major_group_name(&self, raw: &str) -> Option<&str> {
        let code = self.standardize(raw)?;
        self.groups
            .get(code.major_group())
            .map(|group| group.name.as_str())
    }

    /// Default automation/augmentation rates for the code's major group.
    pub fn ai_susceptibility_defaults(&self, raw: &str) -> SusceptibilityDefaults {
        self.standardize(raw)
            .map(|code| self.defaults_for(&code))
            .unwrap_or(FALLBACK_SUSCEPTIBILITY)
    }

    /// Same as [`Self::ai_susceptibility_defaults`] for an already standard code.
    pub fn defaults_for(&self, code: &SocCode) -> SusceptibilityDefaults {
        self.groups
            .get(code.major_group())
            .map(|group| SusceptibilityDefaults {
                automation: group.automation,
                augmentation: group.augmentation,
            })
            .unwrap_or(FALLBACK_SUSCEPTIBILITY)
    }

    /// Standardize every code independently. Unmappable entries map to `None`.
    pub fn validate_batch<S: AsRef<str>>(&self, codes: &[S]) -> BTreeMap<String, Option<SocCode>> {
        let results: BTreeMap<String, Option<SocCode>> = codes
            .iter()
            .map(|raw| (raw.as_ref().to_string(), self.standardize(raw.as_ref())))
            .collect();

        let successful = results.values().filter(|v| v.is_some()).count();
        tracing::info!(
            successful,
            total = codes.len(),
            "standardized SOC code batch"
        );
        results
    }

    /// Check a processed `{soc_code: {automation_rate, augmentation_rate, ..}}` map.
    pub fn validate_occupation_data(
        &self,
        occupations: &serde_json::Map<String, Value>,
    ) -> OccupationDataReport {
        let mut report = OccupationDataReport {
            total_occupations: occupations.len(),
            ..Default::default()
        };

        for (code, data) in occupations {
            if self.standardize(code).is_some() {
                report.valid_soc_codes += 1;
            } else {
                report.invalid_soc_codes.push(code.clone());
            }

            for field in ["automation_rate", "augmentation_rate"] {
                match data.get(field) {
                    None => report.missing_fields.push(format!("{code}: missing {field}")),
                    Some(value) => match value.as_f64() {
                        None => report
                            .warnings
                            .push(format!("{code}: {field} is not numeric")),
                        Some(v) if !(0.0..=1.0).contains(&v) => report
                            .warnings
                            .push(format!("{code}: {field} outside valid range [0,1]")),
                        Some(_) => {}
                    },
                }
            }
        }

        report.validation_passed =
            report.invalid_soc_codes.is_empty() && report.missing_fields.is_empty();
        report
    }
}

/// Map a supersector name to its NAICS code: exact, then case-insensitive,
/// then any shared word.
pub fn map_industry_to_naics(industry: &str) -> Option<&'static str> {
    if let Some((_, naics)) = INDUSTRY_NAICS.iter().find(|(name, _)| *name == industry) {
        return Some(naics);
    }

    let lower = industry.to_lowercase();
    if let Some((_, naics)) = INDUSTRY_NAICS
        .iter()
        .find(|(name, _)| name.to_lowercase() == lower)
    {
        return Some(naics);
    }

    for (name, naics) in INDUSTRY_NAICS {
        if name
            .split_whitespace()
            .any(|word| lower.contains(&word.to_lowercase()))
        {
            tracing::info!(industry, matched = name, naics, "partial NAICS match");
            return Some(naics);
        }
    }

    tracing::warn!(industry, "no NAICS mapping found");
    None
}

/// BLS OEWS national series id for an industry x occupation employment count.
pub fn bls_series_id(mapper: &SocCodeMapper, naics: &str, soc: &str) -> Option<String> {
    let code = mapper.standardize(soc)?;
    let naics_formatted = match naics {
        "31-33" => "310000".to_string(),
        "44-45" => "440000".to_string(),
        "48-49" => "480000".to_string(),
        other => format!("{other}0000").chars().take(6).collect(),
    };
    Some(format!("OEUS000000{naics_formatted}{}01", code.digits()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_codes_are_fixed_points() {
        let mapper = SocCodeMapper::default();
        for (group, ..) in MAJOR_GROUPS {
            let code = format!("{group}-1234");
            assert_eq!(mapper.standardize(&code).unwrap().as_str(), code);
        }
    }

    #[test]
    fn all_accepted_formats_standardize() {
        let mapper = SocCodeMapper::default();
        for raw in ["15-1252", "15-1252.00", "151252", "15.1252", "15 1252", "  15-1252 "] {
            assert_eq!(
                mapper.standardize(raw).map(|c| c.to_string()),
                Some("15-1252".to_string()),
                "{raw}"
            );
        }
    }

    #[test]
    fn rejects_letters_and_bad_groups() {
        let mapper = SocCodeMapper::default();
        assert!(mapper.standardize("15-1252 Software Developers").is_none());
        assert!(mapper.standardize("15-12a2").is_none());
        assert!(mapper.standardize("99-9999").is_none());
        assert!(mapper.standardize("15-99999").is_none());
        assert!(mapper.standardize("invalid").is_none());
        assert!(mapper.standardize("").is_none());
        assert!(mapper.standardize("   ").is_none());
    }

    #[test]
    fn defaults_cover_every_group() {
        let mapper = SocCodeMapper::default();
        assert_eq!(mapper.groups().len(), 23);
        for group in mapper.groups().groups() {
            let d = mapper.ai_susceptibility_defaults(&format!("{}-0000", group.code));
            assert!((0.0..=1.0).contains(&d.automation));
            assert!((0.0..=1.0).contains(&d.augmentation));
        }

        let transport = mapper.ai_susceptibility_defaults("53-3032");
        assert_eq!(transport.automation, 0.80);
        assert_eq!(transport.augmentation, 0.15);

        let computer = mapper.ai_susceptibility_defaults("151252");
        assert_eq!(computer.automation, 0.25);
        assert_eq!(computer.augmentation, 0.80);

        assert_eq!(mapper.ai_susceptibility_defaults("nope"), FALLBACK_SUSCEPTIBILITY);
        assert_eq!(mapper.ai_susceptibility_defaults("99-1111"), FALLBACK_SUSCEPTIBILITY);
    }

    #[test]
    fn major_group_name_standardizes_first() {
        let mapper = SocCodeMapper::default();
        assert_eq!(
            mapper.major_group_name("43 3031"),
            Some("Office and Administrative Support Occupations")
        );
        assert_eq!(mapper.major_group_name("43-30"), None);
    }

    #[test]
    fn batch_never_fails_as_a_whole() {
        let mapper = SocCodeMapper::default();
        let out = mapper.validate_batch(&["151252", "junk", "29-1141"]);
        assert_eq!(out.len(), 3);
        assert_eq!(out["151252"].as_ref().unwrap().as_str(), "15-1252");
        assert!(out["junk"].is_none());
    }

    #[test]
    fn serde_accepts_only_canonical_codes() {
        let code: SocCode = serde_json::from_str("\"15-1252\"").unwrap();
        assert_eq!(code.major_group(), "15");
        assert!(serde_json::from_str::<SocCode>("\"151252\"").is_err());
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"15-1252\"");
    }

    #[test]
    fn naics_lookup_falls_back_to_partial_words() {
        assert_eq!(map_industry_to_naics("Information"), Some("51"));
        assert_eq!(map_industry_to_naics("manufacturing"), Some("31-33"));
        assert_eq!(map_industry_to_naics("Health Care"), Some("62"));
        // first table entry sharing a word wins
        assert_eq!(map_industry_to_naics("Financial Services"), Some("54"));
        assert_eq!(map_industry_to_naics("Xyzzy"), None);
    }

    #[test]
    fn bls_series_id_formats_special_naics() {
        let mapper = SocCodeMapper::default();
        assert_eq!(
            bls_series_id(&mapper, "31-33", "15-1252").as_deref(),
            Some("OEUS00000031000015125201")
        );
        assert_eq!(
            bls_series_id(&mapper, "51", "151252").as_deref(),
            Some("OEUS00000051000015125201")
        );
        assert!(bls_series_id(&mapper, "51", "bad").is_none());
    }

    #[test]
    fn occupation_data_report_flags_problems() {
        let mapper = SocCodeMapper::default();
        let data = serde_json::json!({
            "15-1252": {"automation_rate": 0.3, "augmentation_rate": 0.7},
            "bogus": {"automation_rate": "high"},
            "43-3031": {"automation_rate": 1.4, "augmentation_rate": 0.2}
        });
        let report = mapper.validate_occupation_data(data.as_object().unwrap());
        assert_eq!(report.total_occupations, 3);
        assert_eq!(report.valid_soc_codes, 2);
        assert_eq!(report.invalid_soc_codes, vec!["bogus".to_string()]);
        assert_eq!(report.missing_fields.len(), 1);
        assert_eq!(report.warnings.len(), 2);
        assert!(!report.validation_passed);
    }
}
