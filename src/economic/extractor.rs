//! Occupation Impact Extractor.
//!
//! Turns heterogeneous third-party occupation records into a uniform map
//! keyed by canonical SOC code. Field names vary between releases of the
//! source data, so every field is read through a list of candidate keys.
//!
//! A record is dropped (and counted) when no SOC code can be found or
//! inferred, or when the code does not standardize. Missing rates are
//! filled from the major-group defaults and counted as estimated. Only an
//! input with no recognizable occupation list at all produces the `error`
//! sentinel.

use super::classifier::TitleClassifier;
use super::soc::{SocCode, SocCodeMapper};
use super::stats;
use crate::error::{ImpactError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

const SOURCE_NAME: &str = "Anthropic Economic Index";
const NO_DATA_ERROR: &str = "No occupation data found in Anthropic dataset";

const LIST_KEYS: [&str; 5] = [
    "occupations",
    "occupation_data",
    "detailed_occupations",
    "soc_occupations",
    "occupation_breakdown",
];
const WRAPPER_KEYS: [&str; 2] = ["combined", "datasets"];
const WRAPPED_LIST_KEYS: [&str; 2] = ["occupation_usage", "occupation_automation"];

const AUTOMATION_KEYS: [&str; 5] = [
    "automation_rate",
    "automation",
    "auto_rate",
    "displacement_rate",
    "automation_potential",
];
const AUGMENTATION_KEYS: [&str; 5] = [
    "augmentation_rate",
    "augmentation",
    "aug_rate",
    "enhancement_rate",
    "augmentation_potential",
];

const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Where an occupation's SOC code came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactSource {
    /// The record carried a `soc_code` field.
    AnthropicDirect,
    /// Code taken from an alternate field or inferred from the title.
    SocInferred,
}

/// Uniform per-occupation impact record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupationImpact {
    pub title: String,
    pub automation_rate: f64,
    pub augmentation_rate: f64,
    pub confidence: f64,
    pub task_count: usize,
    pub raw_soc_code: String,
    pub major_group: Option<String>,
    pub source: ImpactSource,
}

/// Diagnostic counters. Never cause an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub total_occupations: usize,
    pub successfully_mapped: usize,
    pub missing_soc_codes: usize,
    pub invalid_soc_codes: usize,
    pub estimated_missing: usize,
    /// List entries that were not objects.
    pub malformed_records: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub average_automation_rate: f64,
    pub average_augmentation_rate: f64,
    pub average_confidence: f64,
    pub automation_augmentation_ratio: f64,
    pub min_automation: f64,
    pub max_automation: f64,
    pub min_augmentation: f64,
    pub max_augmentation: f64,
    pub total_occupations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorGroupCoverage {
    pub count: usize,
    pub avg_automation: f64,
    pub avg_augmentation: f64,
    pub group_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataCoverage {
    pub by_major_group: BTreeMap<String, MajorGroupCoverage>,
    /// Mapped records over records seen.
    pub overall_coverage: f64,
}

/// Output of [`OccupationExtractor::process`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupationImpactReport {
    pub processed_at: DateTime<Utc>,
    pub source: String,
    pub occupation_impacts: BTreeMap<SocCode, OccupationImpact>,
    pub summary_statistics: Option<SummaryStatistics>,
    pub processing_stats: ProcessingStats,
    pub data_coverage: DataCoverage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OccupationImpactReport {
    fn empty(stats: ProcessingStats) -> Self {
        Self {
            processed_at: Utc::now(),
            source: SOURCE_NAME.to_string(),
            occupation_impacts: BTreeMap::new(),
            summary_statistics: None,
            processing_stats: stats,
            data_coverage: DataCoverage::default(),
            error: Some(NO_DATA_ERROR.to_string()),
        }
    }

    /// Mean automation and augmentation over all extracted occupations.
    pub fn average_rates(&self) -> Option<(f64, f64)> {
        self.summary_statistics
            .map(|s| (s.average_automation_rate, s.average_augmentation_rate))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityFactors {
    pub soc_validity: f64,
    pub major_group_coverage: f64,
    pub data_completeness: f64,
}

/// Result of [`OccupationExtractor::validate_processed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedValidation {
    pub validation_passed: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub quality_score: f64,
    pub quality_factors: QualityFactors,
}

/// Extracts occupation impact records from raw JSON.
#[derive(Debug, Clone, Default)]
pub struct OccupationExtractor {
    mapper: SocCodeMapper,
    classifier: TitleClassifier,
}

enum Extracted {
    Mapped(SocCode, OccupationImpact),
    Dropped,
}

impl OccupationExtractor {
    pub fn new(mapper: SocCodeMapper) -> Self {
        Self {
            mapper,
            classifier: TitleClassifier::new(),
        }
    }

    pub fn mapper(&self) -> &SocCodeMapper {
        &self.mapper
    }

    /// Extract every recognizable occupation from `raw`.
    ///
    /// Errors only when `raw` is neither an object nor an array.
    pub fn process(&self, raw: &Value) -> Result<OccupationImpactReport> {
        tracing::info!("processing occupation impact data");

        let records = match raw {
            Value::Array(items) => Some(items.iter().collect::<Vec<_>>()),
            Value::Object(map) => find_occupation_list(map),
            other => {
                return Err(ImpactError::NotACollection(
                    value_kind(other).to_string(),
                ))
            }
        };

        let mut stats = ProcessingStats::default();
        let records = match records {
            Some(records) if !records.is_empty() => records,
            _ => {
                tracing::warn!("no occupation data found in input");
                return Ok(OccupationImpactReport::empty(stats));
            }
        };

        let mut impacts = BTreeMap::new();
        for record in &records {
            let Some(record) = record.as_object() else {
                stats.malformed_records += 1;
                continue;
            };
            // Later records with the same code replace earlier ones.
            if let Extracted::Mapped(code, impact) = self.extract_one(record, &mut stats) {
                impacts.insert(code, impact);
            }
        }

        let report = OccupationImpactReport {
            processed_at: Utc::now(),
            source: SOURCE_NAME.to_string(),
            summary_statistics: summary_statistics(&impacts),
            data_coverage: data_coverage(&impacts, &stats),
            occupation_impacts: impacts,
            processing_stats: stats,
            error: None,
        };
        log_summary(&report);
        Ok(report)
    }

    fn extract_one(&self, record: &Map<String, Value>, stats: &mut ProcessingStats) -> Extracted {
        stats.total_occupations += 1;

        let title = ["title", "occupation"]
            .iter()
            .find_map(|k| record.get(*k).and_then(Value::as_str))
            .unwrap_or("Unknown")
            .to_string();

        let mut automation = read_rate(record, &AUTOMATION_KEYS);
        let mut augmentation = read_rate(record, &AUGMENTATION_KEYS);

        let source = if read_code(record, "soc_code").is_some() {
            ImpactSource::AnthropicDirect
        } else {
            ImpactSource::SocInferred
        };

        let raw_code = match read_code(record, "soc_code").or_else(|| read_code(record, "soc")) {
            Some(code) => code,
            None => {
                stats.missing_soc_codes += 1;
                match self.classifier.classify(&title) {
                    Some(matched) => matched.soc_code,
                    None => {
                        tracing::warn!(%title, "no SOC code available for occupation");
                        return Extracted::Dropped;
                    }
                }
            }
        };

        let Some(code) = self.mapper.standardize(&raw_code) else {
            stats.invalid_soc_codes += 1;
            tracing::warn!(%raw_code, %title, "invalid SOC code for occupation");
            return Extracted::Dropped;
        };

        if automation.is_none() || augmentation.is_none() {
            let defaults = self.mapper.defaults_for(&code);
            if automation.is_none() {
                automation = Some(defaults.automation);
                stats.estimated_missing += 1;
            }
            if augmentation.is_none() {
                augmentation = Some(defaults.augmentation);
                stats.estimated_missing += 1;
            }
            tracing::debug!(%title, soc = %code, "used SOC group defaults for missing rates");
        }

        let confidence = ["confidence", "data_quality"]
            .iter()
            .find_map(|k| record.get(*k).and_then(read_number))
            .map(|c| c.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_CONFIDENCE);

        let task_count = record
            .get("tasks")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);

        let major_group = self
            .mapper
            .groups()
            .get(code.major_group())
            .map(|g| g.name.clone());

        stats.successfully_mapped += 1;
        let impact = OccupationImpact {
            title,
            automation_rate: automation.unwrap_or_default(),
            augmentation_rate: augmentation.unwrap_or_default(),
            confidence,
            task_count,
            raw_soc_code: raw_code,
            major_group,
            source,
        };
        Extracted::Mapped(code, impact)
    }

    /// Score a processed report on SOC validity, major group breadth and
    /// field completeness.
    pub fn validate_processed(&self, report: &OccupationImpactReport) -> Result<ProcessedValidation> {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        let as_json = serde_json::to_value(&report.occupation_impacts)?;
        let empty = Map::new();
        let occupations = as_json.as_object().unwrap_or(&empty);
        let soc_report = self.mapper.validate_occupation_data(occupations);
        if !soc_report.validation_passed {
            warnings.extend(soc_report.warnings.iter().cloned());
            errors.extend(soc_report.invalid_soc_codes.iter().cloned());
        }

        let groups_covered: BTreeSet<&str> = report
            .occupation_impacts
            .keys()
            .map(SocCode::major_group)
            .collect();
        let coverage_ratio = groups_covered.len() as f64 / self.mapper.groups().len().max(1) as f64;
        if coverage_ratio < 0.3 {
            warnings.push(format!(
                "Low SOC major group coverage: {:.1}%",
                coverage_ratio * 100.0
            ));
        }

        let n = occupations.len();
        let factors = QualityFactors {
            soc_validity: soc_report.valid_soc_codes as f64 / n.max(1) as f64,
            major_group_coverage: coverage_ratio,
            data_completeness: 1.0 - soc_report.missing_fields.len() as f64 / (n * 2).max(1) as f64,
        };
        let quality_score =
            (factors.soc_validity + factors.major_group_coverage + factors.data_completeness) / 3.0;

        Ok(ProcessedValidation {
            validation_passed: errors.is_empty(),
            warnings,
            errors,
            quality_score,
            quality_factors: factors,
        })
    }
}

fn find_occupation_list(map: &Map<String, Value>) -> Option<Vec<&Value>> {
    if let Some(list) = direct_list(map) {
        return Some(list.iter().collect());
    }
    if let Some(list) = map.get("data").and_then(Value::as_object).and_then(direct_list) {
        return Some(list.iter().collect());
    }
    let wrapper = WRAPPER_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_object))?;
    let records: Vec<&Value> = WRAPPED_LIST_KEYS
        .iter()
        .filter_map(|key| wrapped_list(wrapper.get(*key)?))
        .flatten()
        .collect();
    tracing::info!(count = records.len(), "extracted occupations from wrapped data");
    Some(records)
}

fn direct_list(map: &Map<String, Value>) -> Option<&[Value]> {
    LIST_KEYS.iter().find_map(|key| {
        let list = map.get(*key)?.as_array()?;
        tracing::info!(key, "found occupation data");
        Some(list.as_slice())
    })
}

fn wrapped_list(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Array(items) => Some(items.as_slice()),
        Value::Object(inner) => inner
            .get("occupations")
            .and_then(Value::as_array)
            .map(Vec::as_slice),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Finite number from a JSON number or numeric string (`"%"` stripped).
fn read_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.replace('%', "").trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// First parseable rate among `keys`; values above 1 are percentages.
fn read_rate(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        let value = read_number(record.get(*key)?)?;
        let rate = if value > 1.0 { value / 100.0 } else { value };
        Some(rate.clamp(0.0, 1.0))
    })
}

fn read_code(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn summary_statistics(impacts: &BTreeMap<SocCode, OccupationImpact>) -> Option<SummaryStatistics> {
    if impacts.is_empty() {
        return None;
    }
    let automation: Vec<f64> = impacts.values().map(|o| o.automation_rate).collect();
    let augmentation: Vec<f64> = impacts.values().map(|o| o.augmentation_rate).collect();
    let confidence: Vec<f64> = impacts.values().map(|o| o.confidence).collect();

    let aug_sum: f64 = augmentation.iter().sum();
    let min = |v: &[f64]| v.iter().copied().fold(f64::INFINITY, f64::min);
    let max = |v: &[f64]| v.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(SummaryStatistics {
        average_automation_rate: stats::mean(&automation),
        average_augmentation_rate: stats::mean(&augmentation),
        average_confidence: stats::mean(&confidence),
        automation_augmentation_ratio: if aug_sum > 0.0 {
            automation.iter().sum::<f64>() / aug_sum
        } else {
            0.0
        },
        min_automation: min(&automation),
        max_automation: max(&automation),
        min_augmentation: min(&augmentation),
        max_augmentation: max(&augmentation),
        total_occupations: impacts.len(),
    })
}

fn data_coverage(
    impacts: &BTreeMap<SocCode, OccupationImpact>,
    stats: &ProcessingStats,
) -> DataCoverage {
    let mut by_major_group: BTreeMap<String, MajorGroupCoverage> = BTreeMap::new();
    for (code, impact) in impacts {
        let entry = by_major_group
            .entry(code.major_group().to_string())
            .or_insert_with(|| MajorGroupCoverage {
                count: 0,
                avg_automation: 0.0,
                avg_augmentation: 0.0,
                group_name: impact.major_group.clone(),
            });
        entry.count += 1;
        entry.avg_automation += impact.automation_rate;
        entry.avg_augmentation += impact.augmentation_rate;
    }
    for group in by_major_group.values_mut() {
        group.avg_automation /= group.count as f64;
        group.avg_augmentation /= group.count as f64;
    }

    DataCoverage {
        by_major_group,
        overall_coverage: impacts.len() as f64 / stats.total_occupations.max(1) as f64,
    }
}

fn log_summary(report: &OccupationImpactReport) {
    let s = &report.processing_stats;
    let success_rate = if s.total_occupations > 0 {
        s.successfully_mapped as f64 / s.total_occupations as f64
    } else {
        0.0
    };
    tracing::info!(
        total = s.total_occupations,
        mapped = s.successfully_mapped,
        missing_soc = s.missing_soc_codes,
        invalid_soc = s.invalid_soc_codes,
        estimated = s.estimated_missing,
        malformed = s.malformed_records,
        success_rate,
        "occupation processing summary"
    );
    if let Some(summary) = &report.summary_statistics {
        tracing::info!(
            avg_automation = summary.average_automation_rate,
            avg_augmentation = summary.average_augmentation_rate,
            "occupation rate averages"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extractor() -> OccupationExtractor {
        OccupationExtractor::default()
    }

    fn code(s: &str) -> SocCode {
        SocCode::from_canonical(s).unwrap()
    }

    #[test]
    fn reads_alternate_field_names_and_percentages() {
        let raw = json!({"occupations": [
            {"occupation": "Analyst", "soc": "132051", "automation": "35%", "aug_rate": 60},
            {"title": "Dev", "soc_code": "15-1252.00", "automation_potential": 0.2,
             "enhancement_rate": "0.75", "data_quality": 0.9, "tasks": ["a", "b"]}
        ]});
        let report = extractor().process(&raw).unwrap();
        assert!(report.error.is_none());

        let analyst = &report.occupation_impacts[&code("13-2051")];
        assert_eq!(analyst.title, "Analyst");
        assert!((analyst.automation_rate - 0.35).abs() < 1e-12);
        assert!((analyst.augmentation_rate - 0.60).abs() < 1e-12);
        assert_eq!(analyst.confidence, 0.5);
        assert_eq!(analyst.source, ImpactSource::SocInferred);

        let dev = &report.occupation_impacts[&code("15-1252")];
        assert_eq!(dev.confidence, 0.9);
        assert_eq!(dev.task_count, 2);
        assert_eq!(dev.source, ImpactSource::AnthropicDirect);
        assert_eq!(
            dev.major_group.as_deref(),
            Some("Computer and Mathematical Occupations")
        );
    }

    #[test]
    fn infers_from_title_or_drops() {
        let raw = json!([
            {"title": "Registered Nurse", "automation_rate": 0.1, "augmentation_rate": 0.5},
            {"title": "Lion Tamer", "automation_rate": 0.1},
            {"title": "Bad code", "soc_code": "99-0000"}
        ]);
        let report = extractor().process(&raw).unwrap();
        let s = report.processing_stats;
        assert_eq!(s.total_occupations, 3);
        assert_eq!(s.successfully_mapped, 1);
        assert_eq!(s.missing_soc_codes, 2);
        assert_eq!(s.invalid_soc_codes, 1);
        assert!(report.occupation_impacts.contains_key(&code("29-1141")));
        assert!((report.data_coverage.overall_coverage - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn missing_rates_use_group_defaults() {
        let raw = json!({"occupations": [{"title": "Driver", "soc_code": "53-3032"}]});
        let report = extractor().process(&raw).unwrap();
        let driver = &report.occupation_impacts[&code("53-3032")];
        assert_eq!(driver.automation_rate, 0.80);
        assert_eq!(driver.augmentation_rate, 0.15);
        assert_eq!(report.processing_stats.estimated_missing, 2);
    }

    #[test]
    fn duplicate_codes_last_write_wins() {
        let raw = json!({"occupations": [
            {"soc_code": "15-1252", "automation_rate": 0.1, "augmentation_rate": 0.1},
            {"soc_code": "151252", "automation_rate": 0.4, "augmentation_rate": 0.4}
        ]});
        let report = extractor().process(&raw).unwrap();
        assert_eq!(report.occupation_impacts.len(), 1);
        assert_eq!(report.occupation_impacts[&code("15-1252")].automation_rate, 0.4);
    }

    #[test]
    fn finds_nested_and_wrapped_lists() {
        let nested = json!({"data": {"soc_occupations": [{"soc_code": "43-3031"}]}});
        assert_eq!(extractor().process(&nested).unwrap().occupation_impacts.len(), 1);

        let wrapped = json!({"combined": {"occupation_usage": {"occupations": [
            {"soc_code": "41-2031"}
        ]}}});
        assert_eq!(extractor().process(&wrapped).unwrap().occupation_impacts.len(), 1);

        let datasets = json!({"datasets": {"occupation_automation": [{"soc_code": "51-2092"}]}});
        assert_eq!(extractor().process(&datasets).unwrap().occupation_impacts.len(), 1);
    }

    #[test]
    fn malformed_entries_are_counted_not_fatal() {
        let raw = json!({"occupations": [42, "x", {"soc_code": "11-1021"}]});
        let report = extractor().process(&raw).unwrap();
        assert_eq!(report.processing_stats.malformed_records, 2);
        assert_eq!(report.processing_stats.successfully_mapped, 1);
    }

    #[test]
    fn no_list_yields_error_sentinel() {
        let report = extractor().process(&json!({"meta": 1})).unwrap();
        assert_eq!(report.error.as_deref(), Some(NO_DATA_ERROR));
        assert!(report.occupation_impacts.is_empty());
        assert!(report.summary_statistics.is_none());
    }

    #[test]
    fn scalar_input_is_a_hard_error() {
        assert!(matches!(
            extractor().process(&json!(3)),
            Err(ImpactError::NotACollection(kind)) if kind == "number"
        ));
    }

    #[test]
    fn summary_and_coverage() {
        let raw = json!({"occupations": [
            {"soc_code": "15-1252", "automation_rate": 0.2, "augmentation_rate": 0.8},
            {"soc_code": "15-2051", "automation_rate": 0.4, "augmentation_rate": 0.4},
            {"soc_code": "43-3031", "automation_rate": 0.6, "augmentation_rate": 0.0}
        ]});
        let report = extractor().process(&raw).unwrap();
        let s = report.summary_statistics.unwrap();
        assert!((s.average_automation_rate - 0.4).abs() < 1e-12);
        assert!((s.automation_augmentation_ratio - 1.0).abs() < 1e-12);
        assert_eq!(s.min_automation, 0.2);
        assert_eq!(s.max_augmentation, 0.8);

        let group = &report.data_coverage.by_major_group["15"];
        assert_eq!(group.count, 2);
        assert!((group.avg_automation - 0.3).abs() < 1e-12);
    }

    #[test]
    fn validate_processed_scores_quality() {
        let raw = json!({"occupations": [
            {"soc_code": "15-1252", "automation_rate": 0.2, "augmentation_rate": 0.8}
        ]});
        let ex = extractor();
        let report = ex.process(&raw).unwrap();
        let v = ex.validate_processed(&report).unwrap();
        assert!(v.validation_passed);
        assert_eq!(v.quality_factors.soc_validity, 1.0);
        assert_eq!(v.quality_factors.data_completeness, 1.0);
        assert!((v.quality_factors.major_group_coverage - 1.0 / 23.0).abs() < 1e-12);
        assert!(v.warnings.iter().any(|w| w.starts_with("Low SOC major group coverage")));
    }

    #[test]
    fn report_round_trips_through_json() {
        let raw = json!({"occupations": [{"soc_code": "15-1252"}]});
        let report = extractor().process(&raw).unwrap();
        let text = serde_json::to_string(&report).unwrap();
        assert!(text.contains("\"15-1252\""));
        assert!(!text.contains("\"error\""));
        let back: OccupationImpactReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.occupation_impacts, report.occupation_impacts);
    }
}
