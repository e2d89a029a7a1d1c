//! Mapping Validator.
//!
//! Quality gate over aggregated industry rates. Four independent checks
//! (coverage, consistency, reasonableness, confidence) each score in
//! `[0, 1]` and emit warnings; the overall score is their unweighted mean.
//! Nothing here blocks downstream use: a failed validation only annotates
//! the results.

use super::aggregator::{CoverageStats, IndustryRate};
use super::resolve;
use super::stats;
use super::status::QualityBand;
use super::tables::IndustryTables;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const PASS_THRESHOLD: f64 = 0.6;
const VARIANCE_SCALE: f64 = 0.01;
const VARIANCE_WARNING: f64 = 0.02;
const SIGNIFICANT_CHANGE: f64 = 0.1;
const DIRECTIONAL_CHANGE: f64 = 0.05;

/// One check's score, diagnostics and check-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheck<M> {
    pub quality_score: f64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub metrics: M,
}

impl<M: Default> QualityCheck<M> {
    fn new() -> Self {
        Self {
            quality_score: 0.0,
            warnings: Vec::new(),
            errors: Vec::new(),
            metrics: M::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterConsistency {
    pub automation_variance: f64,
    pub augmentation_variance: f64,
    pub consistency_score: f64,
    pub industries_analyzed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReasonablenessMetrics {
    pub reasonable_industries: usize,
    pub total_industries: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceMetrics {
    pub average_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    pub high_confidence_industries: usize,
    pub low_confidence_industries: usize,
    pub confidence_coverage_correlation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityChecks {
    pub coverage: QualityCheck<CoverageStats>,
    pub consistency: QualityCheck<BTreeMap<String, ClusterConsistency>>,
    pub reasonableness: QualityCheck<ReasonablenessMetrics>,
    pub confidence: QualityCheck<ConfidenceMetrics>,
}

impl QualityChecks {
    fn scores(&self) -> [f64; 4] {
        [
            self.coverage.quality_score,
            self.consistency.quality_score,
            self.reasonableness.quality_score,
            self.confidence.quality_score,
        ]
    }
}

/// Full validation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub validation_passed: bool,
    pub overall_quality_score: f64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub quality_checks: QualityChecks,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_comparison: Option<BaselineComparison>,
}

/// Minimal rate record for baseline comparison. Missing fields default to
/// zero rates and neutral confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineRate {
    #[serde(default)]
    pub automation_rate: f64,
    #[serde(default)]
    pub augmentation_rate: f64,
    #[serde(default = "neutral_confidence")]
    pub confidence: f64,
}

fn neutral_confidence() -> f64 {
    0.5
}

impl From<&IndustryRate> for BaselineRate {
    fn from(rate: &IndustryRate) -> Self {
        Self {
            automation_rate: rate.automation_rate,
            augmentation_rate: rate.augmentation_rate,
            confidence: rate.confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificantChange {
    pub industry: String,
    pub automation_change: f64,
    pub augmentation_change: f64,
    pub confidence_improvement: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub avg_automation_change: f64,
    pub avg_augmentation_change: f64,
    pub avg_confidence_improvement: f64,
    pub max_automation_change: f64,
    pub min_automation_change: f64,
    pub industries_with_higher_automation: usize,
    pub industries_with_lower_automation: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub industries_compared: usize,
    pub significant_changes: Vec<SignificantChange>,
    pub change_summary: Option<ChangeSummary>,
    pub overall_improvement_score: f64,
}

/// Runs the quality checks against the injected industry tables.
#[derive(Debug, Clone, Copy)]
pub struct MappingValidator<'a> {
    tables: &'a IndustryTables,
}

impl<'a> MappingValidator<'a> {
    pub fn new(tables: &'a IndustryTables) -> Self {
        Self { tables }
    }

    pub fn validate(&self, rates: &BTreeMap<String, IndustryRate>) -> ValidationReport {
        tracing::info!(industries = rates.len(), "validating occupation-industry mapping");

        let quality_checks = QualityChecks {
            coverage: self.check_coverage(rates),
            consistency: self.check_consistency(rates),
            reasonableness: self.check_reasonableness(rates),
            confidence: self.check_confidence(rates),
        };

        let scores = quality_checks.scores();
        let overall_quality_score = stats::mean(&scores);

        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        for (w, e) in [
            (&quality_checks.coverage.warnings, &quality_checks.coverage.errors),
            (&quality_checks.consistency.warnings, &quality_checks.consistency.errors),
            (&quality_checks.reasonableness.warnings, &quality_checks.reasonableness.errors),
            (&quality_checks.confidence.warnings, &quality_checks.confidence.errors),
        ] {
            warnings.extend(w.iter().cloned());
            errors.extend(e.iter().cloned());
        }

        let report = ValidationReport {
            validation_passed: errors.is_empty() && overall_quality_score >= PASS_THRESHOLD,
            overall_quality_score,
            recommendations: recommendations(&scores, overall_quality_score),
            warnings,
            errors,
            quality_checks,
            baseline_comparison: None,
        };
        log_summary(&report);
        report
    }

    fn check_coverage(&self, rates: &BTreeMap<String, IndustryRate>) -> QualityCheck<CoverageStats> {
        let mut check = QualityCheck::new();
        if rates.is_empty() {
            check.errors.push("No industry rates provided".to_string());
            return check;
        }

        let metrics = CoverageStats::from_rates(rates);
        let total = metrics.total_industries as f64;
        let high_ratio = metrics.high_coverage_industries as f64 / total;
        let avg = metrics.average_coverage;

        check.quality_score = (high_ratio * 0.6 + avg * 0.4).min(1.0);
        if high_ratio < 0.3 {
            check.warnings.push(format!(
                "Low proportion of high-coverage industries: {:.1}%",
                high_ratio * 100.0
            ));
        }
        if avg < 0.5 {
            check
                .warnings
                .push(format!("Low average data coverage: {:.1}%", avg * 100.0));
        }
        if metrics.low_coverage_industries as f64 > total * 0.5 {
            check.warnings.push(format!(
                "Many industries have low coverage: {}/{}",
                metrics.low_coverage_industries, metrics.total_industries
            ));
        }
        check.metrics = metrics;
        check
    }

    fn check_consistency(
        &self,
        rates: &BTreeMap<String, IndustryRate>,
    ) -> QualityCheck<BTreeMap<String, ClusterConsistency>> {
        let mut check: QualityCheck<BTreeMap<String, ClusterConsistency>> = QualityCheck::new();
        let mut cluster_scores = Vec::new();

        for (cluster, members) in &self.tables.consistency_clusters {
            let present: Vec<(&String, &IndustryRate)> = members
                .iter()
                .filter_map(|m| resolve::lookup(m, rates).map(|r| (m, r)))
                .collect();
            if present.len() < 2 {
                continue;
            }

            let automation: Vec<f64> = present.iter().map(|(_, r)| r.automation_rate).collect();
            let augmentation: Vec<f64> = present.iter().map(|(_, r)| r.augmentation_rate).collect();
            let auto_var = stats::variance(&automation);
            let aug_var = stats::variance(&augmentation);

            let auto_score = (1.0 - auto_var / VARIANCE_SCALE).max(0.0);
            let aug_score = (1.0 - aug_var / VARIANCE_SCALE).max(0.0);
            let score = (auto_score + aug_score) / 2.0;
            cluster_scores.push(score);

            if auto_var > VARIANCE_WARNING {
                check.warnings.push(format!(
                    "High automation rate variance in {cluster}: {auto_var:.3}"
                ));
            }
            if aug_var > VARIANCE_WARNING {
                check.warnings.push(format!(
                    "High augmentation rate variance in {cluster}: {aug_var:.3}"
                ));
            }

            check.metrics.insert(
                cluster.clone(),
                ClusterConsistency {
                    automation_variance: auto_var,
                    augmentation_variance: aug_var,
                    consistency_score: score,
                    industries_analyzed: present.iter().map(|(m, _)| (*m).clone()).collect(),
                },
            );
        }

        if cluster_scores.is_empty() {
            check.quality_score = 0.5;
            check
                .warnings
                .push("Insufficient data for consistency checking".to_string());
        } else {
            check.quality_score = stats::mean(&cluster_scores);
        }
        check
    }

    fn check_reasonableness(
        &self,
        rates: &BTreeMap<String, IndustryRate>,
    ) -> QualityCheck<ReasonablenessMetrics> {
        let mut check: QualityCheck<ReasonablenessMetrics> = QualityCheck::new();
        let mut reasonable = 0usize;

        for (industry, rate) in rates {
            let auto = rate.automation_rate;
            let aug = rate.augmentation_rate;
            let auto_ok = (0.05..=0.85).contains(&auto);
            let aug_ok = (0.10..=0.90).contains(&aug);
            let sum_ok = (0.30..=1.20).contains(&(auto + aug));

            if auto_ok && aug_ok && sum_ok {
                reasonable += 1;
            } else {
                if !auto_ok {
                    check.warnings.push(format!(
                        "{industry}: automation rate {:.2}% outside reasonable bounds",
                        auto * 100.0
                    ));
                }
                if !aug_ok {
                    check.warnings.push(format!(
                        "{industry}: augmentation rate {:.2}% outside reasonable bounds",
                        aug * 100.0
                    ));
                }
                if !sum_ok {
                    check.warnings.push(format!(
                        "{industry}: combined rates {:.2}% outside reasonable bounds",
                        (auto + aug) * 100.0
                    ));
                }
            }

            if let Some(expected) = self.tables.expected_range_for(industry) {
                if !expected.automation.contains(auto) || !expected.augmentation.contains(aug) {
                    check.warnings.push(format!(
                        "{industry}: rates outside expected range - auto: {:.2}% (expected: {:.1}%-{:.1}%), aug: {:.2}% (expected: {:.1}%-{:.1}%)",
                        auto * 100.0,
                        expected.automation.lo * 100.0,
                        expected.automation.hi * 100.0,
                        aug * 100.0,
                        expected.augmentation.lo * 100.0,
                        expected.augmentation.hi * 100.0,
                    ));
                }
            }
        }

        if !rates.is_empty() {
            check.quality_score = reasonable as f64 / rates.len() as f64;
        }
        check.metrics = ReasonablenessMetrics {
            reasonable_industries: reasonable,
            total_industries: rates.len(),
        };
        check
    }

    fn check_confidence(
        &self,
        rates: &BTreeMap<String, IndustryRate>,
    ) -> QualityCheck<ConfidenceMetrics> {
        let mut check: QualityCheck<ConfidenceMetrics> = QualityCheck::new();
        let confidences: Vec<f64> = rates.values().map(|r| r.confidence).collect();
        let coverages: Vec<f64> = rates.values().map(|r| r.data_coverage).collect();
        if confidences.is_empty() {
            check
                .errors
                .push("No confidence scores available".to_string());
            return check;
        }

        let n = confidences.len();
        let average = stats::mean(&confidences);
        let correlation = stats::pearson(&confidences, &coverages);
        let mut high = 0;
        let mut low = 0;
        for c in &confidences {
            let band = QualityBand::from_confidence(*c);
            if band == QualityBand::High {
                high += 1;
            }
            if band.needs_attention() {
                low += 1;
            }
        }

        check.quality_score = average * 0.6 + (high as f64 / n as f64) * 0.4;
        if average < 0.5 {
            check
                .warnings
                .push(format!("Low average confidence: {average:.2}"));
        }
        if low as f64 > n as f64 * 0.3 {
            check
                .warnings
                .push(format!("Many industries have low confidence: {low}/{n}"));
        }
        if correlation.abs() < 0.3 {
            check.warnings.push(format!(
                "Weak correlation between confidence and data coverage: {correlation:.2}"
            ));
        }

        check.metrics = ConfidenceMetrics {
            average_confidence: average,
            min_confidence: confidences.iter().copied().fold(f64::INFINITY, f64::min),
            max_confidence: confidences.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            high_confidence_industries: high,
            low_confidence_industries: low,
            confidence_coverage_correlation: correlation,
        };
        check
    }

    /// Compare new rates against a baseline, industry by industry.
    pub fn compare_with_baseline(
        &self,
        new_rates: &BTreeMap<String, IndustryRate>,
        baseline: &BTreeMap<String, BaselineRate>,
    ) -> BaselineComparison {
        let mut comparison = BaselineComparison::default();
        let mut auto_changes = Vec::new();
        let mut aug_changes = Vec::new();
        let mut confidence_changes = Vec::new();

        for (industry, rate) in new_rates {
            let Some(base) = resolve::lookup(industry, baseline) else {
                continue;
            };
            comparison.industries_compared += 1;

            let auto_change = rate.automation_rate - base.automation_rate;
            let aug_change = rate.augmentation_rate - base.augmentation_rate;
            let confidence_change = rate.confidence - base.confidence;
            auto_changes.push(auto_change);
            aug_changes.push(aug_change);
            confidence_changes.push(confidence_change);

            if auto_change.abs() > SIGNIFICANT_CHANGE || aug_change.abs() > SIGNIFICANT_CHANGE {
                comparison.significant_changes.push(SignificantChange {
                    industry: industry.clone(),
                    automation_change: auto_change,
                    augmentation_change: aug_change,
                    confidence_improvement: confidence_change,
                });
            }
        }

        if auto_changes.is_empty() {
            return comparison;
        }

        let summary = ChangeSummary {
            avg_automation_change: stats::mean(&auto_changes),
            avg_augmentation_change: stats::mean(&aug_changes),
            avg_confidence_improvement: stats::mean(&confidence_changes),
            max_automation_change: auto_changes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min_automation_change: auto_changes.iter().copied().fold(f64::INFINITY, f64::min),
            industries_with_higher_automation: auto_changes
                .iter()
                .filter(|c| **c > DIRECTIONAL_CHANGE)
                .count(),
            industries_with_lower_automation: auto_changes
                .iter()
                .filter(|c| **c < -DIRECTIONAL_CHANGE)
                .count(),
        };

        let magnitudes: Vec<f64> = auto_changes
            .iter()
            .chain(&aug_changes)
            .map(|c| c.abs())
            .collect();
        comparison.overall_improvement_score =
            summary.avg_confidence_improvement * 0.6 + stats::mean(&magnitudes).min(0.2) * 0.4;
        comparison.change_summary = Some(summary);

        tracing::info!(
            compared = comparison.industries_compared,
            significant = comparison.significant_changes.len(),
            "compared rates with baseline"
        );
        comparison
    }
}

fn recommendations(scores: &[f64; 4], overall: f64) -> Vec<String> {
    let [coverage, consistency, reasonableness, confidence] = *scores;
    let rules: [(bool, [&str; 2]); 5] = [
        (
            coverage < 0.6,
            [
                "Collect additional BLS OEWS data to improve occupation coverage",
                "Focus on industries with low data coverage for targeted data collection",
            ],
        ),
        (
            consistency < 0.7,
            [
                "Review calculation methodology for consistency across similar industries",
                "Consider industry-specific adjustments to reduce variance within industry groups",
            ],
        ),
        (
            reasonableness < 0.8,
            [
                "Review and validate outlier automation/augmentation rates",
                "Cross-reference rates with academic research and industry studies",
            ],
        ),
        (
            confidence < 0.6,
            [
                "Improve Anthropic occupation data coverage to increase confidence",
                "Validate SOC code mappings to ensure accurate occupation matching",
            ],
        ),
        (
            overall < 0.7,
            [
                "Consider using fallback methodology until data quality improves",
                "Implement gradual transition to occupation-based methodology",
            ],
        ),
    ];

    rules
        .iter()
        .filter(|(triggered, _)| *triggered)
        .flat_map(|(_, texts)| texts.iter().map(|t| t.to_string()))
        .collect()
}

fn log_summary(report: &ValidationReport) {
    let checks = &report.quality_checks;
    tracing::info!(
        overall = report.overall_quality_score,
        passed = report.validation_passed,
        coverage = checks.coverage.quality_score,
        consistency = checks.consistency.quality_score,
        reasonableness = checks.reasonableness.quality_score,
        confidence = checks.confidence.quality_score,
        "mapping validation summary"
    );
    for warning in report.warnings.iter().take(5) {
        tracing::warn!(total = report.warnings.len(), "{warning}");
    }
    for error in &report.errors {
        tracing::error!("{error}");
    }
    for rec in report.recommendations.iter().take(3) {
        tracing::info!(total = report.recommendations.len(), "recommendation: {rec}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economic::aggregator::CalculationMethod;

    fn rate(automation: f64, augmentation: f64, coverage: f64, confidence: f64) -> IndustryRate {
        IndustryRate {
            automation_rate: automation,
            augmentation_rate: augmentation,
            data_coverage: coverage,
            confidence,
            avg_data_confidence: confidence,
            total_employment: 1000,
            occupations_analyzed: 5,
            calculation_method: CalculationMethod::OccupationWeighted,
        }
    }

    fn good_rates() -> BTreeMap<String, IndustryRate> {
        BTreeMap::from([
            ("Information".to_string(), rate(0.30, 0.70, 0.9, 0.9)),
            ("Professional and Business Services".to_string(), rate(0.35, 0.65, 0.8, 0.8)),
            ("Manufacturing".to_string(), rate(0.50, 0.40, 0.2, 0.3)),
            ("Construction".to_string(), rate(0.48, 0.38, 0.5, 0.5)),
        ])
    }

    #[test]
    fn empty_rates_fail_with_errors() {
        let tables = IndustryTables::default();
        let report = MappingValidator::new(&tables).validate(&BTreeMap::new());
        assert!(!report.validation_passed);
        assert_eq!(
            report.errors,
            vec![
                "No industry rates provided".to_string(),
                "No confidence scores available".to_string()
            ]
        );
        assert_eq!(report.quality_checks.consistency.quality_score, 0.5);
        // 0.5 / 4
        assert!((report.overall_quality_score - 0.125).abs() < 1e-12);
    }

    #[test]
    fn coverage_score_formula() {
        let tables = IndustryTables::default();
        let report = MappingValidator::new(&tables).validate(&good_rates());
        let cov = &report.quality_checks.coverage;
        // 2 of 4 high, average coverage 0.6
        assert!((cov.quality_score - (0.5 * 0.6 + 0.6 * 0.4)).abs() < 1e-12);
        assert_eq!(cov.metrics.low_coverage_industries, 1);
    }

    #[test]
    fn consistency_uses_population_variance() {
        let tables = IndustryTables::default();
        let report = MappingValidator::new(&tables).validate(&good_rates());
        let c = &report.quality_checks.consistency;
        let tech = &c.metrics["technology_related"];
        // values 0.30/0.35 -> variance 0.000625
        assert!((tech.automation_variance - 0.000625).abs() < 1e-12);
        assert!((tech.consistency_score - (1.0 - 0.0625)).abs() < 1e-9);
        assert!(c.metrics.contains_key("traditional_industries"));
        assert!(!c.metrics.contains_key("service_oriented"));
    }

    #[test]
    fn high_variance_is_flagged_and_floors_at_zero() {
        let tables = IndustryTables::default();
        let rates = BTreeMap::from([
            ("Information".to_string(), rate(0.05, 0.90, 1.0, 1.0)),
            ("Professional and Business Services".to_string(), rate(0.85, 0.10, 1.0, 1.0)),
        ]);
        let report = MappingValidator::new(&tables).validate(&rates);
        let c = &report.quality_checks.consistency;
        assert_eq!(c.quality_score, 0.0);
        assert!(c.warnings.iter().any(|w| w.starts_with("High automation rate variance")));
    }

    #[test]
    fn reasonableness_counts_and_expected_ranges() {
        let tables = IndustryTables::default();
        let rates = BTreeMap::from([
            ("Information".to_string(), rate(0.30, 0.70, 0.9, 0.9)),
            ("Manufacturing".to_string(), rate(0.95, 0.05, 0.9, 0.9)),
            ("Financial Activities".to_string(), rate(0.10, 0.30, 0.9, 0.9)),
        ]);
        let report = MappingValidator::new(&tables).validate(&rates);
        let r = &report.quality_checks.reasonableness;
        assert_eq!(r.metrics.reasonable_industries, 2);
        assert!((r.quality_score - 2.0 / 3.0).abs() < 1e-12);
        assert!(r.warnings.iter().any(|w| w.starts_with("Manufacturing: automation rate")));
        assert!(r
            .warnings
            .iter()
            .any(|w| w.starts_with("Financial Activities: rates outside expected range")));
    }

    #[test]
    fn flat_confidence_warns_on_correlation() {
        let tables = IndustryTables::default();
        let rates = BTreeMap::from([
            ("Information".to_string(), rate(0.30, 0.70, 0.9, 0.8)),
            ("Manufacturing".to_string(), rate(0.50, 0.40, 0.1, 0.8)),
        ]);
        let report = MappingValidator::new(&tables).validate(&rates);
        let c = &report.quality_checks.confidence;
        assert_eq!(c.metrics.confidence_coverage_correlation, 0.0);
        assert!(c.warnings.iter().any(|w| w.starts_with("Weak correlation")));
        assert!((c.quality_score - (0.8 * 0.6 + 0.4)).abs() < 1e-12);
    }

    #[test]
    fn low_confidence_industries_are_counted() {
        let tables = IndustryTables::default();
        let rates = BTreeMap::from([
            ("Information".to_string(), rate(0.30, 0.70, 0.9, 0.9)),
            ("Manufacturing".to_string(), rate(0.50, 0.40, 0.3, 0.3)),
            ("Construction".to_string(), rate(0.48, 0.38, 0.2, 0.35)),
        ]);
        let report = MappingValidator::new(&tables).validate(&rates);
        let c = &report.quality_checks.confidence;
        assert_eq!(c.metrics.low_confidence_industries, 2);
        assert_eq!(c.metrics.high_confidence_industries, 1);
        assert!(c
            .warnings
            .iter()
            .any(|w| w == "Many industries have low confidence: 2/3"));
    }

    #[test]
    fn recommendations_follow_sub_scores() {
        assert!(recommendations(&[1.0, 1.0, 1.0, 1.0], 1.0).is_empty());
        let recs = recommendations(&[0.5, 1.0, 1.0, 1.0], 0.875);
        assert_eq!(recs.len(), 2);
        assert!(recs[0].starts_with("Collect additional BLS OEWS data"));
        assert_eq!(recommendations(&[0.0, 0.0, 0.0, 0.0], 0.0).len(), 10);
    }

    #[test]
    fn validation_passes_on_good_data() {
        let tables = IndustryTables::default();
        let rates = BTreeMap::from([
            ("Information".to_string(), rate(0.30, 0.70, 0.9, 0.9)),
            ("Professional and Business Services".to_string(), rate(0.32, 0.68, 0.8, 0.8)),
            ("Manufacturing".to_string(), rate(0.50, 0.40, 0.75, 0.75)),
        ]);
        let report = MappingValidator::new(&tables).validate(&rates);
        assert!(report.errors.is_empty());
        assert!(report.overall_quality_score >= 0.6);
        assert!(report.validation_passed);
    }

    #[test]
    fn baseline_comparison() {
        let tables = IndustryTables::default();
        let validator = MappingValidator::new(&tables);
        let new = good_rates();
        let baseline: BTreeMap<String, BaselineRate> = serde_json::from_value(serde_json::json!({
            "information": {"automation_rate": 0.10, "augmentation_rate": 0.70},
            "Manufacturing": {"automation_rate": 0.48, "augmentation_rate": 0.40, "confidence": 0.3}
        }))
        .unwrap();

        let cmp = validator.compare_with_baseline(&new, &baseline);
        assert_eq!(cmp.industries_compared, 2);
        assert_eq!(cmp.significant_changes.len(), 1);
        assert_eq!(cmp.significant_changes[0].industry, "Information");

        let summary = cmp.change_summary.unwrap();
        assert_eq!(summary.industries_with_higher_automation, 1);
        assert_eq!(summary.industries_with_lower_automation, 0);
        // confidence gains: 0.9-0.5 and 0.3-0.3
        assert!((summary.avg_confidence_improvement - 0.2).abs() < 1e-12);
        let magnitude = (0.2 + 0.02 + 0.0 + 0.0) / 4.0;
        assert!((cmp.overall_improvement_score - (0.2 * 0.6 + magnitude * 0.4)).abs() < 1e-9);
    }
}
