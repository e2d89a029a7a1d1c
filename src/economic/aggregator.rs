//! Occupation→Industry Aggregator.
//!
//! Combines per-occupation impact records with an employment matrix
//! (`industry → soc_code → {employment, title}`) into employment-weighted
//! automation and augmentation rates per industry, scored for data coverage
//! and confidence. Everything is recomputed from the inputs on each call.

use super::extractor::OccupationImpact;
use super::soc::{SocCode, SocCodeMapper};
use super::status::QualityBand;
use super::tables::IndustryTables;
use crate::error::{ensure_finite, ImpactError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Confidence given to occupations scored from their major-group defaults.
const SOC_DEFAULT_CONFIDENCE: f64 = 0.4;
/// Share of a default-scored occupation's employment counted as covered.
const SOC_DEFAULT_COVERAGE_CREDIT: f64 = 0.3;
/// Weight of a default-scored occupation in the confidence average.
const SOC_DEFAULT_CONFIDENCE_WEIGHT: f64 = 0.5;
const NEUTRAL_AVG_CONFIDENCE: f64 = 0.5;
const FALLBACK_CONFIDENCE: f64 = 0.3;
const MIN_CONFIDENCE: f64 = 0.1;

/// One occupation's employment within an industry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentEntry {
    #[serde(default)]
    pub employment: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// `industry → raw SOC code → employment`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmploymentMatrix {
    industries: BTreeMap<String, BTreeMap<String, EmploymentEntry>>,
    #[serde(skip)]
    estimated: bool,
}

impl EmploymentMatrix {
    pub fn new(industries: BTreeMap<String, BTreeMap<String, EmploymentEntry>>) -> Self {
        Self {
            industries,
            estimated: false,
        }
    }

    /// Parse a matrix, skipping malformed industries and entries.
    ///
    /// Errors only when `value` is not an object.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(ImpactError::NotACollection(
                "employment matrix must be an object".to_string(),
            ));
        };

        let mut skipped = 0usize;
        let mut industries = BTreeMap::new();
        for (industry, occupations) in map {
            let Some(occupations) = occupations.as_object() else {
                skipped += 1;
                continue;
            };
            let mut entries = BTreeMap::new();
            for (soc, entry) in occupations {
                let Some(entry) = entry.as_object() else {
                    skipped += 1;
                    continue;
                };
                let employment = match entry.get("employment") {
                    None | Some(Value::Null) => 0,
                    Some(v) => match v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)) {
                        Some(n) => n,
                        None => {
                            skipped += 1;
                            continue;
                        }
                    },
                };
                let title = entry.get("title").and_then(Value::as_str).map(str::to_string);
                entries.insert(soc.clone(), EmploymentEntry { employment, title });
            }
            industries.insert(industry.clone(), entries);
        }

        if skipped > 0 {
            tracing::warn!(skipped, "skipped malformed employment matrix entries");
        }
        Ok(Self::new(industries))
    }

    /// Estimated employment shares for six supersectors, used when no
    /// occupation-level employment data is available.
    pub fn estimated() -> Self {
        let rows: [(&str, [(&str, u64, &str); 5]); 6] = [
            (
                "Information",
                [
                    ("15-1252", 180_000, "Software Developers"),
                    ("15-1151", 45_000, "Computer User Support Specialists"),
                    ("11-3021", 25_000, "Computer and Information Systems Managers"),
                    ("43-3031", 30_000, "Bookkeeping, Accounting, and Auditing Clerks"),
                    ("41-3099", 20_000, "Sales Representatives, Services"),
                ],
            ),
            (
                "Professional and Business Services",
                [
                    ("13-2051", 95_000, "Financial Analysts"),
                    ("13-1161", 75_000, "Market Research Analysts"),
                    ("11-1021", 180_000, "General and Operations Managers"),
                    ("43-3031", 120_000, "Bookkeeping, Accounting, and Auditing Clerks"),
                    ("43-4051", 200_000, "Customer Service Representatives"),
                ],
            ),
            (
                "Financial Activities",
                [
                    ("13-2011", 140_000, "Accountants and Auditors"),
                    ("13-2051", 110_000, "Financial Analysts"),
                    ("43-3031", 180_000, "Bookkeeping, Accounting, and Auditing Clerks"),
                    ("41-3031", 95_000, "Securities, Commodities, and Financial Services Sales Agents"),
                    ("43-4131", 75_000, "Loan Interviewers and Clerks"),
                ],
            ),
            (
                "Education and Health Services",
                [
                    ("29-1141", 320_000, "Registered Nurses"),
                    ("25-2021", 380_000, "Elementary School Teachers"),
                    ("25-2031", 180_000, "Secondary School Teachers"),
                    ("31-1014", 140_000, "Nursing Assistants"),
                    ("43-3031", 85_000, "Bookkeeping, Accounting, and Auditing Clerks"),
                ],
            ),
            (
                "Manufacturing",
                [
                    ("51-2092", 180_000, "Team Assemblers"),
                    ("17-2112", 65_000, "Industrial Engineers"),
                    ("11-1021", 85_000, "General and Operations Managers"),
                    ("51-4121", 95_000, "Welders, Cutters, Solderers, and Brazers"),
                    ("43-3031", 75_000, "Bookkeeping, Accounting, and Auditing Clerks"),
                ],
            ),
            (
                "Trade, Transportation, and Utilities",
                [
                    ("41-2031", 280_000, "Retail Salespersons"),
                    ("53-3032", 190_000, "Heavy and Tractor-Trailer Truck Drivers"),
                    ("43-4051", 160_000, "Customer Service Representatives"),
                    ("41-2011", 120_000, "Cashiers"),
                    ("43-5061", 95_000, "Production, Planning, and Expediting Clerks"),
                ],
            ),
        ];

        let industries = rows
            .iter()
            .map(|(industry, occupations)| {
                let entries = occupations
                    .iter()
                    .map(|&(soc, employment, title)| {
                        (
                            soc.to_string(),
                            EmploymentEntry {
                                employment,
                                title: Some(title.to_string()),
                            },
                        )
                    })
                    .collect();
                (industry.to_string(), entries)
            })
            .collect();

        Self {
            industries,
            estimated: true,
        }
    }

    pub fn is_estimated(&self) -> bool {
        self.estimated
    }

    pub fn industries(&self) -> &BTreeMap<String, BTreeMap<String, EmploymentEntry>> {
        &self.industries
    }

    pub fn len(&self) -> usize {
        self.industries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.industries.is_empty()
    }

    /// Total employment per industry.
    pub fn industry_totals(&self) -> BTreeMap<String, u64> {
        self.industries
            .iter()
            .map(|(name, occs)| (name.clone(), occs.values().map(|o| o.employment).sum()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    OccupationWeighted,
    IndustryFallback,
}

/// Aggregated rates for one industry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryRate {
    pub automation_rate: f64,
    pub augmentation_rate: f64,
    pub data_coverage: f64,
    pub confidence: f64,
    pub avg_data_confidence: f64,
    pub total_employment: u64,
    pub occupations_analyzed: usize,
    pub calculation_method: CalculationMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageStats {
    pub total_industries: usize,
    pub high_coverage_industries: usize,
    pub medium_coverage_industries: usize,
    pub low_coverage_industries: usize,
    pub average_coverage: f64,
    pub average_confidence: f64,
}

impl CoverageStats {
    pub fn from_rates(rates: &BTreeMap<String, IndustryRate>) -> Self {
        let mut stats = Self {
            total_industries: rates.len(),
            ..Default::default()
        };
        if rates.is_empty() {
            return stats;
        }
        for rate in rates.values() {
            match QualityBand::from_coverage(rate.data_coverage) {
                QualityBand::High => stats.high_coverage_industries += 1,
                QualityBand::Medium => stats.medium_coverage_industries += 1,
                QualityBand::Low => stats.low_coverage_industries += 1,
            }
        }
        let n = rates.len() as f64;
        stats.average_coverage = rates.values().map(|r| r.data_coverage).sum::<f64>() / n;
        stats.average_confidence = rates.values().map(|r| r.confidence).sum::<f64>() / n;
        stats
    }
}

/// Provenance of one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataSource {
    Provided { records: usize },
    Estimated { records: usize, note: String },
    NotAvailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSources {
    pub occupation_impacts: DataSource,
    pub employment: DataSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingMetadata {
    pub calculation_method: CalculationMethod,
    pub data_sources: DataSources,
    pub coverage_stats: CoverageStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub total_industries: usize,
    pub methodology: String,
    pub calculated_at: DateTime<Utc>,
}

/// Full aggregator output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResults {
    pub industry_rates: BTreeMap<String, IndustryRate>,
    pub metadata: MappingMetadata,
    pub calculation_summary: CalculationSummary,
}

/// Where an occupation's rates came from during aggregation.
enum RateSource {
    Direct,
    SocDefault,
}

/// Employment-weighted industry aggregation over injected tables.
#[derive(Debug, Clone, Copy)]
pub struct IndustryAggregator<'a> {
    mapper: &'a SocCodeMapper,
    tables: &'a IndustryTables,
}

impl<'a> IndustryAggregator<'a> {
    pub fn new(mapper: &'a SocCodeMapper, tables: &'a IndustryTables) -> Self {
        Self { mapper, tables }
    }

    /// Rates for every industry of `matrix`.
    pub fn calculate_industry_rates(
        &self,
        matrix: &EmploymentMatrix,
        impacts: &BTreeMap<SocCode, OccupationImpact>,
    ) -> Result<BTreeMap<String, IndustryRate>> {
        tracing::info!(
            industries = matrix.len(),
            occupations = impacts.len(),
            "calculating occupation-weighted industry rates"
        );

        let mut rates = BTreeMap::new();
        for (industry, occupations) in matrix.industries() {
            let rate = self.industry_rate(industry, occupations, impacts)?;
            rates.insert(industry.clone(), rate);
        }

        log_summary(&rates);
        Ok(rates)
    }

    /// [`Self::calculate_industry_rates`] wrapped with provenance and
    /// coverage metadata.
    pub fn map(
        &self,
        matrix: &EmploymentMatrix,
        impacts: &BTreeMap<SocCode, OccupationImpact>,
    ) -> Result<MappingResults> {
        let industry_rates = self.calculate_industry_rates(matrix, impacts)?;

        let employment = if matrix.is_estimated() {
            DataSource::Estimated {
                records: matrix.len(),
                note: "Using estimated employment shares - recommend collecting actual BLS OEWS data"
                    .to_string(),
            }
        } else if matrix.is_empty() {
            DataSource::NotAvailable
        } else {
            DataSource::Provided {
                records: matrix.len(),
            }
        };
        let occupation_impacts = if impacts.is_empty() {
            DataSource::NotAvailable
        } else {
            DataSource::Provided {
                records: impacts.len(),
            }
        };

        Ok(MappingResults {
            metadata: MappingMetadata {
                calculation_method: CalculationMethod::OccupationWeighted,
                data_sources: DataSources {
                    occupation_impacts,
                    employment,
                },
                coverage_stats: CoverageStats::from_rates(&industry_rates),
            },
            calculation_summary: CalculationSummary {
                total_industries: industry_rates.len(),
                methodology: "occupation_weighted_aggregation".to_string(),
                calculated_at: Utc::now(),
            },
            industry_rates,
        })
    }

    fn industry_rate(
        &self,
        industry: &str,
        occupations: &BTreeMap<String, EmploymentEntry>,
        impacts: &BTreeMap<SocCode, OccupationImpact>,
    ) -> Result<IndustryRate> {
        let total_employment: u64 = occupations.values().map(|o| o.employment).sum();
        if total_employment == 0 {
            tracing::warn!(industry, "no employment data for industry, using fallback rates");
            return Ok(self.fallback_rate(industry));
        }

        let total = total_employment as f64;
        let mut weighted_automation = 0.0;
        let mut weighted_augmentation = 0.0;
        let mut coverage_employment = 0.0;
        let mut confidence_sum = 0.0;
        let mut confidence_count = 0.0;

        for (soc, entry) in occupations {
            let employment = entry.employment as f64;
            let share = employment / total;
            let (automation, augmentation, confidence, source) = self.occupation_rates(soc, impacts);

            weighted_automation += automation * share;
            weighted_augmentation += augmentation * share;

            match source {
                RateSource::Direct => {
                    coverage_employment += employment;
                    confidence_sum += confidence;
                    confidence_count += 1.0;
                }
                RateSource::SocDefault => {
                    coverage_employment += employment * SOC_DEFAULT_COVERAGE_CREDIT;
                    confidence_sum += confidence * SOC_DEFAULT_CONFIDENCE_WEIGHT;
                    confidence_count += SOC_DEFAULT_CONFIDENCE_WEIGHT;
                }
            }
        }

        let data_coverage = coverage_employment / total;
        let avg_confidence = if confidence_count > 0.0 {
            confidence_sum / confidence_count
        } else {
            NEUTRAL_AVG_CONFIDENCE
        };
        let factor = self.tables.confidence_factor_for(industry);
        let confidence = ((data_coverage * avg_confidence).min(1.0) * factor)
            .min(1.0)
            .max(MIN_CONFIDENCE);

        Ok(IndustryRate {
            automation_rate: ensure_finite(weighted_automation, "automation_rate", industry)?,
            augmentation_rate: ensure_finite(weighted_augmentation, "augmentation_rate", industry)?,
            data_coverage: ensure_finite(data_coverage, "data_coverage", industry)?,
            confidence: ensure_finite(confidence, "confidence", industry)?,
            avg_data_confidence: avg_confidence,
            total_employment,
            occupations_analyzed: occupations.len(),
            calculation_method: CalculationMethod::OccupationWeighted,
        })
    }

    fn occupation_rates(
        &self,
        soc: &str,
        impacts: &BTreeMap<SocCode, OccupationImpact>,
    ) -> (f64, f64, f64, RateSource) {
        if let Some(impact) = self.mapper.standardize(soc).and_then(|c| impacts.get(&c)) {
            return (
                impact.automation_rate,
                impact.augmentation_rate,
                impact.confidence,
                RateSource::Direct,
            );
        }
        let defaults = self.mapper.ai_susceptibility_defaults(soc);
        (
            defaults.automation,
            defaults.augmentation,
            SOC_DEFAULT_CONFIDENCE,
            RateSource::SocDefault,
        )
    }

    fn fallback_rate(&self, industry: &str) -> IndustryRate {
        let rates = self.tables.fallback_rates_for(industry);
        IndustryRate {
            automation_rate: rates.automation,
            augmentation_rate: rates.augmentation,
            data_coverage: 0.0,
            confidence: FALLBACK_CONFIDENCE,
            avg_data_confidence: FALLBACK_CONFIDENCE,
            total_employment: 0,
            occupations_analyzed: 0,
            calculation_method: CalculationMethod::IndustryFallback,
        }
    }
}

fn log_summary(rates: &BTreeMap<String, IndustryRate>) {
    if rates.is_empty() {
        return;
    }
    let stats = CoverageStats::from_rates(rates);
    tracing::info!(
        industries = stats.total_industries,
        average_coverage = stats.average_coverage,
        average_confidence = stats.average_confidence,
        high = stats.high_coverage_industries,
        medium = stats.medium_coverage_industries,
        low = stats.low_coverage_industries,
        "occupation-industry mapping results"
    );

    let mut by_automation: Vec<(&String, &IndustryRate)> = rates.iter().collect();
    by_automation.sort_by(|a, b| b.1.automation_rate.total_cmp(&a.1.automation_rate));
    let n = by_automation.len();
    for (rank, (industry, rate)) in by_automation.iter().enumerate() {
        if rank < 3 || rank + 3 >= n {
            tracing::info!(
                industry = industry.as_str(),
                automation = rate.automation_rate,
                augmentation = rate.augmentation_rate,
                confidence = rate.confidence,
                top = rank < 3,
                "industry automation rate"
            );
        }
    }
}
