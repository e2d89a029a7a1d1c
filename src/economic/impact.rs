//! Point-in-time impact calculation.
//!
//! For every industry in the employment snapshot the calculator derives
//! four component effects and combines them into a net employment change:
//!
//! ```text
//! net_impact_pct = 1 - displacement + creation * market_maturity + demand
//! impact         = net_impact_pct - 1
//! ```
//!
//! Displacement comes from automation/augmentation rates (aggregated per
//! industry when available, uniform otherwise), creation from AI job
//! postings, demand from productivity growth, and market maturity from the
//! years elapsed since the adoption base year scaled by news momentum.
//! The aggregate [`AGGREGATE_INDUSTRY`] row is reported but never weighted.

use super::aggregator::IndustryRate;
use super::resolve;
use super::tables::{RatePair, Tables, AGGREGATE_INDUSTRY};
use crate::error::{ensure_finite, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DISPLACEMENT_CAP: f64 = 0.8;
pub const CREATION_CAP: f64 = 0.5;
pub const DEMAND_FLOOR: f64 = -0.1;
pub const DEMAND_CAP: f64 = 0.2;

/// Rates assumed when neither aggregated nor average rates exist.
const UNIFORM_RATES: RatePair = RatePair {
    automation: 0.30,
    augmentation: 0.70,
};
const UNIFORM_CONFIDENCE: f64 = 0.5;

/// Postings are a month of openings; annualize and assume AI roles fill twice as fast.
const POSTINGS_ANNUALIZATION: f64 = 12.0 * 2.0;
const DIRECT_AI_SHARE: f64 = 0.7;
const INFRASTRUCTURE_SHARE: f64 = 0.3;

const POSITIVE_NEWS: [&str; 5] = ["breakthrough", "advancement", "innovation", "growth", "opportunity"];
const NEGATIVE_NEWS: [&str; 5] = ["concern", "risk", "threat", "loss", "decline"];

/// Employment level of one industry, optionally with the prior period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndustryEmployment {
    pub current: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<f64>,
}

impl IndustryEmployment {
    pub fn new(current: f64) -> Self {
        Self {
            current,
            previous: None,
        }
    }

    pub fn with_previous(mut self, previous: f64) -> Self {
        self.previous = Some(previous);
        self
    }

    /// Period-over-period growth. `None` without a positive prior level.
    pub fn growth_rate(&self) -> Option<f64> {
        self.previous
            .filter(|p| *p > 0.0)
            .map(|p| (self.current - p) / p)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Keyword sentiment over a batch of news articles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewsMomentum {
    pub momentum_score: i64,
    pub positive_events: usize,
    pub total_events: usize,
    pub momentum_factor: f64,
}

impl Default for NewsMomentum {
    fn default() -> Self {
        Self {
            momentum_score: 0,
            positive_events: 0,
            total_events: 0,
            momentum_factor: 1.0,
        }
    }
}

impl NewsMomentum {
    /// Positive keywords take precedence; an article scores at most once.
    pub fn from_articles(articles: &[NewsArticle]) -> Self {
        let mut score = 0i64;
        let mut positive = 0usize;
        for article in articles {
            let content = format!("{} {}", article.title, article.description).to_lowercase();
            if POSITIVE_NEWS.iter().any(|w| content.contains(w)) {
                score += 1;
                positive += 1;
            } else if NEGATIVE_NEWS.iter().any(|w| content.contains(w)) {
                score -= 1;
            }
        }

        let total = articles.len();
        let factor = (1.0 + score as f64 / total.max(1) as f64).clamp(0.8, 1.2);
        Self {
            momentum_score: score,
            positive_events: positive,
            total_events: total,
            momentum_factor: factor,
        }
    }
}

/// Everything one impact calculation reads.
#[derive(Debug, Clone, Default)]
pub struct ImpactInputs {
    pub year: i32,
    pub month: u32,
    pub employment: BTreeMap<String, IndustryEmployment>,
    /// Output of the occupation aggregator, when it ran.
    pub industry_rates: Option<BTreeMap<String, IndustryRate>>,
    /// Economy-wide average rates from the extractor.
    pub average_rates: Option<RatePair>,
    /// Monthly AI-related job postings.
    pub ai_job_postings: Option<u64>,
    pub news: Vec<NewsArticle>,
}

impl ImpactInputs {
    pub fn new(year: i32, month: u32, employment: BTreeMap<String, IndustryEmployment>) -> Self {
        Self {
            year,
            month,
            employment,
            ..Default::default()
        }
    }

    pub fn date(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplacementMethod {
    OccupationMapped,
    SimplifiedUniform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductivitySource {
    BlsEstimated,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplacementDetail {
    pub effect: f64,
    pub pure_automation: f64,
    pub capacity_augmentation: f64,
    pub automation_rate: f64,
    pub augmentation_rate: f64,
    pub capacity_utilization: f64,
    pub confidence: f64,
    pub data_coverage: f64,
    pub calculation_method: DisplacementMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationDetail {
    pub effect: f64,
    pub direct_ai_jobs_ratio: f64,
    pub infrastructure_jobs_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandDetail {
    pub effect: f64,
    pub productivity_gain: f64,
    pub labor_share: f64,
    pub elasticity_factor: f64,
    pub data_source: ProductivitySource,
}

/// Signed contributions of each component to an industry's impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndustryComponents {
    pub displacement_effect: f64,
    pub creation_effect: f64,
    pub demand_effect: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryImpact {
    pub employment: f64,
    pub impact: f64,
    pub jobs_affected: i64,
    pub components: IndustryComponents,
    pub displacement: DisplacementDetail,
    pub creation: CreationDetail,
    pub demand: DemandDetail,
}

/// Economy-wide component values. `displacement_effect` is a magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactComponents {
    pub displacement_effect: f64,
    pub creation_effect: f64,
    pub market_maturity: f64,
    pub adjusted_market_maturity: f64,
    pub demand_effect: f64,
    pub momentum_factor: f64,
    pub news_events_count: usize,
}

impl ImpactComponents {
    pub fn component_set(&self) -> ComponentSet {
        ComponentSet {
            displacement: self.displacement_effect.abs(),
            creation: self.creation_effect,
            market_maturity: self.market_maturity,
            demand: self.demand_effect,
        }
    }
}

/// The four terms of the net impact formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentSet {
    pub displacement: f64,
    pub creation: f64,
    pub market_maturity: f64,
    pub demand: f64,
}

impl ComponentSet {
    /// Fractional employment change, negative for net job loss.
    pub fn impact(&self) -> f64 {
        net_impact(self.displacement, self.creation, self.market_maturity, self.demand)
    }
}

/// `(1 - d + c*m + dm) - 1`.
pub fn net_impact(displacement: f64, creation: f64, maturity: f64, demand: f64) -> f64 {
    let net_impact_pct = 1.0 - displacement + creation * maturity + demand;
    net_impact_pct - 1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFlags {
    pub has_anthropic_data: bool,
    pub has_recent_employment: bool,
    pub has_industry_breakdown: bool,
    pub uses_occupation_mapping: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodologyDetails {
    pub displacement_calculation: DisplacementMethod,
    pub occupation_mapping_coverage: f64,
    pub average_data_coverage: f64,
    pub average_confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactMethod {
    OccupationWeightedComponentBased,
    ComponentBased,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub calculation_method: ImpactMethod,
    pub data_completeness: f64,
    pub confidence_factors: ConfidenceFlags,
    pub methodology_details: MethodologyDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactValidation {
    pub employment_coverage: f64,
    pub bls_total_nonfarm: f64,
    pub validation_passed: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResult {
    pub date: String,
    pub total_impact: f64,
    pub jobs_affected: i64,
    pub total_employment: f64,
    pub transformation_rate: f64,
    pub transformation_by_industry: BTreeMap<String, f64>,
    pub by_industry: BTreeMap<String, IndustryImpact>,
    pub components: ImpactComponents,
    pub data_quality: DataQuality,
    pub validation: ImpactValidation,
}

impl ImpactResult {
    /// Calendar year of `date`, if it parses.
    pub fn base_year(&self) -> Option<i32> {
        self.date.split('-').next()?.parse().ok()
    }
}

/// Computes [`ImpactResult`]s against a fixed set of tables.
#[derive(Debug, Clone, Copy)]
pub struct ImpactCalculator<'a> {
    tables: &'a Tables,
}

impl<'a> ImpactCalculator<'a> {
    pub fn new(tables: &'a Tables) -> Self {
        Self { tables }
    }

    /// Step function of years since the adoption base year: 0.2, 0.5 or 0.8.
    pub fn calculate_market_maturity(&self, year: i32) -> f64 {
        match year - self.tables.calculation.adoption_base_year {
            y if y <= 2 => 0.2,
            y if y <= 5 => 0.5,
            _ => 0.8,
        }
    }

    pub fn calculate_net_impact(&self, inputs: &ImpactInputs) -> Result<ImpactResult> {
        for (industry, emp) in &inputs.employment {
            ensure_finite(emp.current, "employment", industry)?;
            if let Some(previous) = emp.previous {
                ensure_finite(previous, "previous employment", industry)?;
            }
        }

        let momentum = NewsMomentum::from_articles(&inputs.news);
        let market_maturity = self.calculate_market_maturity(inputs.year);
        let adjusted_maturity = market_maturity * momentum.momentum_factor;
        tracing::info!(
            market_maturity,
            adjusted_maturity,
            momentum_factor = momentum.momentum_factor,
            news_events = momentum.total_events,
            "market maturity"
        );

        let total_employment: f64 = inputs
            .employment
            .iter()
            .filter(|(name, _)| !is_aggregate(name))
            .map(|(_, e)| e.current)
            .sum();
        let base_ai_ratio = self.base_ai_job_ratio(inputs.ai_job_postings, total_employment);

        let mut by_industry = BTreeMap::new();
        let mut transformation_by_industry = BTreeMap::new();
        for (industry, emp) in &inputs.employment {
            let displacement = self.displacement_for(industry, emp, inputs)?;
            let creation = self.creation_for(industry, base_ai_ratio);
            let demand = self.demand_for(industry, emp);

            let impact = net_impact(displacement.effect, creation.effect, adjusted_maturity, demand.effect);
            let impact = ensure_finite(impact, "impact", industry)?;
            transformation_by_industry.insert(
                industry.clone(),
                displacement.effect.abs() + creation.effect.abs() + demand.effect.abs(),
            );
            by_industry.insert(
                industry.clone(),
                IndustryImpact {
                    employment: emp.current,
                    impact,
                    jobs_affected: (emp.current * impact).round() as i64,
                    components: IndustryComponents {
                        displacement_effect: -displacement.effect,
                        creation_effect: creation.effect * adjusted_maturity,
                        demand_effect: demand.effect,
                    },
                    displacement,
                    creation,
                    demand,
                },
            );
        }

        let components = ImpactComponents {
            displacement_effect: weighted_average(&by_industry, total_employment, |i| i.displacement.effect),
            creation_effect: weighted_average(&by_industry, total_employment, |i| i.creation.effect),
            market_maturity,
            adjusted_market_maturity: adjusted_maturity,
            demand_effect: weighted_average(&by_industry, total_employment, |i| i.demand.effect),
            momentum_factor: momentum.momentum_factor,
            news_events_count: momentum.total_events,
        };

        let jobs_affected: i64 = by_industry
            .iter()
            .filter(|(name, _)| !is_aggregate(name))
            .map(|(_, i)| i.jobs_affected)
            .sum();
        let (total_impact, transformation_rate) = if total_employment > 0.0 {
            let impact_sum: f64 = by_industry
                .iter()
                .filter(|(name, _)| !is_aggregate(name))
                .map(|(_, i)| i.impact * i.employment)
                .sum();
            let transformation_sum: f64 = by_industry
                .iter()
                .filter(|(name, _)| !is_aggregate(name))
                .map(|(name, i)| transformation_by_industry[name.as_str()] * i.employment)
                .sum();
            (impact_sum / total_employment, transformation_sum / total_employment)
        } else {
            (0.0, 0.0)
        };

        let bls_total = inputs
            .employment
            .get(AGGREGATE_INDUSTRY)
            .map(|e| e.current)
            .unwrap_or(0.0);
        if bls_total > 0.0 {
            let ratio = total_employment / bls_total;
            if (ratio - 1.0).abs() > 0.1 {
                tracing::warn!(
                    industries_total = total_employment,
                    bls_total_nonfarm = bls_total,
                    ratio,
                    "employment sum mismatch"
                );
            }
        }

        let data_quality = self.data_quality(inputs, &by_industry);
        let mut result = ImpactResult {
            date: inputs.date(),
            total_impact,
            jobs_affected,
            total_employment,
            transformation_rate,
            transformation_by_industry,
            by_industry,
            components,
            data_quality,
            validation: ImpactValidation {
                employment_coverage: if bls_total > 0.0 { total_employment / bls_total } else { 0.0 },
                bls_total_nonfarm: bls_total,
                ..Default::default()
            },
        };
        result.validation = validate_result(&result);
        log_component_analysis(&result);
        Ok(result)
    }

    fn displacement_for(
        &self,
        industry: &str,
        emp: &IndustryEmployment,
        inputs: &ImpactInputs,
    ) -> Result<DisplacementDetail> {
        let (rates, confidence, data_coverage, method) = match &inputs.industry_rates {
            Some(mapped) => match resolve::lookup(industry, mapped) {
                Some(rate) => (
                    RatePair {
                        automation: rate.automation_rate,
                        augmentation: rate.augmentation_rate,
                    },
                    rate.confidence,
                    rate.data_coverage,
                    DisplacementMethod::OccupationMapped,
                ),
                None => (UNIFORM_RATES, UNIFORM_CONFIDENCE, 0.0, DisplacementMethod::OccupationMapped),
            },
            None => (
                inputs.average_rates.unwrap_or(UNIFORM_RATES),
                UNIFORM_CONFIDENCE,
                0.0,
                DisplacementMethod::SimplifiedUniform,
            ),
        };
        let automation = as_fraction(ensure_finite(rates.automation, "automation_rate", industry)?);
        let augmentation = as_fraction(ensure_finite(rates.augmentation, "augmentation_rate", industry)?);

        let calc = &self.tables.calculation;
        let params = self.tables.industries.params_for(industry);
        let capacity_utilization = match emp.growth_rate() {
            Some(growth) => utilization_from_growth(growth),
            None => self
                .tables
                .industries
                .capacity_utilization_for(industry, calc.capacity_utilization),
        };

        let pure_automation = automation * params.displacement_factor * calc.implementation_rate;
        let capacity_augmentation =
            augmentation * calc.efficiency_factor * calc.adoption_rate * capacity_utilization;
        let effect = (pure_automation - capacity_augmentation).clamp(0.0, DISPLACEMENT_CAP);

        Ok(DisplacementDetail {
            effect,
            pure_automation,
            capacity_augmentation,
            automation_rate: automation,
            augmentation_rate: augmentation,
            capacity_utilization,
            confidence,
            data_coverage,
            calculation_method: method,
        })
    }

    fn base_ai_job_ratio(&self, postings: Option<u64>, total_employment: f64) -> f64 {
        match postings {
            Some(p) if p > 0 && total_employment > 0.0 => {
                let ratio = p as f64 * POSTINGS_ANNUALIZATION / total_employment;
                tracing::info!(ratio, postings = p, "base AI job ratio from postings");
                ratio
            }
            _ => {
                let ratio = self.tables.calculation.default_ai_job_ratio;
                tracing::warn!(ratio, "no AI postings data, using default AI job ratio");
                ratio
            }
        }
    }

    fn creation_for(&self, industry: &str, base_ai_ratio: f64) -> CreationDetail {
        let industry_ratio = base_ai_ratio * self.tables.industries.params_for(industry).weight;
        let direct = industry_ratio * DIRECT_AI_SHARE;
        let infrastructure = industry_ratio * INFRASTRUCTURE_SHARE;
        CreationDetail {
            effect: (direct + infrastructure).clamp(0.0, CREATION_CAP),
            direct_ai_jobs_ratio: direct,
            infrastructure_jobs_ratio: infrastructure,
        }
    }

    fn demand_for(&self, industry: &str, emp: &IndustryEmployment) -> DemandDetail {
        let calc = &self.tables.calculation;
        let (productivity_gain, data_source) = match emp.growth_rate() {
            Some(growth) => ((0.15 - growth).max(0.01), ProductivitySource::BlsEstimated),
            None => (
                calc.productivity_gain * self.tables.industries.params_for(industry).weight,
                ProductivitySource::Default,
            ),
        };
        let elasticity = self
            .tables
            .industries
            .elasticity_for(industry, calc.elasticity_factor);
        let raw = productivity_gain * calc.labor_share * elasticity;
        DemandDetail {
            effect: raw.clamp(DEMAND_FLOOR, DEMAND_CAP),
            productivity_gain,
            labor_share: calc.labor_share,
            elasticity_factor: elasticity,
            data_source,
        }
    }

    fn data_quality(&self, inputs: &ImpactInputs, by_industry: &BTreeMap<String, IndustryImpact>) -> DataQuality {
        let mapped: Vec<&DisplacementDetail> = by_industry
            .values()
            .map(|i| &i.displacement)
            .filter(|d| d.calculation_method == DisplacementMethod::OccupationMapped)
            .collect();
        let uses_mapping = !mapped.is_empty();

        let methodology_details = if uses_mapping {
            let n = mapped.len() as f64;
            MethodologyDetails {
                displacement_calculation: DisplacementMethod::OccupationMapped,
                occupation_mapping_coverage: n / by_industry.len() as f64,
                average_data_coverage: mapped.iter().map(|d| d.data_coverage).sum::<f64>() / n,
                average_confidence: mapped.iter().map(|d| d.confidence).sum::<f64>() / n,
            }
        } else {
            MethodologyDetails {
                displacement_calculation: DisplacementMethod::SimplifiedUniform,
                occupation_mapping_coverage: 0.0,
                average_data_coverage: 0.0,
                average_confidence: 0.0,
            }
        };

        let has_employment = !inputs.employment.is_empty();
        let has_jobs = inputs.ai_job_postings.is_some();
        let mut completeness = 0.0;
        if has_employment {
            completeness += 0.4;
        }
        if has_jobs {
            completeness += 0.3;
        }
        if inputs.employment.len() > 8 {
            completeness += 0.3;
        }

        DataQuality {
            calculation_method: if uses_mapping {
                ImpactMethod::OccupationWeightedComponentBased
            } else {
                ImpactMethod::ComponentBased
            },
            data_completeness: completeness,
            confidence_factors: ConfidenceFlags {
                has_anthropic_data: inputs.industry_rates.is_some() || inputs.average_rates.is_some(),
                has_recent_employment: has_employment,
                has_industry_breakdown: inputs.employment.len() > 5,
                uses_occupation_mapping: uses_mapping,
            },
            methodology_details,
        }
    }
}

fn is_aggregate(industry: &str) -> bool {
    industry == AGGREGATE_INDUSTRY
}

/// Percentages above 1 are rescaled to fractions.
fn as_fraction(rate: f64) -> f64 {
    if rate > 1.0 {
        rate / 100.0
    } else {
        rate
    }
}

/// Faster-growing industries have more slack for AI-augmented work.
fn utilization_from_growth(growth: f64) -> f64 {
    if growth > 0.05 {
        0.3
    } else if growth > 0.02 {
        0.5
    } else if growth > -0.02 {
        0.7
    } else {
        0.9
    }
}

/// Employment-weighted mean excluding the aggregate row; plain mean over
/// every industry when no employment is recorded.
fn weighted_average(
    by_industry: &BTreeMap<String, IndustryImpact>,
    total_employment: f64,
    value: impl Fn(&IndustryImpact) -> f64,
) -> f64 {
    if by_industry.is_empty() {
        return 0.0;
    }
    if total_employment > 0.0 {
        by_industry
            .iter()
            .filter(|(name, _)| !is_aggregate(name))
            .map(|(_, i)| value(i) * i.employment)
            .sum::<f64>()
            / total_employment
    } else {
        by_industry.values().map(&value).sum::<f64>() / by_industry.len() as f64
    }
}

fn validate_result(result: &ImpactResult) -> ImpactValidation {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let total = result.total_impact;
    if total.abs() > 0.5 {
        warnings.push(format!("Very large total impact: {total:.4} ({:.1}%)", total * 100.0));
    }

    let bls_total = result.validation.bls_total_nonfarm;
    if bls_total > 0.0 {
        let coverage = result.total_employment / bls_total;
        if coverage < 0.8 {
            warnings.push(format!(
                "Low employment coverage: {coverage:.2} (missing {:.1}% of workforce)",
                (1.0 - coverage) * 100.0
            ));
        } else if coverage > 1.1 {
            errors.push(format!("Employment sum exceeds BLS total: {coverage:.2}"));
        }
    }

    let extreme: Vec<String> = result
        .by_industry
        .iter()
        .filter(|(name, i)| !is_aggregate(name) && i.impact.abs() > 0.3)
        .map(|(name, i)| format!("{name}: {:.3}", i.impact))
        .collect();
    if !extreme.is_empty() {
        warnings.push(format!("Extreme industry impacts: {}", extreme.join(", ")));
    }

    let c = &result.components;
    if c.displacement_effect.abs() > DISPLACEMENT_CAP {
        warnings.push(format!("Very high displacement effect: {:.3}", c.displacement_effect));
    }
    if c.creation_effect > CREATION_CAP {
        warnings.push(format!("Very high creation effect: {:.3}", c.creation_effect));
    }
    if c.demand_effect.abs() > 0.3 {
        warnings.push(format!("Unusual demand effect: {:.3}", c.demand_effect));
    }

    let mut scalars = vec![
        ("total_impact".to_string(), result.total_impact),
        ("total_employment".to_string(), result.total_employment),
        ("transformation_rate".to_string(), result.transformation_rate),
        ("components.displacement_effect".to_string(), c.displacement_effect),
        ("components.creation_effect".to_string(), c.creation_effect),
        ("components.demand_effect".to_string(), c.demand_effect),
    ];
    for (name, i) in &result.by_industry {
        scalars.push((format!("by_industry.{name}.impact"), i.impact));
    }
    for (path, value) in scalars {
        if !value.is_finite() {
            errors.push(format!("Invalid numeric value at {path}: {value}"));
        }
    }

    if result.total_employment > 0.0 {
        let jobs_ratio = result.jobs_affected.unsigned_abs() as f64 / result.total_employment;
        if jobs_ratio > 0.5 {
            warnings.push(format!("Very high jobs affected ratio: {jobs_ratio:.3}"));
        }
    }

    let passed = errors.is_empty();
    tracing::info!(validation_passed = passed, warnings = warnings.len(), "impact validation");
    for w in &warnings {
        tracing::warn!("{w}");
    }
    for e in &errors {
        tracing::error!("{e}");
    }

    ImpactValidation {
        employment_coverage: result.validation.employment_coverage,
        bls_total_nonfarm: bls_total,
        validation_passed: passed,
        warnings,
        errors,
    }
}

fn log_component_analysis(result: &ImpactResult) {
    let c = &result.components;
    tracing::info!(
        displacement = c.displacement_effect,
        creation = c.creation_effect,
        demand = c.demand_effect,
        market_maturity = c.market_maturity,
        adjusted = c.adjusted_market_maturity,
        "component analysis"
    );

    let mut ranked: Vec<(&String, &IndustryImpact)> = result.by_industry.iter().collect();
    ranked.sort_by(|a, b| b.1.displacement.effect.total_cmp(&a.1.displacement.effect));
    for (industry, i) in ranked.iter().take(3) {
        tracing::debug!(
            industry = industry.as_str(),
            effect = i.displacement.effect,
            automation = i.displacement.pure_automation,
            augmentation = i.displacement.capacity_augmentation,
            "top displacement"
        );
    }
    ranked.sort_by(|a, b| b.1.creation.effect.total_cmp(&a.1.creation.effect));
    for (industry, i) in ranked.iter().take(3) {
        tracing::debug!(industry = industry.as_str(), effect = i.creation.effect, "top creation");
    }
    ranked.sort_by(|a, b| b.1.demand.effect.total_cmp(&a.1.demand.effect));
    for (industry, i) in ranked.iter().take(3) {
        tracing::debug!(
            industry = industry.as_str(),
            effect = i.demand.effect,
            productivity = i.demand.productivity_gain,
            "top demand"
        );
    }

    tracing::info!(
        date = result.date.as_str(),
        total_impact = result.total_impact,
        jobs_affected = result.jobs_affected,
        transformation_rate = result.transformation_rate,
        "net impact calculated"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economic::aggregator::CalculationMethod;

    fn employment(entries: &[(&str, f64)]) -> BTreeMap<String, IndustryEmployment> {
        entries
            .iter()
            .map(|(name, current)| (name.to_string(), IndustryEmployment::new(*current)))
            .collect()
    }

    fn three_industries() -> ImpactInputs {
        ImpactInputs::new(
            2025,
            6,
            employment(&[
                ("Information", 1_000_000.0),
                ("Manufacturing", 1_000_000.0),
                ("Total Nonfarm", 2_000_000.0),
            ]),
        )
    }

    #[test]
    fn market_maturity_is_a_step_function() {
        let tables = Tables::default();
        let calc = ImpactCalculator::new(&tables);
        let cases = [(1, 0.2), (2, 0.2), (3, 0.5), (5, 0.5), (6, 0.8), (10, 0.8)];
        for (elapsed, expected) in cases {
            assert_eq!(calc.calculate_market_maturity(2020 + elapsed), expected, "{elapsed}");
        }
    }

    #[test]
    fn aggregate_row_reported_but_not_weighted() {
        let tables = Tables::default();
        let result = ImpactCalculator::new(&tables)
            .calculate_net_impact(&three_industries())
            .unwrap();

        assert_eq!(result.by_industry.len(), 3);
        assert!(result.by_industry.contains_key("Total Nonfarm"));
        assert_eq!(result.total_employment, 2_000_000.0);

        let jobs: i64 = ["Information", "Manufacturing"]
            .iter()
            .map(|k| result.by_industry[*k].jobs_affected)
            .sum();
        assert_eq!(result.jobs_affected, jobs);

        let expected = (result.by_industry["Information"].impact
            + result.by_industry["Manufacturing"].impact)
            / 2.0;
        assert!((result.total_impact - expected).abs() < 1e-12);
        assert!((result.validation.employment_coverage - 1.0).abs() < 1e-12);
        assert!(result.validation.validation_passed);
    }

    #[test]
    fn impact_follows_component_formula() {
        let tables = Tables::default();
        let result = ImpactCalculator::new(&tables)
            .calculate_net_impact(&three_industries())
            .unwrap();
        let m = result.components.adjusted_market_maturity;
        for i in result.by_industry.values() {
            let expected = -i.displacement.effect + i.creation.effect * m + i.demand.effect;
            assert!((i.impact - expected).abs() < 1e-12);
            assert_eq!(i.jobs_affected, (i.employment * i.impact).round() as i64);
        }
        // 2025 is five years after 2020
        assert_eq!(result.components.market_maturity, 0.5);
        assert_eq!(result.components.momentum_factor, 1.0);
    }

    #[test]
    fn default_creation_uses_fallback_ratio() {
        let tables = Tables::default();
        let result = ImpactCalculator::new(&tables)
            .calculate_net_impact(&three_industries())
            .unwrap();
        // Information weight 2.0
        assert!((result.by_industry["Information"].creation.effect - 0.06).abs() < 1e-12);
        assert!((result.by_industry["Manufacturing"].creation.effect - 0.03).abs() < 1e-12);
    }

    #[test]
    fn postings_drive_creation_ratio() {
        let tables = Tables::default();
        let mut inputs = three_industries();
        inputs.ai_job_postings = Some(1_000);
        let result = ImpactCalculator::new(&tables).calculate_net_impact(&inputs).unwrap();
        // 1000 * 24 / 2_000_000 = 0.012, times Manufacturing weight 1.0
        assert!((result.by_industry["Manufacturing"].creation.effect - 0.012).abs() < 1e-12);
        assert!((result.data_quality.data_completeness - 0.7).abs() < 1e-12);
    }

    #[test]
    fn components_are_clipped_for_extreme_rates() {
        let tables = Tables::default();
        let calc = ImpactCalculator::new(&tables);
        for (automation, augmentation) in [(5000.0, 0.0), (0.0, 5000.0), (-3.0, -7.0), (1.0, 1.0), (99.0, 1.0)] {
            let mut inputs = three_industries();
            inputs.average_rates = Some(RatePair {
                automation,
                augmentation,
            });
            inputs.ai_job_postings = Some(u64::MAX / 4);
            inputs.employment.insert(
                "Mining and Logging".to_string(),
                IndustryEmployment::new(10.0).with_previous(1_000.0),
            );

            let result = calc.calculate_net_impact(&inputs).unwrap();
            for i in result.by_industry.values() {
                assert!((0.0..=DISPLACEMENT_CAP).contains(&i.displacement.effect));
                assert!((0.0..=CREATION_CAP).contains(&i.creation.effect));
                assert!((DEMAND_FLOOR..=DEMAND_CAP).contains(&i.demand.effect));
            }
        }
    }

    #[test]
    fn nan_employment_is_rejected() {
        let tables = Tables::default();
        let inputs = ImpactInputs::new(2025, 1, employment(&[("Information", f64::NAN)]));
        assert!(ImpactCalculator::new(&tables).calculate_net_impact(&inputs).is_err());
    }

    #[test]
    fn growth_sets_capacity_and_productivity() {
        let tables = Tables::default();
        let mut inputs = three_industries();
        inputs.employment.insert(
            "Information".to_string(),
            IndustryEmployment::new(1_100_000.0).with_previous(1_000_000.0),
        );
        let result = ImpactCalculator::new(&tables).calculate_net_impact(&inputs).unwrap();
        let info = &result.by_industry["Information"];
        assert_eq!(info.displacement.capacity_utilization, 0.3);
        assert_eq!(info.demand.data_source, ProductivitySource::BlsEstimated);
        assert!((info.demand.productivity_gain - 0.05).abs() < 1e-12);

        let manufacturing = &result.by_industry["Manufacturing"];
        assert_eq!(manufacturing.demand.data_source, ProductivitySource::Default);
        assert_eq!(manufacturing.displacement.capacity_utilization, 0.8);
    }

    #[test]
    fn utilization_bands() {
        assert_eq!(utilization_from_growth(0.06), 0.3);
        assert_eq!(utilization_from_growth(0.03), 0.5);
        assert_eq!(utilization_from_growth(0.0), 0.7);
        assert_eq!(utilization_from_growth(-0.05), 0.9);
    }

    #[test]
    fn mapped_rates_take_precedence() {
        let tables = Tables::default();
        let mut inputs = three_industries();
        let mut rates = BTreeMap::new();
        rates.insert(
            "information".to_string(),
            IndustryRate {
                automation_rate: 0.9,
                augmentation_rate: 0.0,
                data_coverage: 0.8,
                confidence: 0.7,
                avg_data_confidence: 0.7,
                total_employment: 100,
                occupations_analyzed: 3,
                calculation_method: CalculationMethod::OccupationWeighted,
            },
        );
        inputs.industry_rates = Some(rates);

        let result = ImpactCalculator::new(&tables).calculate_net_impact(&inputs).unwrap();
        let info = &result.by_industry["Information"].displacement;
        assert_eq!(info.automation_rate, 0.9);
        assert_eq!(info.confidence, 0.7);
        assert!((info.effect - 0.9 * 0.6 * 0.12).abs() < 1e-12);

        let manufacturing = &result.by_industry["Manufacturing"].displacement;
        assert_eq!(manufacturing.automation_rate, 0.30);
        assert_eq!(manufacturing.data_coverage, 0.0);
        assert_eq!(
            result.data_quality.calculation_method,
            ImpactMethod::OccupationWeightedComponentBased
        );
        assert!(result.data_quality.confidence_factors.uses_occupation_mapping);
    }

    #[test]
    fn news_momentum_scores_keywords() {
        let articles = vec![
            NewsArticle {
                title: "AI Breakthrough".into(),
                description: String::new(),
            },
            NewsArticle {
                title: "Growth and risk".into(),
                description: String::new(),
            },
            NewsArticle {
                title: "Job loss fears".into(),
                description: String::new(),
            },
            NewsArticle::default(),
        ];
        let m = NewsMomentum::from_articles(&articles);
        assert_eq!(m.momentum_score, 1);
        assert_eq!(m.positive_events, 2);
        assert_eq!(m.total_events, 4);
        assert!((m.momentum_factor - 1.2).abs() < 1e-12);

        let gloomy = vec![
            NewsArticle {
                title: "Decline".into(),
                description: String::new(),
            };
            3
        ];
        assert_eq!(NewsMomentum::from_articles(&gloomy).momentum_factor, 0.8);
        assert_eq!(NewsMomentum::from_articles(&[]).momentum_factor, 1.0);
    }

    #[test]
    fn coverage_mismatch_is_flagged() {
        let tables = Tables::default();
        let inputs = ImpactInputs::new(
            2025,
            1,
            employment(&[("Information", 1_000.0), ("Total Nonfarm", 10_000.0)]),
        );
        let result = ImpactCalculator::new(&tables).calculate_net_impact(&inputs).unwrap();
        assert!(result
            .validation
            .warnings
            .iter()
            .any(|w| w.starts_with("Low employment coverage")));

        let inputs = ImpactInputs::new(
            2025,
            1,
            employment(&[("Information", 20_000.0), ("Total Nonfarm", 10_000.0)]),
        );
        let result = ImpactCalculator::new(&tables).calculate_net_impact(&inputs).unwrap();
        assert!(!result.validation.validation_passed);
    }

    #[test]
    fn empty_employment_yields_zero_impact() {
        let tables = Tables::default();
        let inputs = ImpactInputs::new(2025, 1, BTreeMap::new());
        let result = ImpactCalculator::new(&tables).calculate_net_impact(&inputs).unwrap();
        assert_eq!(result.total_impact, 0.0);
        assert_eq!(result.jobs_affected, 0);
        assert_eq!(result.date, "2025-01");
        assert_eq!(result.base_year(), Some(2025));
    }
}
