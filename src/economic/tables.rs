//! Fixed calculation tables.
//!
//! Every hand-tuned constant of the index lives here as immutable data,
//! built once (`Tables::default()`) and passed by reference into the
//! components. Config overrides and tests swap individual tables without
//! touching any global state.

use super::resolve;
use super::soc::SocGroupTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ImpactError;

/// Aggregate row in BLS employment data. Excluded from every weighted total.
pub const AGGREGATE_INDUSTRY: &str = "Total Nonfarm";

/// Per-industry parameters of the impact and adoption formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndustryParams {
    pub weight: f64,
    pub adoption_ceiling: f64,
    pub adoption_speed: f64,
    pub displacement_factor: f64,
}

/// Used for industries absent from the parameter table.
pub const DEFAULT_INDUSTRY_PARAMS: IndustryParams = IndustryParams {
    weight: 1.0,
    adoption_ceiling: 0.8,
    adoption_speed: 1.0,
    displacement_factor: 0.6,
};

/// Economy-wide constants of the component formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculationDefaults {
    /// Annual share of automatable work actually implemented.
    pub implementation_rate: f64,
    /// Efficiency of augmentation at absorbing work.
    pub efficiency_factor: f64,
    /// Survey adoption rate.
    pub adoption_rate: f64,
    pub capacity_utilization: f64,
    pub market_maturity: f64,
    pub productivity_gain: f64,
    pub labor_share: f64,
    pub elasticity_factor: f64,
    /// AI jobs as a share of employment when no postings data exists.
    pub default_ai_job_ratio: f64,
    /// Year significant AI adoption began; market maturity counts from here.
    pub adoption_base_year: i32,
}

impl Default for CalculationDefaults {
    fn default() -> Self {
        Self {
            implementation_rate: 0.12,
            efficiency_factor: 0.5,
            adoption_rate: 0.3,
            capacity_utilization: 0.7,
            market_maturity: 0.4,
            productivity_gain: 0.15,
            labor_share: 0.6,
            elasticity_factor: 0.1,
            default_ai_job_ratio: 0.03,
            adoption_base_year: 2020,
        }
    }
}

/// An automation/augmentation pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePair {
    pub automation: f64,
    pub augmentation: f64,
}

/// Inclusive `[lo, hi]` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub lo: f64,
    pub hi: f64,
}

impl Range {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lo <= value && value <= self.hi
    }
}

/// Research-informed band an industry's rates are expected to fall in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedRange {
    pub automation: Range,
    pub augmentation: Range,
}

/// Per-industry tables, all resolved through [`resolve::lookup`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndustryTables {
    pub params: BTreeMap<String, IndustryParams>,
    pub capacity_utilization: BTreeMap<String, f64>,
    pub elasticity: BTreeMap<String, f64>,
    /// Rates used when an industry has no employment to weight by.
    pub fallback_rates: BTreeMap<String, RatePair>,
    pub fallback_default: RatePair,
    /// Multiplier on industry confidence reflecting research depth.
    pub confidence_factors: BTreeMap<String, f64>,
    pub expected_ranges: BTreeMap<String, ExpectedRange>,
    /// Semantic clusters whose members should have similar rates.
    pub consistency_clusters: Vec<(String, Vec<String>)>,
}

fn table<V: Copy>(entries: &[(&str, V)]) -> BTreeMap<String, V> {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
}

const fn params(weight: f64, ceiling: f64, speed: f64, displacement: f64) -> IndustryParams {
    IndustryParams {
        weight,
        adoption_ceiling: ceiling,
        adoption_speed: speed,
        displacement_factor: displacement,
    }
}

const fn rates(automation: f64, augmentation: f64) -> RatePair {
    RatePair {
        automation,
        augmentation,
    }
}

const fn expected(auto: (f64, f64), aug: (f64, f64)) -> ExpectedRange {
    ExpectedRange {
        automation: Range::new(auto.0, auto.1),
        augmentation: Range::new(aug.0, aug.1),
    }
}

impl Default for IndustryTables {
    fn default() -> Self {
        let params = table(&[
            ("Information", params(2.0, 0.95, 1.5, 0.6)),
            ("Professional and Business Services", params(1.5, 0.85, 1.2, 0.5)),
            ("Financial Activities", params(1.2, 0.85, 1.3, 0.6)),
            ("Education and Health Services", params(1.0, 0.75, 0.7, 0.3)),
            ("Manufacturing", params(1.0, 0.80, 1.0, 0.8)),
            ("Trade, Transportation, and Utilities", params(0.8, 0.70, 1.2, 0.7)),
            ("Leisure and Hospitality", params(0.5, 0.65, 0.8, 0.7)),
            ("Construction", params(0.5, 0.60, 0.7, 0.6)),
            ("Mining and Logging", params(0.4, 0.55, 0.6, 0.5)),
            ("Other Services", params(0.6, 0.65, 0.8, 0.5)),
            ("Government", params(0.7, 0.60, 0.5, 0.4)),
            (AGGREGATE_INDUSTRY, params(1.0, 0.75, 1.0, 0.6)),
        ]);

        let capacity_utilization = table(&[
            ("Information", 0.4),
            ("Professional and Business Services", 0.5),
            ("Financial Activities", 0.6),
            ("Education and Health Services", 0.7),
            ("Manufacturing", 0.8),
            ("Trade, Transportation, and Utilities", 0.7),
            ("Leisure and Hospitality", 0.8),
            ("Construction", 0.8),
            ("Mining and Logging", 0.9),
            ("Other Services", 0.7),
            ("Government", 0.8),
            (AGGREGATE_INDUSTRY, 0.7),
        ]);

        let elasticity = table(&[
            ("Manufacturing", -0.3),
            ("Information", 0.1),
            ("Professional and Business Services", 0.2),
            ("Financial Activities", 0.1),
            ("Education and Health Services", 0.2),
            ("Trade, Transportation, and Utilities", -0.1),
            ("Leisure and Hospitality", 0.15),
            ("Construction", -0.2),
            ("Mining and Logging", -0.4),
            ("Other Services", 0.1),
            ("Government", 0.05),
            (AGGREGATE_INDUSTRY, 0.1),
        ]);

        let fallback_rates = table(&[
            ("Information", rates(0.25, 0.75)),
            ("Professional and Business Services", rates(0.35, 0.65)),
            ("Financial Activities", rates(0.40, 0.60)),
            ("Education and Health Services", rates(0.20, 0.60)),
            ("Manufacturing", rates(0.50, 0.40)),
            ("Trade, Transportation, and Utilities", rates(0.60, 0.30)),
        ]);

        let confidence_factors = table(&[
            ("Information", 1.2),
            ("Professional and Business Services", 1.1),
            ("Financial Activities", 1.1),
            ("Manufacturing", 1.0),
            ("Education and Health Services", 0.9),
            ("Trade, Transportation, and Utilities", 0.8),
            ("Construction", 0.7),
            ("Government", 0.6),
            ("Agriculture", 0.5),
        ]);

        let expected_ranges = table(&[
            ("Information", expected((0.15, 0.40), (0.60, 0.85))),
            ("Professional and Business Services", expected((0.25, 0.50), (0.50, 0.75))),
            ("Financial Activities", expected((0.30, 0.55), (0.45, 0.70))),
            ("Education and Health Services", expected((0.10, 0.35), (0.50, 0.80))),
            ("Manufacturing", expected((0.40, 0.70), (0.25, 0.50))),
            ("Trade, Transportation, and Utilities", expected((0.45, 0.75), (0.20, 0.45))),
        ]);

        let cluster = |name: &str, members: &[&str]| {
            (
                name.to_string(),
                members.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
            )
        };
        let consistency_clusters = vec![
            cluster(
                "technology_related",
                &["Information", "Professional and Business Services"],
            ),
            cluster(
                "service_oriented",
                &["Education and Health Services", "Leisure and Hospitality"],
            ),
            cluster(
                "traditional_industries",
                &["Manufacturing", "Construction", "Mining and Logging"],
            ),
        ];

        Self {
            params,
            capacity_utilization,
            elasticity,
            fallback_rates,
            fallback_default: rates(0.40, 0.50),
            confidence_factors,
            expected_ranges,
            consistency_clusters,
        }
    }
}

impl IndustryTables {
    /// Parameters for `industry`, or [`DEFAULT_INDUSTRY_PARAMS`] when unmatched.
    pub fn params_for(&self, industry: &str) -> IndustryParams {
        resolve::lookup(industry, &self.params)
            .copied()
            .unwrap_or_else(|| {
                tracing::debug!(industry, "no specific parameters, using defaults");
                DEFAULT_INDUSTRY_PARAMS
            })
    }

    pub fn capacity_utilization_for(&self, industry: &str, default: f64) -> f64 {
        resolve::lookup(industry, &self.capacity_utilization)
            .copied()
            .unwrap_or(default)
    }

    pub fn elasticity_for(&self, industry: &str, default: f64) -> f64 {
        resolve::lookup(industry, &self.elasticity)
            .copied()
            .unwrap_or(default)
    }

    pub fn fallback_rates_for(&self, industry: &str) -> RatePair {
        resolve::lookup(industry, &self.fallback_rates)
            .copied()
            .unwrap_or(self.fallback_default)
    }

    pub fn confidence_factor_for(&self, industry: &str) -> f64 {
        resolve::lookup(industry, &self.confidence_factors)
            .copied()
            .unwrap_or(1.0)
    }

    pub fn expected_range_for(&self, industry: &str) -> Option<ExpectedRange> {
        resolve::lookup(industry, &self.expected_ranges).copied()
    }

    /// Replace or add parameter rows, e.g. from `[industry_params.*]` config.
    pub fn with_param_overrides(mut self, overrides: &BTreeMap<String, IndustryParams>) -> Self {
        for (name, params) in overrides {
            let key = resolve::resolve_industry_key(name, &self.params)
                .map(|(key, _)| key.to_string())
                .unwrap_or_else(|| name.clone());
            self.params.insert(key, *params);
        }
        self
    }
}

/// Adoption scenarios for projections. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Conservative,
    Moderate,
    Aggressive,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Self::Conservative, Self::Moderate, Self::Aggressive];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = ImpactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "moderate" => Ok(Self::Moderate),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(ImpactError::UnknownScenario(other.to_string())),
        }
    }
}

/// Growth-rate multipliers of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub adoption_growth: f64,
    pub efficiency_improvement: f64,
    pub implementation_acceleration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioTable {
    pub conservative: ScenarioParams,
    pub moderate: ScenarioParams,
    pub aggressive: ScenarioParams,
}

impl Default for ScenarioTable {
    fn default() -> Self {
        Self {
            conservative: ScenarioParams {
                adoption_growth: 0.15,
                efficiency_improvement: 0.05,
                implementation_acceleration: 0.10,
            },
            moderate: ScenarioParams {
                adoption_growth: 0.30,
                efficiency_improvement: 0.10,
                implementation_acceleration: 0.20,
            },
            aggressive: ScenarioParams {
                adoption_growth: 0.50,
                efficiency_improvement: 0.15,
                implementation_acceleration: 0.35,
            },
        }
    }
}

impl ScenarioTable {
    pub fn get(&self, scenario: Scenario) -> ScenarioParams {
        match scenario {
            Scenario::Conservative => self.conservative,
            Scenario::Moderate => self.moderate,
            Scenario::Aggressive => self.aggressive,
        }
    }
}

/// Half-widths of the uniform multiplicative noise used by Monte Carlo runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerturbationWidths {
    pub adoption: f64,
    pub efficiency: f64,
    pub implementation: f64,
    pub displacement: f64,
    pub creation: f64,
    pub demand: f64,
}

impl Default for PerturbationWidths {
    fn default() -> Self {
        Self {
            adoption: 0.10,
            efficiency: 0.05,
            implementation: 0.15,
            displacement: 0.10,
            creation: 0.20,
            demand: 0.15,
        }
    }
}

/// Every table the components read, bundled for injection.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub soc_groups: SocGroupTable,
    pub industries: IndustryTables,
    pub calculation: CalculationDefaults,
    pub scenarios: ScenarioTable,
    pub perturbation: PerturbationWidths,
}
