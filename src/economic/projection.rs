//! Multi-year projections.
//!
//! Two models run side by side for each scenario:
//!
//! - the economy-wide component set evolves with simple capped growth
//!   multipliers per year, then feeds the net impact formula;
//! - each industry's adoption follows a logistic S-curve fitted through its
//!   current adoption level, and its impact scales with adoption growth.
//!
//! The summary takes `moderate` as the central path and whichever of
//! `conservative`/`aggressive` is lower (higher) as pessimistic (optimistic).

use super::impact::{net_impact, ComponentSet, ImpactResult};
use super::tables::{Scenario, ScenarioParams, Tables};
use crate::error::{ensure_finite, ImpactError, Result};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAX_ADOPTION_CEILING: f64 = 0.95;
const MIN_ADOPTION: f64 = 0.01;
/// Current adoption is kept strictly below the ceiling so the fit stays finite.
const CEILING_MARGIN: f64 = 0.99;

const BASE_ADOPTION: f64 = 0.3;
/// Diminishing returns of impact on adoption growth.
const ADOPTION_ELASTICITY: f64 = 0.7;
const RANGE_WIDTH: f64 = 0.2;

const MATURITY_STEP: f64 = 0.1;
const DISPLACEMENT_CAP: f64 = 0.8;
const CREATION_CAP: f64 = 0.5;
const DEMAND_CAP: f64 = 0.3;

/// Logistic adoption curve `L / (1 + e^{-k(t - t0)})` anchored at `t = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SCurve {
    pub ceiling: f64,
    pub speed: f64,
    pub inflection: f64,
    /// Adoption at `t = 0` after clamping.
    pub start: f64,
}

impl SCurve {
    /// Fit the inflection point so the curve passes through `current` at `t = 0`.
    pub fn fit(current: f64, ceiling: f64, speed: f64) -> Result<Self> {
        if !(ceiling > 0.0 && ceiling.is_finite()) {
            return Err(ImpactError::InvalidConfig(format!(
                "adoption ceiling must be positive, got {ceiling}"
            )));
        }
        if !(speed > 0.0 && speed.is_finite()) {
            return Err(ImpactError::InvalidConfig(format!(
                "adoption speed must be positive, got {speed}"
            )));
        }

        let start = ensure_finite(current, "current adoption", "s-curve")?
            .max(MIN_ADOPTION)
            .min(ceiling * CEILING_MARGIN);
        let inflection = (ceiling / start - 1.0).ln() / speed;
        Ok(Self {
            ceiling,
            speed,
            inflection,
            start,
        })
    }

    pub fn at(&self, t: f64) -> f64 {
        self.ceiling / (1.0 + (-self.speed * (t - self.inflection)).exp())
    }

    /// Adoption for years `1..=years`.
    pub fn project(&self, years: u32) -> Vec<f64> {
        (1..=years).map(|y| self.at(f64::from(y))).collect()
    }
}

/// Yearly component values for one scenario, index 0 being the first future year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentEvolution {
    pub market_maturity: Vec<f64>,
    pub displacement_effect: Vec<f64>,
    pub creation_effect: Vec<f64>,
    pub demand_effect: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndustryProjection {
    pub central: f64,
    /// `[low, high]`
    pub range: [f64; 2],
}

pub type IndustryProjections = BTreeMap<String, BTreeMap<i32, IndustryProjection>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProjection {
    pub central_projections: BTreeMap<i32, f64>,
    pub component_evolution: ComponentEvolution,
    pub industry_projections: IndustryProjections,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionBand {
    pub central: f64,
    pub pessimistic: f64,
    pub optimistic: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub base_date: String,
    pub projections: BTreeMap<i32, ProjectionBand>,
    pub by_industry: IndustryProjections,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionReport {
    pub generated_at: DateTime<Utc>,
    pub base_impact_date: String,
    pub projection_years: u32,
    pub scenarios: BTreeMap<Scenario, ScenarioProjection>,
    pub summary: ProjectionSummary,
}

pub struct ProjectionEngine<'a> {
    tables: &'a Tables,
    years: u32,
}

impl<'a> ProjectionEngine<'a> {
    pub fn new(tables: &'a Tables, years: u32) -> Result<Self> {
        if years == 0 {
            return Err(ImpactError::InvalidConfig(
                "projection years must be at least 1".to_string(),
            ));
        }
        Ok(Self { tables, years })
    }

    pub fn years(&self) -> u32 {
        self.years
    }

    /// S-curve for `industry` under `scenario`, through `current_adoption`.
    pub fn adoption_curve(&self, current_adoption: f64, industry: &str, scenario: Scenario) -> Result<SCurve> {
        let params = self.tables.industries.params_for(industry);
        let s = self.tables.scenarios.get(scenario);
        let ceiling = (params.adoption_ceiling * (1.0 + s.adoption_growth)).min(MAX_ADOPTION_CEILING);
        let speed = params.adoption_speed * (1.0 + s.implementation_acceleration);
        SCurve::fit(current_adoption, ceiling, speed)
    }

    pub fn component_evolution(&self, base: &ComponentSet, scenario: Scenario) -> ComponentEvolution {
        let s = self.tables.scenarios.get(scenario);
        let mut evolution = ComponentEvolution::default();
        for year in 1..=self.years {
            let y = f64::from(year);
            evolution
                .market_maturity
                .push((base.market_maturity + MATURITY_STEP * y).min(1.0));
            // implementation gains fade by a tenth per year
            evolution.displacement_effect.push(
                (base.displacement.abs() * (1.0 + s.implementation_acceleration * (1.0 - 0.1 * y)))
                    .min(DISPLACEMENT_CAP),
            );
            evolution
                .creation_effect
                .push((base.creation * (1.0 + s.adoption_growth * y)).min(CREATION_CAP));
            evolution
                .demand_effect
                .push((base.demand * (1.0 + s.efficiency_improvement * y)).min(DEMAND_CAP));
        }
        evolution
    }

    /// Net impact per projected calendar year.
    pub fn central_projections(&self, evolution: &ComponentEvolution, base_year: i32) -> Result<BTreeMap<i32, f64>> {
        let rows = evolution
            .displacement_effect
            .iter()
            .zip(&evolution.creation_effect)
            .zip(&evolution.market_maturity)
            .zip(&evolution.demand_effect);

        let mut out = BTreeMap::new();
        for (idx, (((d, c), m), dm)) in rows.enumerate() {
            let year = base_year + idx as i32 + 1;
            let impact = net_impact(*d, *c, *m, *dm);
            out.insert(year, ensure_finite(impact, "projected impact", &year.to_string())?);
        }
        Ok(out)
    }

    pub fn industry_projections(
        &self,
        impact: &ImpactResult,
        scenario: Scenario,
        base_year: i32,
    ) -> Result<IndustryProjections> {
        let s = self.tables.scenarios.get(scenario);
        let mut out = BTreeMap::new();
        for (industry, data) in &impact.by_industry {
            let current = data.impact;
            let curve = self.adoption_curve((BASE_ADOPTION + current).max(MIN_ADOPTION), industry, scenario)?;
            let adjustment = scenario_adjustment(current, &s);

            let mut yearly = BTreeMap::new();
            for (idx, adoption) in curve.project(self.years).into_iter().enumerate() {
                let scaling = (adoption / curve.start).powf(ADOPTION_ELASTICITY);
                let central = ensure_finite(current * scaling * adjustment, "industry projection", industry)?;
                let (a, b) = (central * (1.0 - RANGE_WIDTH), central * (1.0 + RANGE_WIDTH));
                yearly.insert(
                    base_year + idx as i32 + 1,
                    IndustryProjection {
                        central,
                        range: [a.min(b), a.max(b)],
                    },
                );
            }
            out.insert(industry.clone(), yearly);
        }
        Ok(out)
    }

    pub fn project_scenario(&self, impact: &ImpactResult, scenario: Scenario, base_year: i32) -> Result<ScenarioProjection> {
        let component_evolution = self.component_evolution(&impact.components.component_set(), scenario);
        Ok(ScenarioProjection {
            central_projections: self.central_projections(&component_evolution, base_year)?,
            industry_projections: self.industry_projections(impact, scenario, base_year)?,
            component_evolution,
        })
    }

    /// Full projection for the requested scenarios plus the three-band summary.
    pub fn generate(&self, impact: &ImpactResult, scenarios: &[Scenario]) -> Result<ProjectionReport> {
        let base_year = impact.base_year().unwrap_or_else(|| {
            let year = Utc::now().year();
            tracing::warn!(date = impact.date.as_str(), year, "unparseable impact date, projecting from current year");
            year
        });

        let mut computed = BTreeMap::new();
        for &scenario in scenarios {
            tracing::info!(scenario = scenario.as_str(), years = self.years, "generating projections");
            computed.insert(scenario, self.project_scenario(impact, scenario, base_year)?);
        }
        let summary_source = |scenario: Scenario| -> Result<ScenarioProjection> {
            match computed.get(&scenario) {
                Some(p) => Ok(p.clone()),
                None => self.project_scenario(impact, scenario, base_year),
            }
        };
        let conservative = summary_source(Scenario::Conservative)?;
        let moderate = summary_source(Scenario::Moderate)?;
        let aggressive = summary_source(Scenario::Aggressive)?;

        let mut projections = BTreeMap::new();
        for (year, &central) in &moderate.central_projections {
            let c = conservative.central_projections.get(year).copied().unwrap_or(0.0);
            let a = aggressive.central_projections.get(year).copied().unwrap_or(0.0);
            projections.insert(
                *year,
                ProjectionBand {
                    central,
                    pessimistic: c.min(a),
                    optimistic: c.max(a),
                },
            );
        }

        Ok(ProjectionReport {
            generated_at: Utc::now(),
            base_impact_date: impact.date.clone(),
            projection_years: self.years,
            summary: ProjectionSummary {
                base_date: impact.date.clone(),
                projections,
                by_industry: moderate.industry_projections,
            },
            scenarios: computed,
        })
    }
}

/// Losses scale with implementation pace, gains with adoption growth.
fn scenario_adjustment(impact: f64, s: &ScenarioParams) -> f64 {
    if impact < 0.0 {
        1.0 + s.implementation_acceleration
    } else {
        1.0 + s.adoption_growth
    }
}
