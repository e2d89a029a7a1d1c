//! Monte Carlo confidence intervals.
//!
//! Each simulation perturbs the four impact components by uniform
//! multiplicative noise, once for the whole run and again independently per
//! industry, then evaluates the net impact formula. Percentiles over the
//! batch give the interval. Projection years re-run the batch on a baseline
//! inflated deterministically per year.
//!
//! Confidence by timeframe is a separate, fixed decay curve and does not
//! depend on the simulated spread.
//!
//! All randomness comes from the caller's [`Rng`]; seed it for reproducible
//! output.

use super::impact::{net_impact, ComponentSet, ImpactResult};
use super::stats::PercentileSummary;
use super::tables::{PerturbationWidths, AGGREGATE_INDUSTRY};
use crate::error::{ensure_finite, ImpactError, Result};
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_SIMULATIONS: usize = 1000;
const PROGRESS_EVERY: usize = 100;

/// One industry's outcome in a single simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndustryDraw {
    pub impact: f64,
    pub jobs_affected: i64,
}

/// One Monte Carlo draw. Discarded once the batch is summarized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub sim_id: usize,
    pub overall_impact: f64,
    pub by_industry: BTreeMap<String, IndustryDraw>,
    /// Run-level parameters before the per-industry redraw.
    pub parameters: ComponentSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceIntervals {
    pub overall: PercentileSummary,
    pub by_industry: BTreeMap<String, PercentileSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceReport {
    pub generated_at: DateTime<Utc>,
    pub base_date: String,
    pub simulations: usize,
    pub baseline: ConfidenceIntervals,
    pub projections: BTreeMap<i32, ConfidenceIntervals>,
    pub confidence_by_timeframe: BTreeMap<i32, f64>,
}

pub struct MonteCarloEngine<'a> {
    widths: &'a PerturbationWidths,
    simulations: usize,
}

impl<'a> MonteCarloEngine<'a> {
    pub fn new(widths: &'a PerturbationWidths, simulations: usize) -> Result<Self> {
        if simulations == 0 {
            return Err(ImpactError::InvalidConfig(
                "simulation count must be at least 1".to_string(),
            ));
        }
        Ok(Self { widths, simulations })
    }

    pub fn simulations(&self) -> usize {
        self.simulations
    }

    /// Draw the four components around `base`, each within its own band.
    fn perturb(&self, base: &ComponentSet, rng: &mut impl Rng) -> ComponentSet {
        ComponentSet {
            displacement: vary(rng, base.displacement, self.widths.displacement),
            creation: vary(rng, base.creation, self.widths.creation),
            market_maturity: vary(rng, base.market_maturity, self.widths.adoption).min(1.0),
            demand: vary(rng, base.demand, self.widths.demand),
        }
    }

    /// Multiplicative industry noise around 1.0. Not clamped; only the
    /// product with the run-level maturity is.
    fn industry_noise(&self, rng: &mut impl Rng) -> ComponentSet {
        ComponentSet {
            displacement: vary(rng, 1.0, self.widths.displacement),
            creation: vary(rng, 1.0, self.widths.creation),
            market_maturity: vary(rng, 1.0, self.widths.adoption),
            demand: vary(rng, 1.0, self.widths.demand),
        }
    }

    /// Every sampling interval around `base` must be finite.
    fn check_bounds(&self, base: &ComponentSet) -> Result<()> {
        for (field, value, width) in [
            ("displacement_effect", base.displacement, self.widths.displacement),
            ("creation_effect", base.creation, self.widths.creation),
            ("market_maturity", base.market_maturity, self.widths.adoption),
            ("demand_effect", base.demand, self.widths.demand),
        ] {
            ensure_finite(value * (1.0 - width), field, "perturbation bounds")?;
            ensure_finite(value * (1.0 + width), field, "perturbation bounds")?;
        }
        Ok(())
    }

    /// One draw over `employment` (industry → current level).
    ///
    /// Industry noise multiplies the run-level draw, so every industry sees
    /// both layers of perturbation. Errors when a sampling interval around
    /// `base` overflows.
    pub fn simulate_one(
        &self,
        base: &ComponentSet,
        employment: &BTreeMap<String, f64>,
        sim_id: usize,
        rng: &mut impl Rng,
    ) -> Result<SimulationRun> {
        self.check_bounds(base)?;
        let run = self.perturb(base, rng);

        let mut by_industry = BTreeMap::new();
        let mut total_employment = 0.0;
        let mut weighted_impact = 0.0;
        for (industry, &emp) in employment {
            let noise = self.industry_noise(rng);
            let impact = net_impact(
                run.displacement * noise.displacement,
                run.creation * noise.creation,
                (run.market_maturity * noise.market_maturity).min(1.0),
                run.demand * noise.demand,
            );
            by_industry.insert(
                industry.clone(),
                IndustryDraw {
                    impact,
                    jobs_affected: (emp * impact).round() as i64,
                },
            );
            if industry != AGGREGATE_INDUSTRY {
                total_employment += emp;
                weighted_impact += impact * emp;
            }
        }

        Ok(SimulationRun {
            sim_id,
            overall_impact: if total_employment > 0.0 {
                weighted_impact / total_employment
            } else {
                0.0
            },
            by_industry,
            parameters: run,
        })
    }

    /// Run the configured number of simulations and summarize them.
    pub fn batch(
        &self,
        base: &ComponentSet,
        employment: &BTreeMap<String, f64>,
        label: &str,
        rng: &mut impl Rng,
    ) -> Result<ConfidenceIntervals> {
        let mut overall = Vec::with_capacity(self.simulations);
        let mut per_industry: BTreeMap<String, Vec<f64>> = BTreeMap::new();

        for sim_id in 0..self.simulations {
            if sim_id % PROGRESS_EVERY == 0 {
                tracing::debug!(label, sim_id, total = self.simulations, "running simulation");
            }
            let run = self.simulate_one(base, employment, sim_id, rng)?;
            overall.push(ensure_finite(run.overall_impact, "overall_impact", label)?);
            for (industry, draw) in run.by_industry {
                per_industry
                    .entry(industry)
                    .or_insert_with(|| Vec::with_capacity(self.simulations))
                    .push(draw.impact);
            }
        }

        Ok(ConfidenceIntervals {
            overall: PercentileSummary::from_samples(&mut overall),
            by_industry: per_industry
                .into_iter()
                .map(|(industry, mut samples)| (industry, PercentileSummary::from_samples(&mut samples)))
                .collect(),
        })
    }

    /// Baseline plus `years` projection batches for an impact result.
    pub fn run(&self, impact: &ImpactResult, years: u32, rng: &mut impl Rng) -> Result<ConfidenceReport> {
        let base = impact.components.component_set();
        for (field, value) in [
            ("displacement_effect", base.displacement),
            ("creation_effect", base.creation),
            ("market_maturity", base.market_maturity),
            ("demand_effect", base.demand),
        ] {
            ensure_finite(value, field, "impact components")?;
        }
        let employment: BTreeMap<String, f64> = impact
            .by_industry
            .iter()
            .map(|(industry, data)| (industry.clone(), data.employment))
            .collect();
        let base_year = impact.base_year().unwrap_or_else(|| Utc::now().year());

        tracing::info!(simulations = self.simulations, "running baseline simulations");
        let baseline = self.batch(&base, &employment, "baseline", rng)?;

        let mut projections = BTreeMap::new();
        for year_idx in 1..=years {
            let year = base_year + year_idx as i32;
            tracing::info!(year, simulations = self.simulations, "running projection simulations");
            let inflated = inflate(&base, year_idx);
            projections.insert(year, self.batch(&inflated, &employment, &year.to_string(), rng)?);
        }

        let report = ConfidenceReport {
            generated_at: Utc::now(),
            base_date: impact.date.clone(),
            simulations: self.simulations,
            baseline,
            projections,
            confidence_by_timeframe: confidence_by_timeframe(base_year, years),
        };
        tracing::info!(
            p10 = report.baseline.overall.p10,
            p50 = report.baseline.overall.p50,
            p90 = report.baseline.overall.p90,
            "baseline confidence interval"
        );
        Ok(report)
    }
}

/// `Uniform(base·(1-width), base·(1+width))`; bounds are ordered so negative
/// bases work too.
fn vary(rng: &mut impl Rng, base: f64, width: f64) -> f64 {
    let a = base * (1.0 - width);
    let b = base * (1.0 + width);
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    rng.random_range(lo..=hi)
}

/// Deterministic drift of the baseline `year_idx` years ahead.
pub fn inflate(base: &ComponentSet, year_idx: u32) -> ComponentSet {
    let y = f64::from(year_idx);
    ComponentSet {
        displacement: base.displacement * (1.0 + 0.1 * y),
        creation: base.creation * (1.0 + 0.15 * y),
        market_maturity: (base.market_maturity + 0.1 * y).min(1.0),
        demand: base.demand * (1.0 + 0.1 * y),
    }
}

/// Decaying confidence for projection years `1..=years`, within `[0.3, 0.95]`.
pub fn confidence_by_timeframe(base_year: i32, years: u32) -> BTreeMap<i32, f64> {
    (1..=years)
        .map(|idx| {
            let i = f64::from(idx);
            let time_decay = (-0.15 * i).exp();
            let volatility = 1.0 - 0.05 * i * i / 25.0;
            let data_availability = 1.0 - 0.03 * i;
            let confidence = 0.85 * time_decay * volatility * data_availability;
            (base_year + idx as i32, confidence.clamp(0.3, 0.95))
        })
        .collect()
}
