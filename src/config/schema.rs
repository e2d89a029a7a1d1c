use crate::economic::tables::{IndustryParams, Scenario};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level `config.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub impact: ImpactConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// `[industry_params.<name>]` rows merged over the built-in table.
    #[serde(default)]
    pub industry_params: BTreeMap<String, IndustryParams>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Monte Carlo draws per batch
    pub runs: usize,
    /// Fixed seed; unset means an OS-seeded generator
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            runs: 1000,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub years: u32,
    pub scenarios: Vec<Scenario>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            years: 5,
            scenarios: Scenario::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    /// Year AI adoption is counted from.
    pub base_year: i32,
    /// Calendar year for market maturity; defaults to the current year.
    pub reference_year: Option<i32>,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            base_year: 2020,
            reference_year: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report directory; `~` and `$VARS` are expanded.
    pub dir: String,
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "./data/processed".to_string(),
            pretty: true,
        }
    }
}
