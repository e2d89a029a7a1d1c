//! TOML configuration.
//!
//! Resolved from `--config <path>` or `<config_dir>/ailmi/config.toml`.
//! A missing default file means built-in defaults.

pub mod schema;

pub use schema::{Config, ImpactConfig, OutputConfig, ProjectionConfig, SimulationConfig};

use crate::economic::tables::Tables;
use crate::error::ImpactError;
use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

impl Config {
    /// `<config_dir>/ailmi/config.toml`, when a home directory exists.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ailmi").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load `explicit` (which must exist) or the default location.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => {
                let path = expand_path(&path.to_string_lossy());
                Self::load(&path)?
            }
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load(&path)?,
                None => {
                    tracing::debug!("no config file, using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("invalid config at {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> std::result::Result<(), ImpactError> {
        if self.simulation.runs == 0 {
            return Err(ImpactError::InvalidConfig("simulation.runs must be at least 1".into()));
        }
        if self.projection.years == 0 {
            return Err(ImpactError::InvalidConfig("projection.years must be at least 1".into()));
        }
        if self.projection.scenarios.is_empty() {
            return Err(ImpactError::InvalidConfig("projection.scenarios must not be empty".into()));
        }
        for (industry, p) in &self.industry_params {
            if !(p.adoption_ceiling > 0.0 && p.adoption_speed > 0.0) {
                return Err(ImpactError::InvalidConfig(format!(
                    "industry_params.{industry}: adoption_ceiling and adoption_speed must be positive"
                )));
            }
        }
        Ok(())
    }

    /// Built-in tables with this config's overrides applied.
    pub fn tables(&self) -> Tables {
        let mut tables = Tables::default();
        tables.industries = tables.industries.with_param_overrides(&self.industry_params);
        tables.calculation.adoption_base_year = self.impact.base_year;
        tables
    }

    pub fn reference_year(&self) -> i32 {
        self.impact.reference_year.unwrap_or_else(|| Utc::now().year())
    }

    pub fn output_dir(&self) -> PathBuf {
        expand_path(&self.output.dir)
    }
}

/// Expand `~` and environment variables; unknown variables are left as-is.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economic::tables::Scenario;
    use std::io::Write;

    #[test]
    fn empty_config_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.simulation.runs, 1000);
        assert_eq!(config.projection.years, 5);
        assert_eq!(config.projection.scenarios, Scenario::ALL.to_vec());
        assert_eq!(config.impact.base_year, 2020);
        assert!(config.output.pretty);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = Config::from_toml_str(
            r#"
[simulation]
seed = 42

[projection]
scenarios = ["moderate"]

[industry_params.Information]
weight = 3.0
adoption_ceiling = 0.9
adoption_speed = 2.0
displacement_factor = 0.5
"#,
        )
        .unwrap();
        assert_eq!(config.simulation.runs, 1000);
        assert_eq!(config.simulation.seed, Some(42));
        assert_eq!(config.projection.scenarios, vec![Scenario::Moderate]);
        assert_eq!(config.projection.years, 5);

        let tables = config.tables();
        assert_eq!(tables.industries.params_for("Information").weight, 3.0);
        assert_eq!(tables.industries.params_for("Manufacturing").weight, 1.0);
    }

    #[test]
    fn unknown_scenario_is_rejected() {
        assert!(Config::from_toml_str("[projection]\nscenarios = [\"wild\"]").is_err());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = Config::default();
        config.simulation.runs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.projection.scenarios.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn base_year_flows_into_tables() {
        let config = Config::from_toml_str("[impact]\nbase_year = 2022\nreference_year = 2026").unwrap();
        assert_eq!(config.tables().calculation.adoption_base_year, 2022);
        assert_eq!(config.reference_year(), 2026);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[simulation]\nruns = 250\n[output]\ndir = \"/tmp/ailmi\"").unwrap();

        let config = Config::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.simulation.runs, 250);
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/ailmi"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_or_default(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn tilde_is_expanded() {
        let expanded = expand_path("~/reports");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert_eq!(expand_path("/abs/path"), PathBuf::from("/abs/path"));
    }
}
