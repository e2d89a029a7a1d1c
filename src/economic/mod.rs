//! Labor market impact model.
//!
//! This module turns occupation-level AI exposure estimates into an
//! industry-level employment impact index, projects it forward under
//! adoption scenarios, and attaches Monte Carlo confidence bands.
//!
//! ## Overview
//!
//! Data flows one way through the components:
//! - **SOC normalization** ([`soc`]): raw occupation codes in any of the
//!   common spellings become canonical `NN-NNNN` codes
//! - **Extraction** ([`extractor`]): heterogeneous occupation records become
//!   one [`OccupationImpact`] per SOC code, inferring codes from titles
//!   ([`classifier`]) when needed
//! - **Aggregation** ([`aggregator`]): employment-weighted rates per industry
//! - **Validation** ([`validator`]): advisory quality scoring of the rates
//! - **Impact** ([`impact`]): displacement, creation, demand and market
//!   maturity combined into a net employment change
//! - **Projection** ([`projection`]): S-curve adoption per scenario
//! - **Confidence** ([`monte_carlo`]): percentile bands from repeated draws
//!
//! Every fixed constant lives in [`tables`] and is injected by reference.
//!
//! ## Example
//!
//! ```rust
//! use ailmi::economic::{ImpactCalculator, ImpactInputs, IndustryEmployment, Tables};
//! use std::collections::BTreeMap;
//!
//! let tables = Tables::default();
//! let mut employment = BTreeMap::new();
//! employment.insert("Information".to_string(), IndustryEmployment::new(3_000_000.0));
//! employment.insert("Total Nonfarm".to_string(), IndustryEmployment::new(3_000_000.0));
//!
//! let result = ImpactCalculator::new(&tables)
//!     .calculate_net_impact(&ImpactInputs::new(2025, 6, employment))?;
//! assert_eq!(result.by_industry.len(), 2);
//! assert_eq!(result.total_employment, 3_000_000.0);
//! # Ok::<(), ailmi::error::ImpactError>(())
//! ```
//!
//! ## Configuration
//!
//! Table overrides come from `config.toml`:
//!
//! ```toml
//! [industry_params.Information]
//! weight = 2.0
//! adoption_ceiling = 0.95
//! adoption_speed = 1.5
//! displacement_factor = 0.6
//! ```

pub mod aggregator;
pub mod classifier;
pub mod extractor;
pub mod impact;
pub mod monte_carlo;
pub mod projection;
pub mod resolve;
pub mod soc;
pub mod stats;
pub mod status;
pub mod tables;
pub mod validator;

// Re-exports for convenient access
pub use aggregator::{
    EmploymentEntry, EmploymentMatrix, IndustryAggregator, IndustryRate, MappingResults,
};
pub use classifier::{TitleClassifier, TitleMatch};
pub use extractor::{OccupationExtractor, OccupationImpact, OccupationImpactReport};
pub use impact::{
    ComponentSet, ImpactCalculator, ImpactInputs, ImpactResult, IndustryEmployment, NewsArticle,
};
pub use monte_carlo::{ConfidenceReport, MonteCarloEngine};
pub use projection::{ProjectionEngine, ProjectionReport, SCurve};
pub use soc::{SocCode, SocCodeMapper};
pub use status::QualityBand;
pub use tables::{IndustryParams, Scenario, Tables, AGGREGATE_INDUSTRY};
pub use validator::{BaselineRate, MappingValidator, ValidationReport};
