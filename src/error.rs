//! Error types shared by the index components.

use thiserror::Error;

/// Hard failures of the core. Per-record malformation is never reported
/// here; it is skipped and counted by the component that saw it.
#[derive(Debug, Error)]
pub enum ImpactError {
    #[error("input is not a record collection: {0}")]
    NotACollection(String),

    #[error("non-finite value for {field} in {context}")]
    NonFinite { field: &'static str, context: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ImpactError>;

/// Reject NaN and infinities before they reach a weighted sum.
pub(crate) fn ensure_finite(value: f64, field: &'static str, context: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ImpactError::NonFinite {
            field,
            context: context.to_string(),
        })
    }
}
