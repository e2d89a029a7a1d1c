//! AI Labor Market Impact Index.
//!
//! The library holds the whole model and never touches the filesystem
//! outside [`config`]; the `ailmi` binary reads inputs and writes reports.

pub mod config;
pub mod economic;
pub mod error;

pub use config::Config;
pub use error::{ImpactError, Result};
