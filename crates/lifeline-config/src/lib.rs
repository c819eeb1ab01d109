//! # Lifeline Config
//!
//! Runtime configuration for the lifeline binary: a TOML schema with
//! defaults, a loader with `${VAR}` substitution, and a validator.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationReport, ValidationWarning};
