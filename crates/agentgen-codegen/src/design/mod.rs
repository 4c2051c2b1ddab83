//! YAML design documents: a standalone stand-in for the DSL evaluator.

pub mod parser;
pub mod resolve;
pub mod schema;
pub mod validator;

pub use parser::{parse_yaml_file, parse_yaml_str};
pub use resolve::{Design, resolve_design};
pub use schema::*;
pub use validator::validate_design;

use crate::error::DesignError;
use std::path::Path;

pub type Result<T> = std::result::Result<T, DesignError>;

/// Parses, validates and resolves the design document at `path`.
pub fn load_design<P: AsRef<Path>>(path: P) -> Result<Design> {
    let config = parse_yaml_file(path)?;
    validate_design(&config)?;
    resolve_design(&config)
}
