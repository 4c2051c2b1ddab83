//! Attribute transform engine interface.
//!
//! An engine turns a source/target attribute pair into conversion statements
//! plus the helper functions those statements call. The planner owns
//! compatibility checks, helper deduplication and import collection; the
//! engine only writes code.

mod go;

pub use go::GoTransformer;
pub(crate) use go::indent;

use crate::expr::Attribute;
use crate::naming::NamingContext;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("cannot convert {source_kind} at {path} into {target_kind}")]
    Mismatch {
        path: String,
        source_kind: String,
        target_kind: String,
    },

    #[error("unsupported conversion at {path}: {reason}")]
    Unsupported { path: String, reason: String },
}

/// One conversion request.
pub struct TransformRequest<'a> {
    pub source: &'a Attribute,
    pub target: &'a Attribute,
    pub source_var: &'a str,
    pub target_var: &'a str,
    pub source_ctx: NamingContext<'a>,
    pub target_ctx: NamingContext<'a>,
    /// Prepended to generated helper names.
    pub prefix: &'a str,
    /// Object user types are built and passed through pointers.
    pub by_ref: bool,
}

/// A generated top-level helper, unique by name and signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TransformHelper {
    pub name: String,
    pub param_type_ref: String,
    pub result_type_ref: String,
    pub body: String,
}

impl TransformHelper {
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.name, &self.param_type_ref, &self.result_type_ref)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    /// Statements that declare and populate the target variable.
    pub body: String,
    pub helpers: Vec<TransformHelper>,
}

pub trait TransformEngine {
    fn transform(&self, request: &TransformRequest<'_>) -> Result<TransformOutput, TransformError>;
}
