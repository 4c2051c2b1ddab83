//! Fatal generator errors.
//!
//! Everything here indicates an inconsistent design or a bug in the
//! generator. Conversions that merely cannot be synthesized are skipped by
//! the planner and never surface as errors.

use crate::compat::CompatibilityError;
use crate::transform::TransformError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("toolset {toolset}: method-backed tool {tool} has no pre-resolved {datum}")]
    MissingMethodTypeRef {
        toolset: String,
        tool: String,
        datum: &'static str,
    },

    #[error(
        "toolset {toolset}: server data {kind} of tool {tool} names method result field {field:?}, which is absent or empty"
    )]
    ServerDataFieldMissing {
        toolset: String,
        tool: String,
        kind: String,
        field: String,
    },

    #[error(
        "toolset {toolset}: server data {kind} of tool {tool} has no local type {type_name} in the tool specs"
    )]
    ServerDataTypeMissing {
        toolset: String,
        tool: String,
        kind: String,
        type_name: String,
    },

    #[error("toolset {toolset}: server data {kind} of tool {tool} is incompatible: {source}")]
    ServerDataIncompatible {
        toolset: String,
        tool: String,
        kind: String,
        #[source]
        source: CompatibilityError,
    },

    #[error("toolset {toolset}: transform {function} of tool {tool} failed: {source}")]
    Transform {
        toolset: String,
        tool: String,
        function: String,
        #[source]
        source: TransformError,
    },

    #[error(
        "toolset {toolset}: transform {function} of tool {tool} produced an empty body ({helpers} helper(s))"
    )]
    EmptyTransformBody {
        toolset: String,
        tool: String,
        function: String,
        helpers: usize,
    },

    #[error("helper {name} is generated both as {existing} and as {requested}")]
    HelperNameConflict {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("import alias {alias:?} requested for {path} is already bound to {existing}")]
    ImportAliasCollision {
        alias: String,
        existing: String,
        path: String,
    },
}

pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors raised while loading a design document.
#[derive(Error, Debug)]
pub enum DesignError {
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{at}: unknown type {name:?}")]
    UnknownType { at: String, name: String },

    #[error("{at}: unknown service {name:?}")]
    UnknownService { at: String, name: String },

    #[error("{at}: required field {field:?} is not declared")]
    UnknownRequiredField { at: String, field: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
