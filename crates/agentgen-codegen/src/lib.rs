//! # agentgen-codegen
//!
//! Plans the `transforms.go` file of an agent toolset: typed conversions
//! between the tool-facing specs types and the payloads and results of the
//! service methods the tools are bound to.

pub mod compat;
pub mod design;
pub mod error;
pub mod expr;
mod helpers;
pub mod imports;
pub mod naming;
pub mod planner;
pub mod render;
mod server_data;
pub mod specs;
pub mod transform;

pub use compat::{CompatibilityError, check_compatible};
pub use design::{Design, load_design};
pub use error::{CodegenError, DesignError, Result};
pub use expr::{Attribute, MethodBinding, ServerDataProjection, Service, Tool, Toolset};
pub use helpers::HelperSet;
pub use planner::{
    TRANSFORMS_FILE, TransformFunction, TransformPlan, TransformPlanner, plan_toolset_transforms,
};
pub use render::{RenderError, render_transforms};
pub use server_data::needs_nil_guard;
pub use transform::{GoTransformer, TransformEngine, TransformError};
