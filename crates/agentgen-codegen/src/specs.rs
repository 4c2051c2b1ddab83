//! Locally named tool types as they appear in a toolset's specs package.

use crate::expr::{Attribute, ServerDataProjection, Tool, Toolset, UserType};
use indexmap::IndexMap;
use std::rc::Rc;

pub fn payload_type_name(tool: &Tool) -> String {
    format!("{}Payload", tool.go_name())
}

pub fn result_type_name(tool: &Tool) -> String {
    format!("{}Result", tool.go_name())
}

pub fn server_data_type_name(tool: &Tool, projection: &ServerDataProjection) -> String {
    format!("{}{}ServerData", tool.go_name(), projection.go_kind())
}

/// Maps expected type names (`<GoName>Payload`, `<GoName>Result`,
/// `<GoName><Kind>ServerData`) to the public attribute declared for them.
///
/// [`ToolSpecsIndex::for_toolset`] falls back to the bound method-result
/// field when a projection has no schema, so an index it builds always
/// covers every projection whose field exists.
#[derive(Debug, Default)]
pub struct ToolSpecsIndex {
    types: IndexMap<String, Attribute>,
}

impl ToolSpecsIndex {
    pub fn for_toolset(toolset: &Toolset) -> Self {
        let mut index = Self::default();
        for tool in &toolset.tools {
            index.insert(payload_type_name(tool), &tool.args);
            index.insert(result_type_name(tool), &tool.result);
            for projection in &tool.server_data {
                let shape = projection.schema.clone().or_else(|| {
                    tool.method
                        .as_ref()
                        .and_then(|method| method.result.field(&projection.method_result_field))
                });
                if let Some(shape) = shape {
                    index.insert(server_data_type_name(tool, projection), &shape);
                }
            }
        }
        index
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.types.get(name)
    }

    /// Drops `name`, keeping the order of the remaining types.
    pub fn remove(&mut self, name: &str) -> Option<Attribute> {
        self.types.shift_remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // Primitives and types pinned elsewhere by type-location metadata are
    // used as is; everything else is wrapped in a local user type.
    fn insert(&mut self, name: String, attribute: &Attribute) {
        if attribute.is_empty() {
            return;
        }
        let local = if attribute.is_primitive() || attribute.type_location().is_some() {
            attribute.clone()
        } else {
            Attribute::user(Rc::new(UserType::new(name.clone(), attribute.clone())))
        };
        self.types.insert(name, local);
    }
}
