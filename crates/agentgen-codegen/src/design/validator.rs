use super::Result;
use super::schema::{DesignConfig, ToolsetConfig};
use crate::error::DesignError;
use std::collections::HashSet;

pub fn validate_design(config: &DesignConfig) -> Result<()> {
    if config.service.name.is_empty() {
        return Err(DesignError::MissingField("service.name".to_string()));
    }

    let mut services = HashSet::from([config.service.name.as_str()]);
    for service in &config.services {
        if service.name.is_empty() {
            return Err(DesignError::MissingField("services[].name".to_string()));
        }
        if !services.insert(service.name.as_str()) {
            return Err(DesignError::Validation(format!(
                "service {} is declared twice",
                service.name
            )));
        }
    }

    let mut toolsets = HashSet::new();
    for toolset in &config.toolsets {
        if toolset.name.is_empty() {
            return Err(DesignError::MissingField("toolsets[].name".to_string()));
        }
        if !toolsets.insert(toolset.name.as_str()) {
            return Err(DesignError::Validation(format!(
                "toolset {} is declared twice",
                toolset.name
            )));
        }
        validate_toolset(toolset)?;
    }
    Ok(())
}

fn validate_toolset(toolset: &ToolsetConfig) -> Result<()> {
    let mut tools = HashSet::new();
    for tool in &toolset.tools {
        if tool.name.is_empty() {
            return Err(DesignError::MissingField(format!(
                "toolsets.{}.tools[].name",
                toolset.name
            )));
        }
        if !tools.insert(tool.name.as_str()) {
            return Err(DesignError::Validation(format!(
                "tool {}.{} is declared twice",
                toolset.name, tool.name
            )));
        }
        for projection in &tool.server_data {
            if projection.kind.is_empty() || projection.field.is_empty() {
                return Err(DesignError::MissingField(format!(
                    "toolsets.{}.tools.{}.server_data[] needs both kind and field",
                    toolset.name, tool.name
                )));
            }
        }
    }
    Ok(())
}
