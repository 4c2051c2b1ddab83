//! Turns a parsed design document into the in-memory agent model.

use super::Result;
use super::schema::{AttributeConfig, DesignConfig, ServiceConfig, ToolConfig, ToolsetConfig};
use crate::error::DesignError;
use crate::expr::{
    Attribute, MethodBinding, Primitive, ServerDataProjection, Service, Tool, Toolset, UserType,
};
use std::collections::HashMap;
use std::rc::Rc;

/// A resolved design: the agent's service and its toolsets.
#[derive(Debug, Clone)]
pub struct Design {
    pub service: Service,
    pub root: Option<String>,
    pub toolsets: Vec<Toolset>,
}

impl Design {
    pub fn toolset(&self, name: &str) -> Option<&Toolset> {
        self.toolsets.iter().find(|toolset| toolset.name == name)
    }
}

pub fn resolve_design(config: &DesignConfig) -> Result<Design> {
    let service = to_service(&config.service);
    let mut services: HashMap<&str, Service> = HashMap::new();
    services.insert(config.service.name.as_str(), service.clone());
    for declared in &config.services {
        services.insert(declared.name.as_str(), to_service(declared));
    }

    // Declare every user type first so bodies can refer to any of them,
    // including themselves.
    let mut types = HashMap::new();
    for (name, declared) in &config.types {
        let mut user_type = UserType::new(name.clone(), Attribute::empty());
        if let Some(owner) = &declared.service {
            let Some(service) = services.get(owner.as_str()) else {
                return Err(DesignError::UnknownService {
                    at: format!("types.{name}"),
                    name: owner.clone(),
                });
            };
            user_type = user_type.with_service(service.path_name.clone());
        }
        if let Some(location) = &declared.location {
            user_type = user_type.with_location(location.clone());
        }
        types.insert(name.clone(), Rc::new(user_type));
    }

    let resolver = Resolver { types: &types };
    for (name, declared) in &config.types {
        let attribute = resolver.attribute(&declared.ty, &format!("types.{name}"))?;
        if let Some(user_type) = types.get(name) {
            user_type.set_attribute(attribute);
        }
    }

    let toolsets = config
        .toolsets
        .iter()
        .map(|toolset| resolver.toolset(toolset, &services, &service))
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "resolved design for service {}: {} type(s), {} toolset(s)",
        service.name,
        types.len(),
        toolsets.len()
    );
    Ok(Design {
        service,
        root: config.root.clone(),
        toolsets,
    })
}

fn to_service(config: &ServiceConfig) -> Service {
    let service = Service::new(config.name.clone());
    match &config.path_name {
        Some(path_name) => service.with_path_name(path_name.clone()),
        None => service,
    }
}

struct Resolver<'a> {
    types: &'a HashMap<String, Rc<UserType>>,
}

impl Resolver<'_> {
    fn toolset(
        &self,
        config: &ToolsetConfig,
        services: &HashMap<&str, Service>,
        default_service: &Service,
    ) -> Result<Toolset> {
        let at = format!("toolsets.{}", config.name);
        let source_service = match &config.source_service {
            Some(name) => services
                .get(name.as_str())
                .cloned()
                .ok_or_else(|| DesignError::UnknownService {
                    at: at.clone(),
                    name: name.clone(),
                })?,
            None => default_service.clone(),
        };

        let mut toolset = Toolset::new(config.name.clone()).with_source_service(source_service);
        if let Some(specs_dir) = &config.specs_dir {
            toolset = toolset.with_specs_dir(specs_dir.clone());
        }
        if let Some(specs_package) = &config.specs_package {
            toolset = toolset.with_specs_package(specs_package.clone());
        }
        for tool in &config.tools {
            let tool = self.tool(&config.name, tool, &format!("{at}.tools.{}", tool.name))?;
            toolset = toolset.with_tool(tool);
        }
        Ok(toolset)
    }

    fn tool(&self, toolset: &str, config: &ToolConfig, at: &str) -> Result<Tool> {
        let mut tool = Tool::new(
            toolset,
            config.name.clone(),
            self.optional(config.args.as_ref(), &format!("{at}.args"))?,
            self.optional(config.result.as_ref(), &format!("{at}.return"))?,
        );
        if let Some(method) = &config.method {
            let mut binding = MethodBinding::new(
                method.name.clone(),
                self.optional(method.payload.as_ref(), &format!("{at}.method.payload"))?,
                self.optional(method.result.as_ref(), &format!("{at}.method.result"))?,
            );
            binding.payload_type_ref = method.payload_ref.clone();
            binding.result_type_ref = method.result_ref.clone();
            tool = tool.bound_to(binding);
        }
        for projection in &config.server_data {
            let mut resolved = ServerDataProjection::new(projection.kind.clone(), projection.field.clone());
            if let Some(schema) = &projection.schema {
                let at = format!("{at}.server_data.{}", projection.kind);
                resolved = resolved.with_schema(self.attribute(schema, &at)?);
            }
            tool = tool.with_server_data(resolved);
        }
        Ok(tool)
    }

    fn optional(&self, config: Option<&AttributeConfig>, at: &str) -> Result<Attribute> {
        match config {
            Some(config) => self.attribute(config, at),
            None => Ok(Attribute::empty()),
        }
    }

    fn attribute(&self, config: &AttributeConfig, at: &str) -> Result<Attribute> {
        match config {
            AttributeConfig::Named(name) => {
                if let Ok(primitive) = name.parse::<Primitive>() {
                    return Ok(Attribute::primitive(primitive));
                }
                self.types
                    .get(name)
                    .map(|user_type| Attribute::user(Rc::clone(user_type)))
                    .ok_or_else(|| DesignError::UnknownType {
                        at: at.to_string(),
                        name: name.clone(),
                    })
            }
            AttributeConfig::Object { object } => {
                let fields = object
                    .fields
                    .iter()
                    .map(|(name, field)| -> Result<(String, Attribute)> {
                        Ok((name.clone(), self.attribute(field, &format!("{at}.{name}"))?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                if let Some(missing) = object
                    .required
                    .iter()
                    .find(|name| !object.fields.contains_key(name.as_str()))
                {
                    return Err(DesignError::UnknownRequiredField {
                        at: at.to_string(),
                        field: missing.clone(),
                    });
                }
                Ok(Attribute::object(fields).with_required(object.required.iter().cloned()))
            }
            AttributeConfig::Array { array } => {
                Ok(Attribute::array(self.attribute(array, &format!("{at}[]"))?))
            }
            AttributeConfig::Map { map } => Ok(Attribute::map(
                self.attribute(&map.key, &format!("{at}[key]"))?,
                self.attribute(&map.value, &format!("{at}[value]"))?,
            )),
            AttributeConfig::Union { union } => {
                let members = union
                    .iter()
                    .map(|(name, member)| -> Result<(String, Attribute)> {
                        Ok((name.clone(), self.attribute(member, &format!("{at}<{name}>"))?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Attribute::union(members))
            }
            AttributeConfig::WithDefault { ty, default } => {
                let attribute = self.attribute(ty, at)?;
                Ok(match default {
                    Some(value) => attribute.with_default(value.clone()),
                    None => attribute,
                })
            }
        }
    }
}
