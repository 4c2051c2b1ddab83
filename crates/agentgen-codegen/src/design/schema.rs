use crate::expr::TypeLocation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignConfig {
    /// The service the agents are declared in.
    pub service: ServiceConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
    #[serde(default)]
    pub types: IndexMap<String, TypeConfig>,
    #[serde(default)]
    pub toolsets: Vec<ToolsetConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<TypeLocation>,
    #[serde(rename = "type")]
    pub ty: AttributeConfig,
}

/// Attribute expression. Variants are tried in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeConfig {
    /// A primitive or declared type name.
    Named(String),
    Object {
        object: ObjectConfig,
    },
    Array {
        array: Box<AttributeConfig>,
    },
    Map {
        map: MapConfig,
    },
    Union {
        union: IndexMap<String, AttributeConfig>,
    },
    WithDefault {
        #[serde(rename = "type")]
        ty: Box<AttributeConfig>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<serde_json::Value>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectConfig {
    #[serde(default)]
    pub fields: IndexMap<String, AttributeConfig>,
    #[serde(default)]
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub key: Box<AttributeConfig>,
    pub value: Box<AttributeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsetConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specs_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specs_package: Option<String>,
    /// Defaults to the design's own service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_service: Option<String>,
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<AttributeConfig>,
    #[serde(rename = "return", default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AttributeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<MethodConfig>,
    #[serde(default)]
    pub server_data: Vec<ServerDataConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<AttributeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AttributeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerDataConfig {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<AttributeConfig>,
}
