use super::Attribute;
use crate::naming::{goify, package_alias};

/// A service whose generated package holds method payload and result types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    /// Directory name of the generated package under the generated root.
    pub path_name: String,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let path_name = name.to_lowercase().replace(['-', ' ', '.'], "_");
        Self { name, path_name }
    }

    pub fn with_path_name(mut self, path_name: impl Into<String>) -> Self {
        self.path_name = path_name.into();
        self
    }

    /// Import path of the service package under `root`.
    pub fn import_path(&self, root: &str) -> String {
        join_import_path(root, &self.path_name)
    }

    /// Package qualifier used for service-side types.
    pub fn package_alias(&self) -> String {
        package_alias(&self.path_name)
    }
}

pub(crate) fn join_import_path(root: &str, segment: &str) -> String {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        segment.to_string()
    } else {
        format!("{root}/{segment}")
    }
}

/// Binding of a tool to an existing service method.
#[derive(Debug, Clone, Default)]
pub struct MethodBinding {
    pub name: String,
    pub payload: Attribute,
    pub result: Attribute,
    /// Pre-resolved service-side payload reference, e.g. `*bravo.LookupPayload`.
    pub payload_type_ref: Option<String>,
    /// Pre-resolved service-side result reference.
    pub result_type_ref: Option<String>,
}

impl MethodBinding {
    pub fn new(name: impl Into<String>, payload: Attribute, result: Attribute) -> Self {
        Self {
            name: name.into(),
            payload,
            result,
            payload_type_ref: None,
            result_type_ref: None,
        }
    }

    pub fn with_type_refs(
        mut self,
        payload_type_ref: impl Into<String>,
        result_type_ref: impl Into<String>,
    ) -> Self {
        self.payload_type_ref = Some(payload_type_ref.into());
        self.result_type_ref = Some(result_type_ref.into());
        self
    }
}

/// A method result field carried out-of-band to the host.
#[derive(Debug, Clone)]
pub struct ServerDataProjection {
    pub kind: String,
    pub method_result_field: String,
    /// Declared server-data shape; defaults to the bound field's shape.
    pub schema: Option<Attribute>,
}

impl ServerDataProjection {
    pub fn new(kind: impl Into<String>, method_result_field: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            method_result_field: method_result_field.into(),
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: Attribute) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn go_kind(&self) -> String {
        goify(&self.kind, true)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tool {
    pub name: String,
    pub qualified_name: String,
    pub args: Attribute,
    pub result: Attribute,
    /// Set for method-backed tools.
    pub method: Option<MethodBinding>,
    pub server_data: Vec<ServerDataProjection>,
}

impl Tool {
    pub fn new(toolset: &str, name: impl Into<String>, args: Attribute, result: Attribute) -> Self {
        let name = name.into();
        Self {
            qualified_name: format!("{toolset}.{name}"),
            name,
            args,
            result,
            method: None,
            server_data: Vec::new(),
        }
    }

    pub fn bound_to(mut self, method: MethodBinding) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_server_data(mut self, projection: ServerDataProjection) -> Self {
        self.server_data.push(projection);
        self
    }

    pub fn is_method_backed(&self) -> bool {
        self.method.is_some()
    }

    pub fn go_name(&self) -> String {
        goify(&self.name, true)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Toolset {
    pub name: String,
    pub specs_dir: Option<String>,
    pub specs_package: String,
    /// Service whose package holds the bound methods.
    pub source_service: Option<Service>,
    pub tools: Vec<Tool>,
}

impl Toolset {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let specs_package = package_alias(name.rsplit('.').next().unwrap_or(&name));
        Self {
            name,
            specs_dir: None,
            specs_package,
            source_service: None,
            tools: Vec::new(),
        }
    }

    pub fn with_specs_dir(mut self, specs_dir: impl Into<String>) -> Self {
        self.specs_dir = Some(specs_dir.into());
        self
    }

    pub fn with_specs_package(mut self, specs_package: impl Into<String>) -> Self {
        self.specs_package = specs_package.into();
        self
    }

    pub fn with_source_service(mut self, service: Service) -> Self {
        self.source_service = Some(service);
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }
}
