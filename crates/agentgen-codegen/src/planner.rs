//! Plans the `transforms.go` file of a toolset: typed conversions between
//! tool-facing types and the payloads/results of the service methods the
//! tools are bound to.
//!
//! Payload and result conversions are optional: when the two shapes differ
//! the runtime dispatches through JSON instead, so they are skipped. Server
//! data has no such fallback and every inconsistency is an error.

use crate::compat::check_compatible;
use crate::error::{CodegenError, Result};
use crate::expr::{Attribute, MethodBinding, ServerDataProjection, Tool, Toolset};
use crate::helpers::HelperSet;
use crate::imports::{ImportSpec, PendingImports, assemble_imports, collect_imports};
use crate::naming::{GoNameScope, NameScope, NamingContext};
use crate::server_data::needs_nil_guard;
use crate::specs::{ToolSpecsIndex, payload_type_name, result_type_name, server_data_type_name};
use crate::transform::{GoTransformer, TransformEngine, TransformOutput, TransformRequest};
use serde::Serialize;

pub const TRANSFORMS_FILE: &str = "transforms.go";

const SOURCE_VAR: &str = "v";
const TARGET_VAR: &str = "res";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformFunction {
    pub name: String,
    pub param_type_ref: String,
    pub result_type_ref: String,
    pub body: String,
    pub nil_input_returns_nil: bool,
}

/// In-memory description of one generated `transforms.go`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformPlan {
    pub path: String,
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub functions: Vec<TransformFunction>,
    pub helpers: Vec<crate::transform::TransformHelper>,
}

/// Plans `toolset` with the Go engine and name scope. Returns `Ok(None)` when
/// there is nothing to generate.
pub fn plan_toolset_transforms(root: &str, toolset: &Toolset) -> Result<Option<TransformPlan>> {
    TransformPlanner::<GoTransformer, GoNameScope>::default().plan(root, toolset)
}

pub struct TransformPlanner<E = GoTransformer, S = GoNameScope> {
    engine: E,
    scope: S,
}

impl Default for TransformPlanner {
    fn default() -> Self {
        Self {
            engine: GoTransformer,
            scope: GoNameScope,
        }
    }
}

/// State for one file; nothing outlives a single `plan` call.
struct FileState<'a> {
    root: &'a str,
    toolset: &'a Toolset,
    service_alias: String,
    index: ToolSpecsIndex,
    functions: Vec<TransformFunction>,
    helpers: HelperSet,
    imports: PendingImports,
}

impl FileState<'_> {
    fn import_from(&mut self, attributes: [&Attribute; 2]) {
        for attribute in attributes {
            self.imports.extend(collect_imports(attribute, self.root));
        }
    }
}

impl<E: TransformEngine, S: NameScope> TransformPlanner<E, S> {
    pub fn new(engine: E, scope: S) -> Self {
        Self { engine, scope }
    }

    /// Plans `toolset` against the specs types derived from its own tools.
    pub fn plan(&self, root: &str, toolset: &Toolset) -> Result<Option<TransformPlan>> {
        self.plan_with_index(root, toolset, ToolSpecsIndex::for_toolset(toolset))
    }

    /// Plans `toolset` against a specs index produced elsewhere. A projection
    /// whose local type the index lacks is fatal.
    pub fn plan_with_index(
        &self,
        root: &str,
        toolset: &Toolset,
        index: ToolSpecsIndex,
    ) -> Result<Option<TransformPlan>> {
        let Some(specs_dir) = toolset.specs_dir.as_deref().filter(|dir| !dir.is_empty()) else {
            log::debug!("toolset {}: no specs directory, no transforms", toolset.name);
            return Ok(None);
        };
        let Some(service) = &toolset.source_service else {
            log::debug!("toolset {}: no source service, no transforms", toolset.name);
            return Ok(None);
        };
        if toolset.tools.is_empty() {
            log::debug!("toolset {}: no tools, no transforms", toolset.name);
            return Ok(None);
        }

        let mut file = FileState {
            root,
            toolset,
            service_alias: service.package_alias(),
            index,
            functions: Vec::new(),
            helpers: HelperSet::new(),
            imports: PendingImports::new(),
        };

        for tool in &toolset.tools {
            let Some(method) = &tool.method else {
                log::debug!("tool {}: not method-backed", tool.qualified_name);
                continue;
            };
            self.plan_tool(&mut file, tool, method)?;
        }

        if file.functions.is_empty() {
            log::debug!("toolset {}: no transforms to generate", toolset.name);
            return Ok(None);
        }

        let imports = assemble_imports(
            ImportSpec::named(service.import_path(root), file.service_alias.clone()),
            &file.imports,
        )?;
        log::debug!(
            "toolset {}: {} transform(s), {} helper(s)",
            toolset.name,
            file.functions.len(),
            file.helpers.len()
        );

        Ok(Some(TransformPlan {
            path: format!("{}/{TRANSFORMS_FILE}", specs_dir.trim_end_matches('/')),
            package: toolset.specs_package.clone(),
            imports,
            functions: file.functions,
            helpers: file.helpers.into_vec(),
        }))
    }

    fn plan_tool(&self, file: &mut FileState<'_>, tool: &Tool, method: &MethodBinding) -> Result<()> {
        let payload_ref = self.required_ref(file, tool, &method.payload_type_ref, "method payload type reference")?;
        let result_ref = self.required_ref(file, tool, &method.result_type_ref, "method result type reference")?;
        let go_name = tool.go_name();

        if !tool.args.is_empty() && !method.payload.is_empty() {
            if let Some(local) = file.index.get(&payload_type_name(tool)).cloned() {
                let name = format!("Init{go_name}MethodPayload");
                let alias = file.service_alias.clone();
                let output = self.optional_transform(
                    file,
                    tool,
                    &name,
                    (&local, &format!("{} payload", tool.qualified_name), ""),
                    (&method.payload, &format!("{} payload", method.name), &alias),
                )?;
                if let Some(output) = output {
                    file.functions.push(TransformFunction {
                        name,
                        param_type_ref: self.scope.full_type_ref(&local, ""),
                        result_type_ref: payload_ref,
                        body: output.body,
                        nil_input_returns_nil: false,
                    });
                    file.helpers.extend(output.helpers)?;
                    file.import_from([&local, &method.payload]);
                }
            }
        }

        if !tool.result.is_empty() && !method.result.is_empty() {
            if let Some(local) = file.index.get(&result_type_name(tool)).cloned() {
                let name = format!("Init{go_name}ToolResult");
                let alias = file.service_alias.clone();
                let output = self.optional_transform(
                    file,
                    tool,
                    &name,
                    (&method.result, &format!("{} result", method.name), &alias),
                    (&local, &format!("{} result", tool.qualified_name), ""),
                )?;
                if let Some(output) = output {
                    file.functions.push(TransformFunction {
                        name,
                        param_type_ref: result_ref,
                        result_type_ref: self.scope.full_type_ref(&local, ""),
                        body: output.body,
                        nil_input_returns_nil: false,
                    });
                    file.helpers.extend(output.helpers)?;
                    file.import_from([&method.result, &local]);
                }
            }
        }

        for projection in &tool.server_data {
            self.plan_server_data(file, tool, method, projection)?;
        }
        Ok(())
    }

    fn required_ref(
        &self,
        file: &FileState<'_>,
        tool: &Tool,
        type_ref: &Option<String>,
        datum: &'static str,
    ) -> Result<String> {
        match type_ref.as_deref() {
            Some(type_ref) if !type_ref.is_empty() => Ok(type_ref.to_string()),
            _ => Err(CodegenError::MissingMethodTypeRef {
                toolset: file.toolset.name.clone(),
                tool: tool.qualified_name.clone(),
                datum,
            }),
        }
    }

    /// Payload/result conversion: incompatible shapes, engine failures and
    /// empty bodies skip the function.
    fn optional_transform(
        &self,
        file: &FileState<'_>,
        tool: &Tool,
        function: &str,
        (source, source_label, source_pkg): (&Attribute, &str, &str),
        (target, target_label, target_pkg): (&Attribute, &str, &str),
    ) -> Result<Option<TransformOutput>> {
        if let Err(err) = check_compatible(source, target, source_label, target_label) {
            log::debug!("tool {}: skipping {function}: {err}", tool.qualified_name);
            return Ok(None);
        }
        let request = TransformRequest {
            source,
            target,
            source_var: SOURCE_VAR,
            target_var: TARGET_VAR,
            source_ctx: NamingContext::new(source_pkg, true, &self.scope),
            target_ctx: NamingContext::new(target_pkg, true, &self.scope),
            prefix: "",
            by_ref: true,
        };
        let output = match self.engine.transform(&request) {
            Ok(output) => output,
            Err(err) => {
                log::warn!(
                    "tool {}: {function} falls back to JSON dispatch: {err}",
                    tool.qualified_name
                );
                return Ok(None);
            }
        };
        self.checked_body(file, tool, function, output, false)
    }

    fn plan_server_data(
        &self,
        file: &mut FileState<'_>,
        tool: &Tool,
        method: &MethodBinding,
        projection: &ServerDataProjection,
    ) -> Result<()> {
        let toolset = file.toolset.name.clone();
        let field = &projection.method_result_field;

        let source = method
            .result
            .field(field)
            .filter(|attribute| !attribute.is_empty())
            .ok_or_else(|| CodegenError::ServerDataFieldMissing {
                toolset: toolset.clone(),
                tool: tool.qualified_name.clone(),
                kind: projection.kind.clone(),
                field: field.clone(),
            })?;

        let type_name = server_data_type_name(tool, projection);
        let target = file.index.get(&type_name).cloned().ok_or_else(|| {
            CodegenError::ServerDataTypeMissing {
                toolset: toolset.clone(),
                tool: tool.qualified_name.clone(),
                kind: projection.kind.clone(),
                type_name: type_name.clone(),
            }
        })?;

        check_compatible(
            &source,
            &target,
            &format!("{} result.{field}", method.name),
            &type_name,
        )
        .map_err(|source| CodegenError::ServerDataIncompatible {
            toolset: toolset.clone(),
            tool: tool.qualified_name.clone(),
            kind: projection.kind.clone(),
            source,
        })?;

        let source_pkg = source
            .type_location()
            .map(|location| location.package_name)
            .unwrap_or_else(|| file.service_alias.clone());
        let nil_guard = needs_nil_guard(Some(&method.result), field, Some(&source));
        // Optional primitives arrive as pointers and are dereferenced once
        // the guard has run.
        let pointer_param = nil_guard && source.resolved_primitive().is_some();
        let name = format!("Init{}{}ServerData", tool.go_name(), projection.go_kind());

        let request = TransformRequest {
            source: &source,
            target: &target,
            source_var: if pointer_param { "(*v)" } else { SOURCE_VAR },
            target_var: TARGET_VAR,
            source_ctx: NamingContext::new(&source_pkg, true, &self.scope),
            target_ctx: NamingContext::new("", true, &self.scope),
            prefix: "",
            by_ref: true,
        };
        let output = self
            .engine
            .transform(&request)
            .map_err(|source| CodegenError::Transform {
                toolset: toolset.clone(),
                tool: tool.qualified_name.clone(),
                function: name.clone(),
                source,
            })?;
        let Some(output) = self.checked_body(file, tool, &name, output, true)? else {
            return Ok(());
        };

        let mut param_type_ref = self.scope.full_type_ref(&source, &source_pkg);
        if pointer_param && !param_type_ref.starts_with('*') {
            param_type_ref.insert(0, '*');
        }
        file.functions.push(TransformFunction {
            name,
            param_type_ref,
            result_type_ref: self.scope.full_type_ref(&target, ""),
            body: output.body,
            nil_input_returns_nil: nil_guard,
        });
        file.helpers.extend(output.helpers)?;
        file.import_from([&source, &target]);
        Ok(())
    }

    /// An empty body is a skip only when nothing else was produced and the
    /// conversion is optional.
    fn checked_body(
        &self,
        file: &FileState<'_>,
        tool: &Tool,
        function: &str,
        output: TransformOutput,
        required: bool,
    ) -> Result<Option<TransformOutput>> {
        if !output.body.trim().is_empty() {
            return Ok(Some(output));
        }
        if required || !output.helpers.is_empty() {
            return Err(CodegenError::EmptyTransformBody {
                toolset: file.toolset.name.clone(),
                tool: tool.qualified_name.clone(),
                function: function.to_string(),
                helpers: output.helpers.len(),
            });
        }
        log::debug!("tool {}: {function} has an empty body", tool.qualified_name);
        Ok(None)
    }
}
