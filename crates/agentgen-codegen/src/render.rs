//! Renders a [`TransformPlan`] into Go source.

use crate::planner::TransformPlan;
use crate::transform::indent;
use minijinja::{Environment, context};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

const TEMPLATE_NAME: &str = "transforms.go";

const TEMPLATE: &str = r#"// Code generated by agentgen. DO NOT EDIT.

package {{ package }}
{% if imports %}

import (
{% for line in imports %}
	{{ line }}
{% endfor %}
)
{% endif %}
{% for function in functions %}

// {{ function.name }} builds a {{ function.result_type_ref }} from a {{ function.param_type_ref }}.
func {{ function.name }}(v {{ function.param_type_ref }}) {{ function.result_type_ref }} {
{% if function.nil_guard %}
	if v == nil {
		return {{ function.zero }}
	}
{% endif %}
{{ function.body | tab_indent }}	return res
}
{% endfor %}
"#;

#[derive(Serialize)]
struct FunctionView<'a> {
    name: &'a str,
    param_type_ref: &'a str,
    result_type_ref: &'a str,
    body: &'a str,
    nil_guard: bool,
    zero: String,
}

pub fn render_transforms(plan: &TransformPlan) -> Result<String, RenderError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("tab_indent", |code: String| indent(&code));
    env.add_template(TEMPLATE_NAME, TEMPLATE)?;

    let imports: Vec<String> = plan
        .imports
        .iter()
        .map(|import| match &import.name {
            Some(name) => format!("{name} {:?}", import.path),
            None => format!("{:?}", import.path),
        })
        .collect();

    // Helpers carry their own nil guard in the body.
    let functions: Vec<FunctionView<'_>> = plan
        .functions
        .iter()
        .map(|function| FunctionView {
            name: &function.name,
            param_type_ref: &function.param_type_ref,
            result_type_ref: &function.result_type_ref,
            body: &function.body,
            nil_guard: function.nil_input_returns_nil,
            zero: zero_value(&function.result_type_ref),
        })
        .chain(plan.helpers.iter().map(|helper| FunctionView {
            name: &helper.name,
            param_type_ref: &helper.param_type_ref,
            result_type_ref: &helper.result_type_ref,
            body: &helper.body,
            nil_guard: false,
            zero: zero_value(&helper.result_type_ref),
        }))
        .collect();

    let template = env.get_template(TEMPLATE_NAME)?;
    let mut source = template.render(context! {
        package => plan.package,
        imports => imports,
        functions => functions,
    })?;
    if !source.ends_with('\n') {
        source.push('\n');
    }
    Ok(source)
}

fn zero_value(type_ref: &str) -> String {
    match type_ref {
        "any" | "error" => "nil".to_string(),
        "string" => "\"\"".to_string(),
        "bool" => "false".to_string(),
        "int" | "int32" | "int64" | "uint" | "uint32" | "uint64" | "float32" | "float64" => {
            "0".to_string()
        }
        r if r.starts_with('*') || r.starts_with("[]") || r.starts_with("map[") => {
            "nil".to_string()
        }
        r => format!("*new({r})"),
    }
}
