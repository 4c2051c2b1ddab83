use super::{TransformEngine, TransformError, TransformHelper, TransformOutput, TransformRequest};
use crate::expr::{Attribute, DataType, NamedAttribute};
use crate::naming::{NamingContext, goify};
use serde_json::Value;
use std::collections::HashSet;

/// Writes Go conversion statements.
///
/// The body declares the target variable and fills it field by field.
/// Nested user types go through helpers named
/// `transform<Prefix><SrcPkg><Source>To<TgtPkg><Target>`; each helper is generated once per
/// request, which also terminates recursive types.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoTransformer;

impl TransformEngine for GoTransformer {
    fn transform(&self, request: &TransformRequest<'_>) -> Result<TransformOutput, TransformError> {
        let mut emitter = Emitter {
            src: request.source_ctx,
            tgt: request.target_ctx,
            prefix: request.prefix,
            by_ref: request.by_ref,
            helpers: Vec::new(),
            emitted: HashSet::new(),
        };
        let body = emitter.convert(
            request.source,
            request.target,
            request.source_var,
            request.target_var,
            true,
            0,
            Position::Root,
        )?;
        Ok(TransformOutput {
            body,
            helpers: emitter.helpers,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// The attribute pair handed to the engine.
    Root,
    /// The body of a helper.
    Helper,
    Nested,
}

struct Emitter<'a> {
    src: NamingContext<'a>,
    tgt: NamingContext<'a>,
    prefix: &'a str,
    by_ref: bool,
    helpers: Vec<TransformHelper>,
    emitted: HashSet<String>,
}

impl Emitter<'_> {
    #[allow(clippy::too_many_arguments)]
    fn convert(
        &mut self,
        src: &Attribute,
        tgt: &Attribute,
        sv: &str,
        tv: &str,
        declare: bool,
        depth: usize,
        position: Position,
    ) -> Result<String, TransformError> {
        if src.is_empty() || tgt.is_empty() {
            return Err(TransformError::Unsupported {
                path: sv.to_string(),
                reason: "empty attribute".to_string(),
            });
        }

        let src_r = src.with_resolved(Clone::clone);
        let tgt_r = tgt.with_resolved(Clone::clone);
        let op = if declare { ":=" } else { "=" };

        if position == Position::Nested
            && src.user_type().is_some()
            && tgt.user_type().is_some()
            && !src_r.is_primitive()
        {
            let helper = self.helper(src, tgt)?;
            return Ok(format!("{tv} {op} {helper}({sv})\n"));
        }

        match (&src_r.ty, &tgt_r.ty) {
            (Some(DataType::Primitive(_)), Some(DataType::Primitive(_))) => {
                Ok(format!("{tv} {op} {}\n", self.cast(src, tgt, sv)))
            }
            (Some(DataType::Object(src_fields)), Some(DataType::Object(tgt_fields))) => self
                .object(
                    tgt, &src_r, &tgt_r, src_fields, tgt_fields, sv, tv, op, depth, position,
                ),
            (Some(DataType::Array(src_elem)), Some(DataType::Array(tgt_elem))) => {
                let (i, val) = (loop_var("i", depth), loop_var("val", depth));
                let inner = self.convert(
                    src_elem,
                    tgt_elem,
                    &val,
                    &format!("{tv}[{i}]"),
                    false,
                    depth + 1,
                    Position::Nested,
                )?;
                Ok(format!(
                    "{tv} {op} make({}, len({sv}))\nfor {i}, {val} := range {sv} {{\n{}}}\n",
                    self.tgt.type_ref(tgt),
                    indent(&inner)
                ))
            }
            (Some(DataType::Map(src_key, src_val)), Some(DataType::Map(tgt_key, tgt_val))) => {
                if src_key.resolved_primitive().is_none() || tgt_key.resolved_primitive().is_none()
                {
                    return Err(TransformError::Unsupported {
                        path: sv.to_string(),
                        reason: "map keys must be primitives".to_string(),
                    });
                }
                let (key, val, tk) = (
                    loop_var("key", depth),
                    loop_var("val", depth),
                    loop_var("tk", depth),
                );
                let value = self.convert(
                    src_val,
                    tgt_val,
                    &val,
                    &format!("{tv}[{tk}]"),
                    false,
                    depth + 1,
                    Position::Nested,
                )?;
                Ok(format!(
                    "{tv} {op} make({}, len({sv}))\nfor {key}, {val} := range {sv} {{\n\t{tk} := {}\n{}}}\n",
                    self.tgt.type_ref(tgt),
                    self.cast(src_key, tgt_key, &key),
                    indent(&value)
                ))
            }
            (Some(DataType::Union(src_members)), Some(DataType::Union(tgt_members))) => {
                self.union(tgt, src_members, tgt_members, sv, tv, declare, depth)
            }
            (Some(source), Some(target)) => Err(TransformError::Mismatch {
                path: sv.to_string(),
                source_kind: source.kind().to_string(),
                target_kind: target.kind().to_string(),
            }),
            _ => Err(TransformError::Unsupported {
                path: sv.to_string(),
                reason: "empty attribute".to_string(),
            }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn object(
        &mut self,
        tgt: &Attribute,
        src_r: &Attribute,
        tgt_r: &Attribute,
        src_fields: &[NamedAttribute],
        tgt_fields: &[NamedAttribute],
        sv: &str,
        tv: &str,
        op: &str,
        depth: usize,
        position: Position,
    ) -> Result<String, TransformError> {
        let tref = self.tgt.type_ref(tgt);
        let open = match tref.strip_prefix('*') {
            Some(value) if position == Position::Root && !self.by_ref => value.to_string(),
            Some(value) => format!("&{value}"),
            None => tref.clone(),
        };

        let mut literal = String::new();
        let mut post = String::new();
        for tfield in tgt_fields {
            let Some(sfield) = src_fields.iter().find(|f| f.name == tfield.name) else {
                continue;
            };
            let go_field = goify(&tfield.name, true);
            let sexpr = format!("{sv}.{go_field}");
            let texpr = format!("{tv}.{go_field}");
            let (sa, ta) = (&sfield.attribute, &tfield.attribute);

            if sa.resolved_primitive().is_some() && ta.resolved_primitive().is_some() {
                let src_ptr = src_r.is_primitive_pointer(&sfield.name, self.src.use_default);
                let tgt_ptr = tgt_r.is_primitive_pointer(&tfield.name, self.tgt.use_default);
                let needs_cast = self.src.type_ref(sa) != self.tgt.type_ref(ta);
                match (src_ptr, tgt_ptr) {
                    (false, false) => {
                        literal.push_str(&format!("\t{go_field}: {},\n", self.cast(sa, ta, &sexpr)));
                    }
                    (true, true) if !needs_cast => {
                        literal.push_str(&format!("\t{go_field}: {sexpr},\n"));
                    }
                    (true, true) => {
                        post.push_str(&format!(
                            "if {sexpr} != nil {{\n\ttmp := {}\n\t{texpr} = &tmp\n}}\n",
                            self.cast(sa, ta, &format!("*{sexpr}"))
                        ));
                    }
                    (true, false) => {
                        post.push_str(&format!(
                            "if {sexpr} != nil {{\n\t{texpr} = {}\n}}\n",
                            self.cast(sa, ta, &format!("*{sexpr}"))
                        ));
                        if self.tgt.use_default
                            && let Some(default) = ta.default_value.as_ref().and_then(go_literal)
                        {
                            post.push_str(&format!(
                                "if {sexpr} == nil {{\n\t{texpr} = {default}\n}}\n"
                            ));
                        }
                    }
                    (false, true) if !needs_cast => {
                        literal.push_str(&format!("\t{go_field}: &{sexpr},\n"));
                    }
                    (false, true) => {
                        post.push_str(&format!(
                            "{{\n\ttmp := {}\n\t{texpr} = &tmp\n}}\n",
                            self.cast(sa, ta, &sexpr)
                        ));
                    }
                }
                continue;
            }

            let inner = self.convert(sa, ta, &sexpr, &texpr, false, depth + 1, Position::Nested)?;
            let inline_struct = ta.user_type().is_none() && ta.is_object();
            if inline_struct {
                post.push_str(&inner);
            } else {
                post.push_str(&format!("if {sexpr} != nil {{\n{}}}\n", indent(&inner)));
            }
        }

        let literal = if literal.is_empty() {
            format!("{open}{{}}")
        } else {
            format!("{open}{{\n{literal}}}")
        };
        Ok(format!("{tv} {op} {literal}\n{post}"))
    }

    #[allow(clippy::too_many_arguments)]
    fn union(
        &mut self,
        tgt: &Attribute,
        src_members: &[NamedAttribute],
        tgt_members: &[NamedAttribute],
        sv: &str,
        tv: &str,
        declare: bool,
        depth: usize,
    ) -> Result<String, TransformError> {
        let mut code = String::new();
        if declare {
            code.push_str(&format!("var {tv} {}\n", self.tgt.type_ref(tgt)));
        }
        let actual = loop_var("actual", depth);
        let mut cases = HashSet::new();
        code.push_str(&format!("switch {actual} := {sv}.(type) {{\n"));
        for smember in src_members {
            let Some(tmember) = tgt_members.iter().find(|m| m.name == smember.name) else {
                return Err(TransformError::Unsupported {
                    path: sv.to_string(),
                    reason: format!("union member {} has no counterpart", smember.name),
                });
            };
            let case_ref = self.src.type_ref(&smember.attribute);
            if !cases.insert(case_ref.clone()) {
                return Err(TransformError::Unsupported {
                    path: sv.to_string(),
                    reason: format!("union members share the Go type {case_ref}"),
                });
            }
            let inner = self.convert(
                &smember.attribute,
                &tmember.attribute,
                &actual,
                tv,
                false,
                depth + 1,
                Position::Nested,
            )?;
            code.push_str(&format!("case {case_ref}:\n{}", indent(&inner)));
        }
        code.push_str("}\n");
        Ok(code)
    }

    fn helper(&mut self, src: &Attribute, tgt: &Attribute) -> Result<String, TransformError> {
        // Package qualifiers keep the two directions of one type pair apart.
        let name = format!(
            "transform{}{}{}To{}{}",
            self.prefix,
            pkg_part(&self.src.package_of(src)),
            self.src.scope.type_name(src),
            pkg_part(&self.tgt.package_of(tgt)),
            self.tgt.scope.type_name(tgt)
        );
        if !self.emitted.insert(name.clone()) {
            return Ok(name);
        }
        let param_type_ref = self.src.type_ref(src);
        let result_type_ref = self.tgt.type_ref(tgt);
        let conversion = self.convert(src, tgt, "v", "res", true, 0, Position::Helper)?;
        let body = if param_type_ref.starts_with('*') {
            format!("if v == nil {{\n\treturn nil\n}}\n{conversion}")
        } else {
            conversion
        };
        self.helpers.push(TransformHelper {
            name: name.clone(),
            param_type_ref,
            result_type_ref,
            body,
        });
        Ok(name)
    }

    /// Converts a primitive expression when the two sides spell the type
    /// differently.
    fn cast(&self, src: &Attribute, tgt: &Attribute, expr: &str) -> String {
        let tref = self.tgt.type_ref(tgt);
        if self.src.type_ref(src) == tref {
            expr.to_string()
        } else {
            format!("{tref}({expr})")
        }
    }
}

fn pkg_part(pkg: &str) -> String {
    if pkg.is_empty() {
        String::new()
    } else {
        goify(pkg, true)
    }
}

fn loop_var(base: &str, depth: usize) -> String {
    if depth == 0 {
        base.to_string()
    } else {
        format!("{base}{depth}")
    }
}

fn go_literal(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(format!("{s:?}")),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn indent(code: &str) -> String {
    code.lines()
        .map(|line| {
            if line.is_empty() {
                "\n".to_string()
            } else {
                format!("\t{line}\n")
            }
        })
        .collect()
}
