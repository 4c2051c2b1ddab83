//! Shape compatibility between two attribute trees.

use crate::expr::{Attribute, DataType, NamedAttribute};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// First node at which two attribute trees diverge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{left} is not compatible with {right}: {reason}")]
pub struct CompatibilityError {
    pub left: String,
    pub right: String,
    pub reason: String,
}

/// Checks that `a` and `b` can be converted into one another field for field.
///
/// Objects must declare the same field names and the same required set,
/// primitives must share a [`PrimitiveFamily`](crate::expr::PrimitiveFamily),
/// and arrays, maps and unions are compared element-wise. Pairs of user types
/// already under comparison are assumed compatible, which terminates
/// recursive types.
pub fn check_compatible(
    a: &Attribute,
    b: &Attribute,
    a_label: &str,
    b_label: &str,
) -> Result<(), CompatibilityError> {
    Checker::default().check(a, b, a_label, b_label)
}

#[derive(Default)]
struct Checker {
    assumed: HashSet<(String, String)>,
}

impl Checker {
    fn check(
        &mut self,
        a: &Attribute,
        b: &Attribute,
        a_path: &str,
        b_path: &str,
    ) -> Result<(), CompatibilityError> {
        let fail = |reason: String| CompatibilityError {
            left: a_path.to_string(),
            right: b_path.to_string(),
            reason,
        };

        match (&a.ty, &b.ty) {
            (None, None) => Ok(()),
            (None, Some(_)) | (Some(_), None) => Err(fail("one side is empty".to_string())),
            (Some(DataType::User(ua)), Some(DataType::User(ub))) => {
                if !self.assumed.insert((ua.name.clone(), ub.name.clone())) {
                    return Ok(());
                }
                let body_a = ua.attribute.borrow();
                let body_b = ub.attribute.borrow();
                self.check(&body_a, &body_b, a_path, b_path)
            }
            (Some(DataType::User(ua)), Some(_)) => {
                let body = ua.attribute.borrow();
                self.check(&body, b, a_path, b_path)
            }
            (Some(_), Some(DataType::User(ub))) => {
                let body = ub.attribute.borrow();
                self.check(a, &body, a_path, b_path)
            }
            (Some(DataType::Primitive(pa)), Some(DataType::Primitive(pb))) => {
                if pa.family() == pb.family() {
                    Ok(())
                } else {
                    Err(fail(format!("{} vs {}", pa.family(), pb.family())))
                }
            }
            (Some(DataType::Object(fa)), Some(DataType::Object(fb))) => {
                let names_a: BTreeSet<&str> = fa.iter().map(|f| f.name.as_str()).collect();
                let names_b: BTreeSet<&str> = fb.iter().map(|f| f.name.as_str()).collect();
                if names_a != names_b {
                    let only_a: Vec<&str> = names_a.difference(&names_b).copied().collect();
                    let only_b: Vec<&str> = names_b.difference(&names_a).copied().collect();
                    return Err(fail(format!(
                        "field sets differ (only left: {only_a:?}, only right: {only_b:?})"
                    )));
                }
                let required_a: BTreeSet<&str> = a.required.iter().map(String::as_str).collect();
                let required_b: BTreeSet<&str> = b.required.iter().map(String::as_str).collect();
                if required_a != required_b {
                    return Err(fail(format!(
                        "required fields differ ({required_a:?} vs {required_b:?})"
                    )));
                }
                for field in fa {
                    if let Some(other) = find(fb, &field.name) {
                        self.check(
                            &field.attribute,
                            &other.attribute,
                            &format!("{a_path}.{}", field.name),
                            &format!("{b_path}.{}", field.name),
                        )?;
                    }
                }
                Ok(())
            }
            (Some(DataType::Array(ea)), Some(DataType::Array(eb))) => {
                self.check(ea, eb, &format!("{a_path}[]"), &format!("{b_path}[]"))
            }
            (Some(DataType::Map(ka, va)), Some(DataType::Map(kb, vb))) => {
                self.check(ka, kb, &format!("{a_path}[key]"), &format!("{b_path}[key]"))?;
                self.check(va, vb, &format!("{a_path}[value]"), &format!("{b_path}[value]"))
            }
            (Some(DataType::Union(ma)), Some(DataType::Union(mb))) => {
                if ma.len() != mb.len() {
                    return Err(fail(format!(
                        "union member counts differ ({} vs {})",
                        ma.len(),
                        mb.len()
                    )));
                }
                for (left, right) in ma.iter().zip(mb) {
                    if left.name != right.name {
                        return Err(fail(format!(
                            "union members differ ({} vs {})",
                            left.name, right.name
                        )));
                    }
                    self.check(
                        &left.attribute,
                        &right.attribute,
                        &format!("{a_path}<{}>", left.name),
                        &format!("{b_path}<{}>", right.name),
                    )?;
                }
                Ok(())
            }
            (Some(ta), Some(tb)) => Err(fail(format!("{} vs {}", ta.kind(), tb.kind()))),
        }
    }
}

fn find<'a>(fields: &'a [NamedAttribute], name: &str) -> Option<&'a NamedAttribute> {
    fields.iter().find(|field| field.name == name)
}
