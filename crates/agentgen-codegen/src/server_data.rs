use crate::expr::Attribute;

/// Decides whether a server-data transform must return nil on a nil input.
///
/// `parent` is the method result holding `field`; `source` is the field's
/// attribute. Required fields are never nil. Optional non-primitives are
/// nilable, and optional primitives are nilable only when modeled as
/// pointers.
pub fn needs_nil_guard(parent: Option<&Attribute>, field: &str, source: Option<&Attribute>) -> bool {
    let (Some(parent), Some(source)) = (parent, source) else {
        return false;
    };
    if field.is_empty() || source.is_empty() {
        return false;
    }
    if parent.is_required(field) {
        return false;
    }
    if !source.is_primitive() {
        return true;
    }
    parent.is_primitive_pointer(field, true)
}
