//! Go identifiers and type references.

use crate::expr::{Attribute, DataType};

const INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID",
    "IP", "JSON", "JWT", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP",
    "TLS", "TTL", "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XMPP", "XSRF",
    "XSS",
];

const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Converts `name` into a Go identifier in camel case. `upper` selects an
/// exported (UpperCamel) identifier. Common initialisms are upper-cased:
/// `by_id` becomes `ByID`.
pub fn goify(name: &str, upper: bool) -> String {
    let mut out = String::new();
    let words = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty());
    for (idx, word) in words.enumerate() {
        let first = idx == 0;
        let upper_word = word.to_ascii_uppercase();
        if INITIALISMS.contains(&upper_word.as_str()) {
            if first && !upper {
                out.push_str(&word.to_ascii_lowercase());
            } else {
                out.push_str(&upper_word);
            }
            continue;
        }
        let mut chars = word.chars();
        if let Some(head) = chars.next() {
            if first && !upper {
                out.push(head.to_ascii_lowercase());
            } else {
                out.push(head.to_ascii_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    if out.is_empty() {
        return "v".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Sanitises a package path segment into a Go package identifier.
pub fn package_alias(segment: &str) -> String {
    let mut alias: String = segment
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if alias.is_empty() {
        return "pkg".to_string();
    }
    if alias.starts_with(|c: char| c.is_ascii_digit()) || GO_KEYWORDS.contains(&alias.as_str()) {
        alias.insert_str(0, "pkg");
    }
    alias
}

/// Yields source-level type references for attributes.
pub trait NameScope {
    /// Reference to the type of `attribute`, qualifying un-located user types
    /// with `default_pkg` when it is non-empty.
    fn full_type_ref(&self, attribute: &Attribute, default_pkg: &str) -> String;

    /// Unqualified reference.
    fn type_ref(&self, attribute: &Attribute) -> String {
        self.full_type_ref(attribute, "")
    }

    /// Bare identifier for the type, used to derive helper names.
    fn type_name(&self, attribute: &Attribute) -> String;
}

/// Naming conventions for one side of a transform.
#[derive(Clone, Copy)]
pub struct NamingContext<'a> {
    /// Qualifier for user types without a type-location override.
    pub default_pkg: &'a str,
    /// Optional primitives with default values are plain values.
    pub use_default: bool,
    pub scope: &'a dyn NameScope,
}

impl<'a> NamingContext<'a> {
    pub fn new(default_pkg: &'a str, use_default: bool, scope: &'a dyn NameScope) -> Self {
        Self {
            default_pkg,
            use_default,
            scope,
        }
    }

    pub fn type_ref(&self, attribute: &Attribute) -> String {
        self.scope.full_type_ref(attribute, self.default_pkg)
    }

    /// Package a user type is qualified with on this side; empty for local
    /// and non-user types.
    pub fn package_of(&self, attribute: &Attribute) -> String {
        if attribute.user_type().is_none() {
            return String::new();
        }
        attribute
            .type_location()
            .map(|location| location.package_name)
            .unwrap_or_else(|| self.default_pkg.to_string())
    }
}

/// Go name scope following the generated-code conventions: object user types
/// are referenced through pointers, everything else by value.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoNameScope;

impl GoNameScope {
    fn qualifier(&self, attribute: &Attribute, default_pkg: &str) -> String {
        let pkg = attribute
            .type_location()
            .map(|location| location.package_name)
            .unwrap_or_else(|| default_pkg.to_string());
        if pkg.is_empty() {
            String::new()
        } else {
            format!("{pkg}.")
        }
    }
}

impl NameScope for GoNameScope {
    fn full_type_ref(&self, attribute: &Attribute, default_pkg: &str) -> String {
        match &attribute.ty {
            None => "any".to_string(),
            Some(DataType::Primitive(primitive)) => primitive.go_name().to_string(),
            Some(DataType::Array(element)) => {
                format!("[]{}", self.full_type_ref(element, default_pkg))
            }
            Some(DataType::Map(key, value)) => format!(
                "map[{}]{}",
                self.full_type_ref(key, default_pkg),
                self.full_type_ref(value, default_pkg)
            ),
            Some(DataType::Object(fields)) => {
                if fields.is_empty() {
                    return "struct{}".to_string();
                }
                let members: Vec<String> = fields
                    .iter()
                    .map(|field| {
                        let pointer = if attribute.is_primitive_pointer(&field.name, true) {
                            "*"
                        } else {
                            ""
                        };
                        format!(
                            "{} {pointer}{}",
                            goify(&field.name, true),
                            self.full_type_ref(&field.attribute, default_pkg)
                        )
                    })
                    .collect();
                format!("struct {{ {} }}", members.join("; "))
            }
            Some(DataType::Union(_)) => "any".to_string(),
            Some(DataType::User(ut)) => {
                let pointer = if attribute.is_object() { "*" } else { "" };
                format!(
                    "{pointer}{}{}",
                    self.qualifier(attribute, default_pkg),
                    goify(&ut.name, true)
                )
            }
        }
    }

    fn type_name(&self, attribute: &Attribute) -> String {
        match &attribute.ty {
            None => "Any".to_string(),
            Some(DataType::Primitive(primitive)) => goify(&primitive.to_string(), true),
            Some(DataType::Array(element)) => format!("{}List", self.type_name(element)),
            Some(DataType::Map(key, value)) => {
                format!("MapOf{}{}", self.type_name(key), self.type_name(value))
            }
            Some(DataType::Object(_)) => "Struct".to_string(),
            Some(DataType::Union(_)) => "Union".to_string(),
            Some(DataType::User(ut)) => goify(&ut.name, true),
        }
    }
}
