//! In-memory attribute trees and agent declarations consumed by the planner.
//!
//! Attributes mirror the service-description DSL: a node is either empty, a
//! primitive, an inline object/array/map/union, or a reference to a named
//! [`UserType`]. User types are shared through `Rc` and may be recursive, so
//! every traversal in this crate guards on [`UserType::name`].

mod agent;

pub use agent::{MethodBinding, ServerDataProjection, Service, Tool, Toolset};
pub(crate) use agent::join_import_path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use strum::{Display, EnumString};

/// Primitive DSL types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Primitive {
    Boolean,
    Int,
    Int32,
    Int64,
    UInt,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Bytes,
    Any,
}

/// Coarse primitive categories used by the compatibility oracle. Numeric
/// widths collapse into [`PrimitiveFamily::Number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveFamily {
    Bool,
    Number,
    String,
    Bytes,
    Any,
}

impl Primitive {
    pub fn family(self) -> PrimitiveFamily {
        match self {
            Primitive::Boolean => PrimitiveFamily::Bool,
            Primitive::Int
            | Primitive::Int32
            | Primitive::Int64
            | Primitive::UInt
            | Primitive::UInt32
            | Primitive::UInt64
            | Primitive::Float32
            | Primitive::Float64 => PrimitiveFamily::Number,
            Primitive::String => PrimitiveFamily::String,
            Primitive::Bytes => PrimitiveFamily::Bytes,
            Primitive::Any => PrimitiveFamily::Any,
        }
    }

    /// Go spelling of the primitive.
    pub fn go_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "bool",
            Primitive::Int => "int",
            Primitive::Int32 => "int32",
            Primitive::Int64 => "int64",
            Primitive::UInt => "uint",
            Primitive::UInt32 => "uint32",
            Primitive::UInt64 => "uint64",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
            Primitive::String => "string",
            Primitive::Bytes => "[]byte",
            Primitive::Any => "any",
        }
    }

    /// Bytes and any are reference-like in Go and never wrapped in pointers.
    pub fn is_pointer_eligible(self) -> bool {
        !matches!(self, Primitive::Bytes | Primitive::Any)
    }
}

/// Package a user type is forced into by type-location metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeLocation {
    #[serde(rename = "path")]
    pub package_path: String,
    #[serde(rename = "name")]
    pub package_name: String,
}

impl TypeLocation {
    pub fn new(package_path: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            package_path: package_path.into(),
            package_name: package_name.into(),
        }
    }
}

/// A field of an object or a member of a union.
#[derive(Debug, Clone)]
pub struct NamedAttribute {
    pub name: String,
    pub attribute: Attribute,
}

impl NamedAttribute {
    pub fn new(name: impl Into<String>, attribute: Attribute) -> Self {
        Self {
            name: name.into(),
            attribute,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DataType {
    Primitive(Primitive),
    Object(Vec<NamedAttribute>),
    Array(Box<Attribute>),
    Map(Box<Attribute>, Box<Attribute>),
    Union(Vec<NamedAttribute>),
    User(Rc<UserType>),
}

impl DataType {
    pub fn kind(&self) -> &'static str {
        match self {
            DataType::Primitive(_) => "primitive",
            DataType::Object(_) => "object",
            DataType::Array(_) => "array",
            DataType::Map(_, _) => "map",
            DataType::Union(_) => "union",
            DataType::User(_) => "user type",
        }
    }
}

/// A named attribute tree. The body sits behind a `RefCell` so recursive
/// types can be tied after every `Rc` has been created.
pub struct UserType {
    pub name: String,
    /// Path name of the service whose generated package declares this type.
    pub service: Option<String>,
    pub location: Option<TypeLocation>,
    pub attribute: RefCell<Attribute>,
}

impl UserType {
    pub fn new(name: impl Into<String>, attribute: Attribute) -> Self {
        Self {
            name: name.into(),
            service: None,
            location: None,
            attribute: RefCell::new(attribute),
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_location(mut self, location: TypeLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn set_attribute(&self, attribute: Attribute) {
        *self.attribute.borrow_mut() = attribute;
    }
}

// Bodies may point back at the type itself; print the name only.
impl fmt::Debug for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserType")
            .field("name", &self.name)
            .field("service", &self.service)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// A typed node. `ty == None` is the empty attribute.
#[derive(Debug, Clone, Default)]
pub struct Attribute {
    pub ty: Option<DataType>,
    /// Names of required fields when the type is an object.
    pub required: Vec<String>,
    pub default_value: Option<Value>,
}

impl Attribute {
    pub fn new(ty: DataType) -> Self {
        Self {
            ty: Some(ty),
            required: Vec::new(),
            default_value: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn primitive(primitive: Primitive) -> Self {
        Self::new(DataType::Primitive(primitive))
    }

    pub fn string() -> Self {
        Self::primitive(Primitive::String)
    }

    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Attribute)>,
        S: Into<String>,
    {
        Self::new(DataType::Object(
            fields
                .into_iter()
                .map(|(name, attribute)| NamedAttribute::new(name, attribute))
                .collect(),
        ))
    }

    pub fn array(element: Attribute) -> Self {
        Self::new(DataType::Array(Box::new(element)))
    }

    pub fn map(key: Attribute, value: Attribute) -> Self {
        Self::new(DataType::Map(Box::new(key), Box::new(value)))
    }

    pub fn union<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = (S, Attribute)>,
        S: Into<String>,
    {
        Self::new(DataType::Union(
            members
                .into_iter()
                .map(|(name, attribute)| NamedAttribute::new(name, attribute))
                .collect(),
        ))
    }

    pub fn user(user_type: Rc<UserType>) -> Self {
        Self::new(DataType::User(user_type))
    }

    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ty.is_none()
    }

    pub fn user_type(&self) -> Option<&Rc<UserType>> {
        match &self.ty {
            Some(DataType::User(ut)) => Some(ut),
            _ => None,
        }
    }

    pub fn type_location(&self) -> Option<TypeLocation> {
        self.user_type().and_then(|ut| ut.location.clone())
    }

    /// Runs `f` against the attribute behind any chain of user types.
    pub fn with_resolved<R>(&self, f: impl FnOnce(&Attribute) -> R) -> R {
        match &self.ty {
            Some(DataType::User(ut)) => ut.attribute.borrow().with_resolved(f),
            _ => f(self),
        }
    }

    /// True when the attribute itself is a primitive (user types are not).
    pub fn is_primitive(&self) -> bool {
        matches!(self.ty, Some(DataType::Primitive(_)))
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self.ty {
            Some(DataType::Primitive(p)) => Some(p),
            _ => None,
        }
    }

    /// Primitive behind any user-type aliases.
    pub fn resolved_primitive(&self) -> Option<Primitive> {
        self.with_resolved(Attribute::as_primitive)
    }

    pub fn is_object(&self) -> bool {
        self.with_resolved(|att| matches!(att.ty, Some(DataType::Object(_))))
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.with_resolved(|att| att.required.iter().any(|name| name == field))
    }

    /// Looks up an object field, following user types.
    pub fn field(&self, name: &str) -> Option<Attribute> {
        self.with_resolved(|att| match &att.ty {
            Some(DataType::Object(fields)) => fields
                .iter()
                .find(|field| field.name == name)
                .map(|field| field.attribute.clone()),
            _ => None,
        })
    }

    /// Whether `field` is rendered as a pointer to a primitive. Required
    /// fields, bytes/any, non-primitives and (when `use_default` is set)
    /// fields with a default value are plain values.
    pub fn is_primitive_pointer(&self, field: &str, use_default: bool) -> bool {
        let Some(att) = self.field(field) else {
            return false;
        };
        let Some(primitive) = att.as_primitive() else {
            return false;
        };
        if !primitive.is_pointer_eligible() || self.is_required(field) {
            return false;
        }
        !(use_default && att.default_value.is_some())
    }
}
