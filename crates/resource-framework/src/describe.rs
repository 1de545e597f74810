//! # Type Descriptions
//!
//! Rust has no runtime reflection, so every type that takes part in validation
//! describes its own serialized layout once, in code, through [`TypeDescriptor`].
//! The description is the input of the field tree builder and is consulted only at
//! registration time; request handling works from the cached tree.
//!
//! ```rust
//! use resource_framework::describe::{Describe, FieldType, TypeDescriptor};
//!
//! struct Disk;
//!
//! impl Describe for Disk {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::new("Disk")
//!             .field("name", FieldType::String, "required=true,minLen=1,maxLen=64")
//!             .field("driver", FieldType::string_like("Driver"), "options=lvm|ceph")
//!             .field("sizeGb", FieldType::Uint, "min=1,max=4096")
//!     }
//! }
//!
//! assert_eq!(Disk::describe().fields().len(), 3);
//! ```

use std::fmt;

/// Implemented by every type whose fields carry constraints.
pub trait Describe {
    fn describe() -> TypeDescriptor;
}

/// Static shape of a single field, as declared.
#[derive(Clone)]
pub enum FieldType {
    Bool,
    Int,
    Uint,
    String,
    /// A named string type, e.g. an enum serialized as a string.
    StringLike(&'static str),
    Struct(fn() -> TypeDescriptor),
    Ptr(Box<FieldType>),
    Slice(Box<FieldType>),
    Map(Box<FieldType>, Box<FieldType>),
}

impl FieldType {
    pub fn string_like(name: &'static str) -> Self {
        FieldType::StringLike(name)
    }

    pub fn struct_of<T: Describe>() -> Self {
        FieldType::Struct(T::describe)
    }

    pub fn ptr(inner: FieldType) -> Self {
        FieldType::Ptr(Box::new(inner))
    }

    pub fn slice(element: FieldType) -> Self {
        FieldType::Slice(Box::new(element))
    }

    pub fn map(key: FieldType, value: FieldType) -> Self {
        FieldType::Map(Box::new(key), Box::new(value))
    }

    /// Convenience for the common `map[string]X` case.
    pub fn string_map(value: FieldType) -> Self {
        FieldType::map(FieldType::String, value)
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => f.write_str("bool"),
            FieldType::Int => f.write_str("int"),
            FieldType::Uint => f.write_str("uint"),
            FieldType::String => f.write_str("string"),
            FieldType::StringLike(name) => f.write_str(name),
            FieldType::Struct(describe) => f.write_str(describe().name()),
            FieldType::Ptr(inner) => write!(f, "*{:?}", inner),
            FieldType::Slice(inner) => write!(f, "[]{:?}", inner),
            FieldType::Map(key, value) => write!(f, "map[{:?}]{:?}", key, value),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One declared field: serialized name, type and raw constraint tags.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
    pub tags: String,
}

#[derive(Debug, Clone)]
pub(crate) enum Member {
    Field(FieldDef),
    Inline(TypeDescriptor),
}

/// Ordered field layout of a type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    members: Vec<Member>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: FieldType, tags: impl Into<String>) -> Self {
        self.members.push(Member::Field(FieldDef {
            name: name.into(),
            ty,
            tags: tags.into(),
        }));
        self
    }

    /// Embeds another type whose fields are serialized flat into this one
    /// (`#[serde(flatten)]`).
    pub fn inline(mut self, embedded: TypeDescriptor) -> Self {
        self.members.push(Member::Inline(embedded));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn members(&self) -> &[Member] {
        &self.members
    }

    /// Canonical rendering of the name and every member's name, type and tags.
    ///
    /// Two descriptors with the same name describe the same type only if their
    /// layouts are equal.
    pub fn layout(&self) -> String {
        let mut out = String::new();
        self.write_layout(&mut out);
        out
    }

    fn write_layout(&self, out: &mut String) {
        out.push_str(&self.name);
        out.push('{');
        for member in &self.members {
            match member {
                Member::Field(def) => {
                    out.push_str(&format!("{}:{}[{}];", def.name, def.ty, def.tags));
                }
                Member::Inline(embedded) => {
                    embedded.write_layout(out);
                    out.push(';');
                }
            }
        }
        out.push('}');
    }

    /// Declared fields with inline members expanded in place.
    pub fn fields(&self) -> Vec<&FieldDef> {
        let mut out = Vec::new();
        for member in &self.members {
            match member {
                Member::Field(def) => out.push(def),
                Member::Inline(embedded) => out.extend(embedded.fields()),
            }
        }
        out
    }
}
