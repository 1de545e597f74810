//! # Field Tree Builder
//!
//! Walks a [`TypeDescriptor`] once and produces a [`FieldTree`]: one
//! [`FieldDescriptor`] per serialized field carrying required-ness, a typed default,
//! the compiled validators and, for struct-carrying fields, a nested sub-tree.
//!
//! The tree is then used per request against two views of the same payload:
//!
//! - the **raw** payload, the untyped JSON object exactly as the client sent it.
//!   Required checks and the "was this key sent?" test for defaults use it.
//! - the **typed** value, i.e. the decoded instance (or its `serde_json` image).
//!   Defaults are written into it and constraints are checked against it.
//!
//! A type without a single required field, default, validator or non-empty nested
//! tree anywhere in its closure builds to `None`, which lets callers skip
//! validation for plain data types entirely.
//!
//! ## Traversal order
//!
//! Fields are visited in declaration order (inline members expanded in place).
//! Default filling is bottom-up per object: every nested sub-object of an object is
//! filled first, in declaration order, then the object's own scalar defaults.

use crate::describe::{FieldDef, Member, TypeDescriptor};
use crate::error::{SchemaError, ValidationError};
use crate::inspect::{inspect, nested_descriptor, Scalar, Shape};
use crate::validator::{self, ConstraintTags, Validator};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Metadata of one serialized field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub shape: Shape,
    pub required: bool,
    pub default: Option<Value>,
    pub nested: Option<Arc<FieldTree>>,
    pub validators: Vec<Validator>,
}

impl FieldDescriptor {
    fn is_constrained(&self) -> bool {
        self.required || self.default.is_some() || !self.validators.is_empty() || self.nested.is_some()
    }

    fn is_missing(&self, value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(Value::Object(entries)) => self.shape.is_map() && entries.is_empty(),
            Some(_) => false,
        }
    }
}

/// Validation metadata of one type.
#[derive(Debug, Clone)]
pub struct FieldTree {
    type_name: String,
    fields: Vec<FieldDescriptor>,
}

/// Position of a nested object inside its field value.
enum Slot {
    Whole,
    Index(usize),
    Key(String),
}

impl Slot {
    fn path(&self, field_path: &str) -> String {
        match self {
            Slot::Whole => field_path.to_string(),
            Slot::Index(i) => format!("{}[{}]", field_path, i),
            Slot::Key(k) => format!("{}[{}]", field_path, k),
        }
    }

    fn lookup<'a>(&self, value: Option<&'a Value>) -> Option<&'a Value> {
        match self {
            Slot::Whole => value,
            Slot::Index(i) => value.and_then(|v| v.get(*i)),
            Slot::Key(k) => value.and_then(|v| v.get(k)),
        }
    }
}

fn nested_slots(shape: Shape, value: &Value) -> Vec<(Slot, &Map<String, Value>)> {
    match (shape, value) {
        (Shape::Struct | Shape::StructPtr, Value::Object(obj)) => vec![(Slot::Whole, obj)],
        (Shape::StructSlice | Shape::StructPtrSlice, Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_object().map(|obj| (Slot::Index(i), obj)))
            .collect(),
        (Shape::StructMap | Shape::StructPtrMap, Value::Object(entries)) => entries
            .iter()
            .filter_map(|(k, v)| v.as_object().map(|obj| (Slot::Key(k.clone()), obj)))
            .collect(),
        _ => Vec::new(),
    }
}

fn nested_slots_mut(shape: Shape, value: &mut Value) -> Vec<(Slot, &mut Map<String, Value>)> {
    match (shape, value) {
        (Shape::Struct | Shape::StructPtr, Value::Object(obj)) => vec![(Slot::Whole, obj)],
        (Shape::StructSlice | Shape::StructPtrSlice, Value::Array(items)) => items
            .iter_mut()
            .enumerate()
            .filter_map(|(i, v)| v.as_object_mut().map(|obj| (Slot::Index(i), obj)))
            .collect(),
        (Shape::StructMap | Shape::StructPtrMap, Value::Object(entries)) => entries
            .iter_mut()
            .filter_map(|(k, v)| v.as_object_mut().map(|obj| (Slot::Key(k.clone()), obj)))
            .collect(),
        _ => Vec::new(),
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn container_matches(shape: Shape, value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(_) => matches!(shape, Shape::Struct | Shape::StructPtr) || shape.is_map(),
        Value::Array(_) => shape.is_slice(),
        _ => false,
    }
}

fn as_object<'a>(raw: &'a Value, what: &str) -> Result<&'a Map<String, Value>, ValidationError> {
    raw.as_object()
        .ok_or_else(|| ValidationError::InvalidFormat(format!("{} must be a JSON object", what)))
}

impl FieldTree {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Checks required fields of the raw payload, recursing into every nested
    /// object that is present.
    pub fn check_required(&self, raw: &Value) -> Result<(), ValidationError> {
        self.check_required_in(as_object(raw, "payload")?, "")
    }

    fn check_required_in(&self, obj: &Map<String, Value>, prefix: &str) -> Result<(), ValidationError> {
        for field in &self.fields {
            let path = join(prefix, &field.name);
            let value = obj.get(&field.name);
            if field.required && field.is_missing(value) {
                return Err(ValidationError::MissingRequired { path });
            }

            let (Some(nested), Some(value)) = (&field.nested, value) else {
                continue;
            };
            if !container_matches(field.shape, value) {
                return Err(ValidationError::InvalidFormat(format!(
                    "field {} has type {}, expected {:?}",
                    path, value, field.shape
                )));
            }
            for (slot, child) in nested_slots(field.shape, value) {
                nested.check_required_in(child, &slot.path(&path))?;
            }
        }
        Ok(())
    }

    /// Writes declared defaults into `value` for every key the raw payload did
    /// not send. Nested objects are filled before their parent.
    pub fn fill_default_value(&self, value: &mut Value, raw: &Value) {
        if let Value::Object(obj) = value {
            self.fill_object(obj, raw.as_object());
        }
    }

    fn fill_object(&self, obj: &mut Map<String, Value>, raw: Option<&Map<String, Value>>) {
        for field in &self.fields {
            let Some(nested) = &field.nested else {
                continue;
            };
            let raw_child = raw.and_then(|r| r.get(&field.name));
            if let Some(child) = obj.get_mut(&field.name) {
                for (slot, child_obj) in nested_slots_mut(field.shape, child) {
                    let raw_elem = slot.lookup(raw_child).and_then(Value::as_object);
                    nested.fill_object(child_obj, raw_elem);
                }
            }
        }

        for field in &self.fields {
            let Some(default) = &field.default else {
                continue;
            };
            if !raw.is_some_and(|r| r.contains_key(&field.name)) {
                obj.insert(field.name.clone(), default.clone());
            }
        }
    }

    /// Typed form of [`FieldTree::fill_default_value`]; replaces `instance` in place.
    pub fn fill_default<T>(&self, instance: &mut T, raw: &Value) -> Result<(), ValidationError>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut value = serde_json::to_value(&*instance)
            .map_err(|e| ValidationError::InvalidFormat(e.to_string()))?;
        self.fill_default_value(&mut value, raw);
        *instance =
            serde_json::from_value(value).map_err(|e| ValidationError::InvalidFormat(e.to_string()))?;
        Ok(())
    }

    /// Runs the required checks on `raw`, then every validator against the typed
    /// `value`, failing on the first violation in field order.
    pub fn validate_value(&self, value: &Value, raw: &Value) -> Result<(), ValidationError> {
        self.check_required(raw)?;
        self.validate_object(as_object(value, "resource")?, "")
    }

    fn validate_object(&self, obj: &Map<String, Value>, prefix: &str) -> Result<(), ValidationError> {
        for field in &self.fields {
            let Some(value) = obj.get(&field.name) else {
                continue;
            };
            let path = join(prefix, &field.name);
            for validator in &field.validators {
                validator
                    .validate(value)
                    .map_err(|violation| ValidationError::Constraint {
                        path: path.clone(),
                        violation,
                    })?;
            }
            if let Some(nested) = &field.nested {
                for (slot, child) in nested_slots(field.shape, value) {
                    nested.validate_object(child, &slot.path(&path))?;
                }
            }
        }
        Ok(())
    }

    /// Typed form of [`FieldTree::validate_value`].
    pub fn validate<T: Serialize>(&self, instance: &T, raw: &Value) -> Result<(), ValidationError> {
        let value =
            serde_json::to_value(instance).map_err(|e| ValidationError::InvalidFormat(e.to_string()))?;
        self.validate_value(&value, raw)
    }
}

/// Builds field trees, caching them by type name.
///
/// A name maps to exactly one layout; a second descriptor reusing the name with
/// different members is rejected instead of sharing the first tree.
#[derive(Debug, Default)]
pub struct FieldTreeBuilder {
    cache: HashMap<String, CachedTree>,
    in_progress: HashMap<String, String>,
}

#[derive(Debug)]
struct CachedTree {
    layout: String,
    tree: Option<Arc<FieldTree>>,
}

impl FieldTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when nothing in the type's closure needs checking.
    pub fn build(&mut self, desc: &TypeDescriptor) -> Result<Option<Arc<FieldTree>>, SchemaError> {
        let layout = desc.layout();
        if let Some(cached) = self.cache.get(desc.name()) {
            if cached.layout != layout {
                return Err(SchemaError::DuplicateTypeName(desc.name().to_string()));
            }
            return Ok(cached.tree.clone());
        }
        if let Some(building) = self.in_progress.get(desc.name()) {
            return Err(if *building == layout {
                SchemaError::RecursiveType(desc.name().to_string())
            } else {
                SchemaError::DuplicateTypeName(desc.name().to_string())
            });
        }
        self.in_progress
            .insert(desc.name().to_string(), layout.clone());

        let mut fields = Vec::new();
        let result = self.collect(desc, desc.name(), &mut fields);
        self.in_progress.remove(desc.name());
        result?;

        let tree = if fields.iter().any(FieldDescriptor::is_constrained) {
            Some(Arc::new(FieldTree {
                type_name: desc.name().to_string(),
                fields,
            }))
        } else {
            None
        };
        debug!(ty = desc.name(), constrained = tree.is_some(), "Field tree built");
        self.cache.insert(
            desc.name().to_string(),
            CachedTree {
                layout,
                tree: tree.clone(),
            },
        );
        Ok(tree)
    }

    fn collect(
        &mut self,
        desc: &TypeDescriptor,
        owner: &str,
        out: &mut Vec<FieldDescriptor>,
    ) -> Result<(), SchemaError> {
        for member in desc.members() {
            match member {
                Member::Field(def) => {
                    let field = self.build_field(def)?;
                    if out.iter().any(|f| f.name == field.name) {
                        return Err(SchemaError::DuplicateField {
                            ty: owner.to_string(),
                            field: field.name,
                        });
                    }
                    out.push(field);
                }
                Member::Inline(embedded) => self.collect(embedded, owner, out)?,
            }
        }
        Ok(())
    }

    fn build_field(&mut self, def: &FieldDef) -> Result<FieldDescriptor, SchemaError> {
        let shape = inspect(&def.name, &def.ty)?;
        let tags = ConstraintTags::parse(&def.tags);
        let validators = validator::build(&def.name, &def.ty, &tags)?;
        let default = match &tags.default {
            Some(literal) => Some(parse_default(&def.name, shape, literal)?),
            None => None,
        };
        let nested = match nested_descriptor(&def.ty) {
            Some(inner) if shape.is_nested() => self.build(&inner)?,
            _ => None,
        };

        Ok(FieldDescriptor {
            name: def.name.clone(),
            shape,
            required: tags.required,
            default,
            nested,
            validators,
        })
    }
}

fn parse_default(field: &str, shape: Shape, literal: &str) -> Result<Value, SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidTag {
        field: field.to_string(),
        tag: format!("default={}", literal),
        reason,
    };
    match shape {
        Shape::Scalar(scalar) => parse_scalar(scalar, literal).map_err(invalid),
        Shape::ScalarSlice(scalar) => {
            if literal.is_empty() {
                return Ok(Value::Array(Vec::new()));
            }
            literal
                .split('|')
                .map(|item| parse_scalar(scalar, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
                .map_err(invalid)
        }
        other => Err(invalid(format!("defaults are not supported on {:?} fields", other))),
    }
}

fn parse_scalar(scalar: Scalar, literal: &str) -> Result<Value, String> {
    match scalar {
        Scalar::Bool => literal
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|e| e.to_string()),
        Scalar::Int => literal
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| e.to_string()),
        Scalar::Uint => literal
            .parse::<u64>()
            .map(Value::from)
            .map_err(|e| e.to_string()),
        Scalar::String | Scalar::StringLike => Ok(Value::String(literal.to_string())),
    }
}
