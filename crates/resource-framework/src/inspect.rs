//! Type inspector: classifies a declared [`FieldType`] into the closed set of
//! shapes the builder and validators understand.

use crate::describe::{FieldType, TypeDescriptor};
use crate::error::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Bool,
    Int,
    Uint,
    String,
    StringLike,
}

impl Scalar {
    pub fn is_string(&self) -> bool {
        matches!(self, Scalar::String | Scalar::StringLike)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Scalar::Int | Scalar::Uint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar(Scalar),
    Struct,
    StructPtr,
    ScalarSlice(Scalar),
    StructSlice,
    StructPtrSlice,
    ScalarMap(Scalar),
    StructMap,
    StructPtrMap,
}

impl Shape {
    /// True when values of this shape carry nested objects.
    pub fn is_nested(&self) -> bool {
        matches!(
            self,
            Shape::Struct
                | Shape::StructPtr
                | Shape::StructSlice
                | Shape::StructPtrSlice
                | Shape::StructMap
                | Shape::StructPtrMap
        )
    }

    /// The scalar a leaf rule applies to, looking through slices and maps.
    pub fn element_scalar(&self) -> Option<Scalar> {
        match self {
            Shape::Scalar(s) | Shape::ScalarSlice(s) | Shape::ScalarMap(s) => Some(*s),
            _ => None,
        }
    }

    pub fn is_slice(&self) -> bool {
        matches!(
            self,
            Shape::ScalarSlice(_) | Shape::StructSlice | Shape::StructPtrSlice
        )
    }

    pub fn is_map(&self) -> bool {
        matches!(
            self,
            Shape::ScalarMap(_) | Shape::StructMap | Shape::StructPtrMap
        )
    }
}

fn scalar_of(ty: &FieldType) -> Option<Scalar> {
    match ty {
        FieldType::Bool => Some(Scalar::Bool),
        FieldType::Int => Some(Scalar::Int),
        FieldType::Uint => Some(Scalar::Uint),
        FieldType::String => Some(Scalar::String),
        FieldType::StringLike(_) => Some(Scalar::StringLike),
        _ => None,
    }
}

fn is_struct(ty: &FieldType) -> bool {
    matches!(ty, FieldType::Struct(_))
}

fn is_struct_ptr(ty: &FieldType) -> bool {
    matches!(ty, FieldType::Ptr(inner) if is_struct(inner))
}

/// Classifies `ty`; `field` only names the field in the error.
pub fn inspect(field: &str, ty: &FieldType) -> Result<Shape, SchemaError> {
    if let Some(s) = scalar_of(ty) {
        return Ok(Shape::Scalar(s));
    }

    let shape = match ty {
        FieldType::Struct(_) => Some(Shape::Struct),
        FieldType::Ptr(inner) if is_struct(inner) => Some(Shape::StructPtr),
        FieldType::Slice(elem) => match scalar_of(elem) {
            Some(s) => Some(Shape::ScalarSlice(s)),
            None if is_struct(elem) => Some(Shape::StructSlice),
            None if is_struct_ptr(elem) => Some(Shape::StructPtrSlice),
            None => None,
        },
        FieldType::Map(key, value) if scalar_of(key).is_some_and(|k| k.is_string()) => {
            match scalar_of(value) {
                Some(s) => Some(Shape::ScalarMap(s)),
                None if is_struct(value) => Some(Shape::StructMap),
                None if is_struct_ptr(value) => Some(Shape::StructPtrMap),
                None => None,
            }
        }
        _ => None,
    };

    shape.ok_or_else(|| SchemaError::UnsupportedType {
        field: field.to_string(),
        ty: ty.to_string(),
    })
}

/// The struct description behind a nested shape, if any.
pub fn nested_descriptor(ty: &FieldType) -> Option<TypeDescriptor> {
    match ty {
        FieldType::Struct(describe) => Some(describe()),
        FieldType::Ptr(inner) | FieldType::Slice(inner) | FieldType::Map(_, inner) => {
            nested_descriptor(inner)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::Describe;

    struct MyStruct;

    impl Describe for MyStruct {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::new("MyStruct")
        }
    }

    fn shape(ty: FieldType) -> Shape {
        inspect("f", &ty).unwrap()
    }

    #[test]
    fn classifies_supported_shapes() {
        let my_struct = FieldType::struct_of::<MyStruct>;
        let my_flag = || FieldType::string_like("MyFlag");

        assert_eq!(shape(FieldType::Uint), Shape::Scalar(Scalar::Uint));
        assert_eq!(shape(FieldType::Int), Shape::Scalar(Scalar::Int));
        assert_eq!(shape(my_flag()), Shape::Scalar(Scalar::StringLike));
        assert_eq!(shape(my_struct()), Shape::Struct);
        assert_eq!(shape(FieldType::ptr(my_struct())), Shape::StructPtr);
        assert_eq!(
            shape(FieldType::slice(FieldType::Int)),
            Shape::ScalarSlice(Scalar::Int)
        );
        assert_eq!(
            shape(FieldType::slice(my_flag())),
            Shape::ScalarSlice(Scalar::StringLike)
        );
        assert_eq!(shape(FieldType::slice(my_struct())), Shape::StructSlice);
        assert_eq!(
            shape(FieldType::slice(FieldType::ptr(my_struct()))),
            Shape::StructPtrSlice
        );
        assert_eq!(
            shape(FieldType::string_map(FieldType::String)),
            Shape::ScalarMap(Scalar::String)
        );
        assert_eq!(shape(FieldType::string_map(my_struct())), Shape::StructMap);
        assert_eq!(
            shape(FieldType::string_map(FieldType::ptr(my_struct()))),
            Shape::StructPtrMap
        );
        assert_eq!(
            shape(FieldType::map(my_flag(), FieldType::Bool)),
            Shape::ScalarMap(Scalar::Bool)
        );
    }

    #[test]
    fn rejects_unsupported_shapes() {
        let unsupported = vec![
            FieldType::map(FieldType::Int, FieldType::String),
            FieldType::ptr(FieldType::String),
            FieldType::slice(FieldType::slice(FieldType::Int)),
            FieldType::string_map(FieldType::slice(FieldType::Int)),
            FieldType::ptr(FieldType::ptr(FieldType::struct_of::<MyStruct>())),
        ];
        for ty in unsupported {
            let err = inspect("f", &ty).unwrap_err();
            assert!(matches!(err, SchemaError::UnsupportedType { .. }), "{ty}");
        }
    }
}
