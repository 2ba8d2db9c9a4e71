//! Constant pushes

use super::op::{ConstantValue, FieldAccessKind, FieldRef, Op};
use super::StackManipulation;
use crate::consts::CLASS;
use crate::description::{PrimitiveType, TypeRef};

fn push(value: ConstantValue) -> StackManipulation {
    StackManipulation::Simple(Op::Push(value))
}

pub struct IntegerConstant;

impl IntegerConstant {
    pub fn for_value(value: i32) -> StackManipulation {
        push(ConstantValue::Int(value))
    }

    pub fn for_boolean(value: bool) -> StackManipulation {
        push(ConstantValue::Int(value as i32))
    }
}

pub struct LongConstant;

impl LongConstant {
    pub fn for_value(value: i64) -> StackManipulation {
        push(ConstantValue::Long(value))
    }
}

pub struct FloatConstant;

impl FloatConstant {
    pub fn for_value(value: f32) -> StackManipulation {
        push(ConstantValue::Float(value))
    }
}

pub struct DoubleConstant;

impl DoubleConstant {
    pub fn for_value(value: f64) -> StackManipulation {
        push(ConstantValue::Double(value))
    }
}

pub struct NullConstant;

impl NullConstant {
    pub fn new() -> StackManipulation {
        push(ConstantValue::Null)
    }
}

pub struct TextConstant;

impl TextConstant {
    pub fn new(text: impl Into<String>) -> StackManipulation {
        push(ConstantValue::Text(text.into()))
    }
}

/// A `Class` literal; primitives are loaded from the `TYPE` field of their wrapper
pub struct ClassConstant;

impl ClassConstant {
    pub fn of(type_ref: &TypeRef) -> StackManipulation {
        match type_ref.as_primitive() {
            Some(primitive) => StackManipulation::Simple(Op::Field {
                kind: FieldAccessKind::GetStatic,
                field: FieldRef {
                    owner: primitive.wrapper().to_string(),
                    name: "TYPE".to_string(),
                    field_type: TypeRef::object(CLASS),
                },
            }),
            None => push(ConstantValue::Type(type_ref.clone())),
        }
    }
}

// Indexed by `PrimitiveType as usize`, `None` for void
const DEFAULT_VALUES: [Option<ConstantValue>; 9] = [
    Some(ConstantValue::Int(0)),
    Some(ConstantValue::Int(0)),
    Some(ConstantValue::Int(0)),
    Some(ConstantValue::Int(0)),
    Some(ConstantValue::Int(0)),
    Some(ConstantValue::Long(0)),
    Some(ConstantValue::Float(0.0)),
    Some(ConstantValue::Double(0.0)),
    None,
];

/// The zero value of a type
pub struct DefaultValue;

impl DefaultValue {
    pub fn of(type_ref: &TypeRef) -> StackManipulation {
        match type_ref.as_primitive() {
            Some(primitive) => Self::of_primitive(primitive),
            None => NullConstant::new(),
        }
    }

    fn of_primitive(primitive: PrimitiveType) -> StackManipulation {
        match &DEFAULT_VALUES[primitive as usize] {
            Some(value) => push(value.clone()),
            None => StackManipulation::Trivial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Size;

    #[test]
    fn test_default_values_by_kind() {
        assert_eq!(DefaultValue::of(&TypeRef::void()), StackManipulation::Trivial);
        assert_eq!(DefaultValue::of(&TypeRef::long()).size(), Size::new(2, 2));
        assert_eq!(DefaultValue::of(&TypeRef::boolean()), IntegerConstant::for_value(0));
        assert_eq!(DefaultValue::of(&TypeRef::object("java.lang.String")), NullConstant::new());
        assert_eq!(
            DefaultValue::of(&TypeRef::primitive(PrimitiveType::Double)),
            DoubleConstant::for_value(0.0)
        );
    }

    #[test]
    fn test_primitive_class_constant_reads_wrapper_type_field() {
        let manipulation = ClassConstant::of(&TypeRef::int());
        match manipulation {
            StackManipulation::Simple(Op::Field { field, .. }) => assert_eq!(field.owner, "java/lang/Integer"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
