//! Conversions between the type on the stack and the type a consumer expects

use super::arithmetic::PrimitiveWidening;
use super::constant::DefaultValue;
use super::op::{InvocationKind, MethodRef, Op};
use super::{removal, StackManipulation};
use crate::consts::OBJECT;
use crate::description::{PrimitiveType, TypeRef};
use crate::pool::TypeHierarchy;

/// Whether an assignment may insert a runtime cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Typing {
    #[default]
    Static,
    Dynamic,
}

/// Assigns values between types by widening, casting, boxing and unboxing
#[derive(Debug, Clone, Copy, Default)]
pub struct Assigner<'a> {
    hierarchy: Option<&'a TypeHierarchy>,
}

impl<'a> Assigner<'a> {
    pub fn new() -> Self {
        Self { hierarchy: None }
    }

    /// Decide reference widening from the given hierarchy
    pub fn with_hierarchy(hierarchy: &'a TypeHierarchy) -> Self {
        Self { hierarchy: Some(hierarchy) }
    }

    pub fn assign(&self, source: &TypeRef, target: &TypeRef, typing: Typing) -> StackManipulation {
        match (source, target) {
            (TypeRef::Primitive(PrimitiveType::Void), TypeRef::Primitive(PrimitiveType::Void)) => {
                StackManipulation::Trivial
            }
            (TypeRef::Primitive(PrimitiveType::Void), _) => DefaultValue::of(target),
            (_, TypeRef::Primitive(PrimitiveType::Void)) => removal(source.stack_size()),
            (TypeRef::Primitive(from), TypeRef::Primitive(to)) => PrimitiveWidening::of(*from, *to),
            (TypeRef::Primitive(from), _) => {
                let wrapper = TypeRef::object(from.wrapper());
                Self::boxing(*from).and_then(self.assign_reference(&wrapper, target, typing))
            }
            (_, TypeRef::Primitive(to)) => self.unboxing(source, *to, typing),
            _ => self.assign_reference(source, target, typing),
        }
    }

    fn assign_reference(&self, source: &TypeRef, target: &TypeRef, typing: Typing) -> StackManipulation {
        if self.is_assignable(source, target) {
            StackManipulation::Trivial
        } else if typing == Typing::Dynamic {
            StackManipulation::Simple(Op::CheckCast(target.clone()))
        } else {
            StackManipulation::Illegal
        }
    }

    fn is_assignable(&self, source: &TypeRef, target: &TypeRef) -> bool {
        match (source, target) {
            _ if source == target => true,
            (_, TypeRef::Reference(name)) if name == OBJECT => true,
            (TypeRef::Array(source), TypeRef::Array(target)) => {
                source.is_reference() && target.is_reference() && self.is_assignable(source, target)
            }
            (TypeRef::Reference(source), TypeRef::Reference(target)) => self
                .hierarchy
                .map(|hierarchy| hierarchy.is_assignable_from(target, source))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// `Wrapper.valueOf(primitive)`
    pub fn boxing(primitive: PrimitiveType) -> StackManipulation {
        if primitive == PrimitiveType::Void {
            return StackManipulation::Illegal;
        }
        StackManipulation::Simple(Op::Invoke {
            kind: InvocationKind::Static,
            method: MethodRef {
                owner: primitive.wrapper().to_string(),
                name: "valueOf".to_string(),
                parameters: vec![TypeRef::primitive(primitive)],
                return_type: TypeRef::object(primitive.wrapper()),
                interface: false,
            },
        })
    }

    fn unboxing(&self, source: &TypeRef, target: PrimitiveType, typing: Typing) -> StackManipulation {
        let boxed = match source {
            TypeRef::Reference(name) => PrimitiveType::for_wrapper(name),
            _ => None,
        };
        match boxed {
            Some(primitive) => Self::unbox(primitive).and_then(PrimitiveWidening::of(primitive, target)),
            None if typing == Typing::Dynamic => {
                StackManipulation::Simple(Op::CheckCast(TypeRef::object(target.wrapper()))).and_then(Self::unbox(target))
            }
            None => StackManipulation::Illegal,
        }
    }

    fn unbox(primitive: PrimitiveType) -> StackManipulation {
        if primitive == PrimitiveType::Void {
            return StackManipulation::Illegal;
        }
        StackManipulation::Simple(Op::Invoke {
            kind: InvocationKind::Virtual,
            method: MethodRef {
                owner: primitive.wrapper().to_string(),
                name: primitive.unboxing_method().to_string(),
                parameters: Vec::new(),
                return_type: TypeRef::primitive(primitive),
                interface: false,
            },
        })
    }
}
