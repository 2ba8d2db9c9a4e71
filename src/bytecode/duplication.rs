//! Duplication of the top stack value

use super::op::{DupKind, Op};
use super::size::StackSize;
use super::StackManipulation;
use crate::description::TypeRef;

/// Duplicates a value of the given width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Duplication {
    Zero,
    Single,
    Double,
}

impl Duplication {
    pub fn of(type_ref: &TypeRef) -> Duplication {
        match type_ref.stack_size() {
            StackSize::Zero => Duplication::Zero,
            StackSize::Single => Duplication::Single,
            StackSize::Double => Duplication::Double,
        }
    }

    /// Copy the top value in place
    pub fn duplicate(self) -> StackManipulation {
        match self {
            Duplication::Zero => StackManipulation::Trivial,
            Duplication::Single => StackManipulation::Simple(Op::Dup(DupKind::Dup)),
            Duplication::Double => StackManipulation::Simple(Op::Dup(DupKind::Dup2)),
        }
    }

    /// Copy the top value beneath the value of size `under` that lies below it
    pub fn flip_over(self, under: StackSize) -> StackManipulation {
        let kind = match (self, under) {
            (Duplication::Zero, _) | (_, StackSize::Zero) => return StackManipulation::Illegal,
            (Duplication::Single, StackSize::Single) => DupKind::DupX1,
            (Duplication::Single, StackSize::Double) => DupKind::DupX2,
            (Duplication::Double, StackSize::Single) => DupKind::Dup2X1,
            (Duplication::Double, StackSize::Double) => DupKind::Dup2X2,
        };
        StackManipulation::Simple(Op::Dup(kind))
    }

    pub fn flip_over_type(self, under: &TypeRef) -> StackManipulation {
        self.flip_over(under.stack_size())
    }
}
