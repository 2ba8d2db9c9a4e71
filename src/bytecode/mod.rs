//! Composable stack manipulations
//!
//! Method bodies are assembled from [`StackManipulation`]s. Each manipulation knows whether it
//! can be emitted at all and how it changes the operand stack, so a body's `max_stack` follows
//! from composing the sizes of its parts.

pub mod appender;
pub mod arithmetic;
pub mod assign;
pub mod code;
pub mod comparison;
pub mod constant;
pub mod duplication;
pub mod member;
pub mod op;
pub mod size;

use crate::common::{Error, Result};

pub use appender::{AppenderSize, ByteCodeAppender};
pub use code::Code;
pub use op::{ConstantValue, DupKind, FieldAccessKind, FieldRef, InvocationKind, MethodRef, Op, Relation};
pub use size::{Size, StackSize};

/// A unit of operand stack work
#[derive(Debug, Clone, PartialEq)]
pub enum StackManipulation {
    /// Does nothing
    Trivial,
    /// Cannot be emitted
    Illegal,
    /// A single instruction
    Simple(Op),
    /// Parts applied in order
    Compound(Vec<StackManipulation>),
}

impl StackManipulation {
    pub fn compound(parts: impl IntoIterator<Item = StackManipulation>) -> Self {
        StackManipulation::Compound(parts.into_iter().collect())
    }

    /// Sequence `next` after this manipulation
    pub fn and_then(self, next: StackManipulation) -> Self {
        match self {
            StackManipulation::Compound(mut parts) => {
                parts.push(next);
                StackManipulation::Compound(parts)
            }
            other => StackManipulation::Compound(vec![other, next]),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            StackManipulation::Trivial | StackManipulation::Simple(_) => true,
            StackManipulation::Illegal => false,
            StackManipulation::Compound(parts) => parts.iter().all(StackManipulation::is_valid),
        }
    }

    pub fn size(&self) -> Size {
        match self {
            StackManipulation::Trivial | StackManipulation::Illegal => Size::ZERO,
            StackManipulation::Simple(op) => op.size(),
            StackManipulation::Compound(parts) => {
                parts.iter().fold(Size::ZERO, |size, part| size.aggregate(part.size()))
            }
        }
    }

    /// Append the instructions to `code`; nothing is appended unless every part is valid
    pub fn apply(&self, code: &mut Code) -> Result<Size> {
        if !self.is_valid() {
            return Err(Error::illegal_manipulation(format!("cannot apply {:?}", self)));
        }
        self.append_to(code);
        Ok(self.size())
    }

    fn append_to(&self, code: &mut Code) {
        match self {
            StackManipulation::Trivial | StackManipulation::Illegal => {}
            StackManipulation::Simple(op) => code.push(op.clone()),
            StackManipulation::Compound(parts) => parts.iter().for_each(|part| part.append_to(code)),
        }
    }
}

impl From<Op> for StackManipulation {
    fn from(op: Op) -> Self {
        StackManipulation::Simple(op)
    }
}

/// `athrow`
pub fn throw() -> StackManipulation {
    StackManipulation::Simple(Op::Throw)
}

/// Remove a value of the given size from the stack
pub fn removal(size: StackSize) -> StackManipulation {
    match size {
        StackSize::Zero => StackManipulation::Trivial,
        other => StackManipulation::Simple(Op::Pop(other)),
    }
}

/// `new` of a class; invalid for abstract types, interfaces and arrays
pub fn type_creation(description: &crate::description::TypeDescription) -> StackManipulation {
    if description.is_abstract() || description.is_interface() {
        StackManipulation::Illegal
    } else {
        StackManipulation::Simple(Op::New(description.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_int() -> StackManipulation {
        StackManipulation::Simple(Op::Push(ConstantValue::Int(3)))
    }

    #[test]
    fn test_compound_validity_requires_all_parts() {
        let parts = [StackManipulation::Trivial, StackManipulation::Illegal, push_int()];
        for mask in 0u8..8 {
            let chosen: Vec<StackManipulation> = parts
                .iter()
                .enumerate()
                .filter(|(index, _)| mask & (1 << index) != 0)
                .map(|(_, part)| part.clone())
                .collect();
            let expected = chosen.iter().all(StackManipulation::is_valid);
            assert_eq!(StackManipulation::compound(chosen).is_valid(), expected);
        }
    }

    #[test]
    fn test_invalid_manipulation_appends_nothing() {
        let mut code = Code::new();
        let manipulation = StackManipulation::compound(vec![push_int(), StackManipulation::Illegal]);
        assert!(matches!(manipulation.apply(&mut code), Err(Error::IllegalStackManipulation { .. })));
        assert!(code.is_empty());
    }

    #[test]
    fn test_compound_size_is_grouping_independent() {
        let a = push_int();
        let b = StackManipulation::Simple(Op::Push(ConstantValue::Long(9)));
        let c = removal(StackSize::Double);
        let flat = StackManipulation::compound(vec![a.clone(), b.clone(), c.clone()]);
        let left = StackManipulation::compound(vec![StackManipulation::compound(vec![a.clone(), b.clone()]), c.clone()]);
        let right = StackManipulation::compound(vec![a, StackManipulation::compound(vec![b, c])]);
        assert_eq!(flat.size(), Size::new(1, 3));
        assert_eq!(left.size(), flat.size());
        assert_eq!(right.size(), flat.size());
    }

    #[test]
    fn test_apply_flattens_into_code() {
        let mut code = Code::new();
        let size = push_int().and_then(removal(StackSize::Single)).apply(&mut code).unwrap();
        assert_eq!(size, Size::new(0, 1));
        assert_eq!(code.ops().len(), 2);
    }
}
