//! Relational comparisons producing a boolean
//!
//! A comparison lowers to an optional compare instruction followed by a conditional jump to a
//! branch pushing `1`, with the fall-through pushing `0`; both paths join after the push.

use super::op::{Op, Relation};
use super::StackManipulation;
use crate::classfile::opcodes::*;
use crate::description::PrimitiveType;

pub struct Comparison;

impl Comparison {
    /// Compare two operands of `operand_type`; only numeric types can be compared
    pub fn of(operand_type: PrimitiveType, relation: Relation) -> StackManipulation {
        match operand_type {
            PrimitiveType::Boolean | PrimitiveType::Void => StackManipulation::Illegal,
            other => {
                let operand_type = if other.is_int_like() { PrimitiveType::Int } else { other };
                StackManipulation::Simple(Op::Compare { operand_type, relation })
            }
        }
    }
}

impl Relation {
    /// `if_icmpXX` jumping when the relation holds
    pub fn int_branch(self) -> u8 {
        match self {
            Relation::Equal => IF_ICMPEQ,
            Relation::NotEqual => IF_ICMPNE,
            Relation::Less => IF_ICMPLT,
            Relation::LessOrEqual => IF_ICMPLE,
            Relation::Greater => IF_ICMPGT,
            Relation::GreaterOrEqual => IF_ICMPGE,
        }
    }

    /// `ifXX` against the result of a compare instruction
    pub fn zero_branch(self) -> u8 {
        match self {
            Relation::Equal => IFEQ,
            Relation::NotEqual => IFNE,
            Relation::Less => IFLT,
            Relation::LessOrEqual => IFLE,
            Relation::Greater => IFGT,
            Relation::GreaterOrEqual => IFGE,
        }
    }

    /// Compare instruction for wide or floating operands; the `g` variants make NaN fail `<` and `<=`
    pub fn compare_opcode(self, operand_type: PrimitiveType) -> Option<u8> {
        let lower = matches!(self, Relation::Less | Relation::LessOrEqual);
        match operand_type {
            PrimitiveType::Long => Some(LCMP),
            PrimitiveType::Float => Some(if lower { FCMPG } else { FCMPL }),
            PrimitiveType::Double => Some(if lower { DCMPG } else { DCMPL }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Size;

    #[test]
    fn test_sizes_per_operand_type() {
        for relation in Relation::ALL {
            assert_eq!(Comparison::of(PrimitiveType::Int, relation).size(), Size::new(-1, 0));
            assert_eq!(Comparison::of(PrimitiveType::Float, relation).size(), Size::new(-1, 0));
            assert_eq!(Comparison::of(PrimitiveType::Long, relation).size(), Size::new(-3, 0));
            assert_eq!(Comparison::of(PrimitiveType::Double, relation).size(), Size::new(-3, 0));
        }
    }

    #[test]
    fn test_non_numeric_comparison_is_illegal() {
        assert!(!Comparison::of(PrimitiveType::Boolean, Relation::Equal).is_valid());
        assert!(!Comparison::of(PrimitiveType::Void, Relation::Less).is_valid());
    }

    #[test]
    fn test_nan_sensitive_compare_opcodes() {
        assert_eq!(Relation::Less.compare_opcode(PrimitiveType::Float), Some(FCMPG));
        assert_eq!(Relation::Greater.compare_opcode(PrimitiveType::Double), Some(DCMPL));
        assert_eq!(Relation::Equal.compare_opcode(PrimitiveType::Long), Some(LCMP));
        assert_eq!(Relation::Equal.compare_opcode(PrimitiveType::Int), None);
    }
}
