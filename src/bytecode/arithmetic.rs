//! Arithmetic and primitive widening

use super::op::Op;
use super::StackManipulation;
use crate::classfile::opcodes::*;
use crate::description::PrimitiveType;

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arithmetic {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Remainder,
}

impl Arithmetic {
    // [int, long, float, double]
    fn opcodes(self) -> [u8; 4] {
        match self {
            Arithmetic::Addition => [IADD, LADD, FADD, DADD],
            Arithmetic::Subtraction => [ISUB, LSUB, FSUB, DSUB],
            Arithmetic::Multiplication => [IMUL, LMUL, FMUL, DMUL],
            Arithmetic::Division => [IDIV, LDIV, FDIV, DDIV],
            Arithmetic::Remainder => [IREM, LREM, FREM, DREM],
        }
    }

    /// The operator over two operands of `operand_type`; `boolean` and `void` have no arithmetic
    pub fn of(self, operand_type: PrimitiveType) -> StackManipulation {
        let index = match operand_type {
            PrimitiveType::Boolean | PrimitiveType::Void => return StackManipulation::Illegal,
            PrimitiveType::Long => 1,
            PrimitiveType::Float => 2,
            PrimitiveType::Double => 3,
            _ => 0,
        };
        let operand_type = if index == 0 { PrimitiveType::Int } else { operand_type };
        StackManipulation::Simple(Op::Arithmetic { opcode: self.opcodes()[index], operand_type })
    }
}

/// Widening primitive conversions
pub struct PrimitiveWidening;

impl PrimitiveWidening {
    /// Convert a value of `from` to `to`; narrowing or unrelated conversions are illegal
    pub fn of(from: PrimitiveType, to: PrimitiveType) -> StackManipulation {
        use PrimitiveType::*;
        if from == to {
            return StackManipulation::Trivial;
        }
        let opcode = match (from, to) {
            (Byte, Short) | (Byte | Short | Char, Int) => return StackManipulation::Trivial,
            (Byte | Short | Char | Int, Long) => I2L,
            (Byte | Short | Char | Int, Float) => I2F,
            (Byte | Short | Char | Int, Double) => I2D,
            (Long, Float) => L2F,
            (Long, Double) => L2D,
            (Float, Double) => F2D,
            _ => return StackManipulation::Illegal,
        };
        let from = if from.is_int_like() { Int } else { from };
        StackManipulation::Simple(Op::Convert { opcode, from, to })
    }
}
