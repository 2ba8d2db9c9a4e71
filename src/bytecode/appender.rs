//! Method body appenders

use super::code::Code;
use super::StackManipulation;
use crate::common::Result;
use crate::description::MethodDescription;

/// Operand stack and local variable requirements of a method body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppenderSize {
    pub operand_stack_size: u16,
    pub local_variable_size: u16,
}

impl AppenderSize {
    pub fn new(operand_stack_size: u16, local_variable_size: u16) -> Self {
        Self { operand_stack_size, local_variable_size }
    }

    pub fn merge(self, other: AppenderSize) -> AppenderSize {
        AppenderSize {
            operand_stack_size: self.operand_stack_size.max(other.operand_stack_size),
            local_variable_size: self.local_variable_size.max(other.local_variable_size),
        }
    }
}

/// Writes the body of one method
#[derive(Debug, Clone, PartialEq)]
pub enum ByteCodeAppender {
    /// Manipulations applied in order; the body uses the method's own local variables only
    Simple(Vec<StackManipulation>),
    /// Appenders applied in order, each starting from an empty stack
    Compound(Vec<ByteCodeAppender>),
}

impl ByteCodeAppender {
    pub fn simple(manipulations: impl IntoIterator<Item = StackManipulation>) -> Self {
        ByteCodeAppender::Simple(manipulations.into_iter().collect())
    }

    pub fn apply(&self, code: &mut Code, method: &MethodDescription) -> Result<AppenderSize> {
        match self {
            ByteCodeAppender::Simple(manipulations) => {
                let size = StackManipulation::Compound(manipulations.clone()).apply(code)?;
                Ok(AppenderSize::new(size.maximal_size.max(0) as u16, method.stack_size()))
            }
            ByteCodeAppender::Compound(appenders) => {
                let mut total = AppenderSize::new(0, method.stack_size());
                for appender in appenders {
                    total = total.merge(appender.apply(code, method)?);
                }
                Ok(total)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{ConstantValue, Op};
    use crate::description::{Modifiers, TypeRef};

    #[test]
    fn test_simple_appender_reports_maximum_and_locals() {
        let method = MethodDescription::new("demo/Foo", "answer", Modifiers::PUBLIC, vec![TypeRef::long()], TypeRef::long());
        let appender = ByteCodeAppender::simple(vec![
            StackManipulation::Simple(Op::Push(ConstantValue::Long(42))),
            StackManipulation::Simple(Op::Return(TypeRef::long())),
        ]);
        let mut code = Code::new();
        let size = appender.apply(&mut code, &method).unwrap();
        assert_eq!(size, AppenderSize::new(2, 3));
        assert!(code.is_terminated());
    }
}
