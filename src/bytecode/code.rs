//! The instruction sink a method body is assembled into

use std::fmt;

use super::op::Op;

/// Ordered instructions of one method body
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Code {
    ops: Vec<Op>,
}

impl Code {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Whether control cannot fall off the end of the body
    pub fn is_terminated(&self) -> bool {
        self.ops.last().map(Op::is_terminal).unwrap_or(false)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, op) in self.ops.iter().enumerate() {
            writeln!(f, "{:>4}: {}", index, op)?;
        }
        Ok(())
    }
}
