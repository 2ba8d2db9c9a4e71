//! Low-level instructions produced by stack manipulations
//!
//! An [`Op`] is a symbolic instruction: owners, names and types are kept as values and only
//! turned into constant pool indices by the class file writer.

use std::fmt;

use super::size::{Size, StackSize};
use crate::description::{method_descriptor, MethodDescription, PrimitiveType, TypeRef};

/// A constant pushed onto the operand stack
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Null,
    Text(String),
    /// A `java.lang.Class` literal
    Type(TypeRef),
}

impl ConstantValue {
    pub fn stack_size(&self) -> StackSize {
        match self {
            ConstantValue::Long(_) | ConstantValue::Double(_) => StackSize::Double,
            _ => StackSize::Single,
        }
    }
}

/// A field by owner, name and type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub owner: String,
    pub name: String,
    pub field_type: TypeRef,
}

/// A method by owner and erased signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub parameters: Vec<TypeRef>,
    pub return_type: TypeRef,
    /// Whether `owner` is an interface
    pub interface: bool,
}

impl MethodRef {
    pub fn of(method: &MethodDescription) -> Self {
        Self {
            owner: method.declaring_type.clone(),
            name: method.name.clone(),
            parameters: method.parameters.clone(),
            return_type: method.return_type.clone(),
            interface: method.declared_by_interface,
        }
    }

    /// The same method looked up from another owner
    pub fn on(mut self, owner: impl Into<String>, interface: bool) -> Self {
        self.owner = owner.into();
        self.interface = interface;
        self
    }

    pub fn descriptor(&self) -> String {
        method_descriptor(&self.parameters, &self.return_type)
    }

    pub fn parameter_size(&self) -> u16 {
        self.parameters.iter().map(|p| p.stack_size().size()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationKind {
    Static,
    Virtual,
    Interface,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldAccessKind {
    GetStatic,
    PutStatic,
    GetField,
    PutField,
}

/// Stack duplication instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DupKind {
    Dup,
    DupX1,
    DupX2,
    Dup2,
    Dup2X1,
    Dup2X2,
}

impl DupKind {
    /// Words copied and words the copy is placed beneath
    pub fn shape(self) -> (u16, u16) {
        match self {
            DupKind::Dup => (1, 0),
            DupKind::DupX1 => (1, 1),
            DupKind::DupX2 => (1, 2),
            DupKind::Dup2 => (2, 0),
            DupKind::Dup2X1 => (2, 1),
            DupKind::Dup2X2 => (2, 2),
        }
    }
}

/// Relational operators of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Relation {
    pub const ALL: [Relation; 6] = [
        Relation::Equal,
        Relation::NotEqual,
        Relation::Less,
        Relation::LessOrEqual,
        Relation::Greater,
        Relation::GreaterOrEqual,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Push(ConstantValue),
    Load { value_type: TypeRef, slot: u16 },
    Store { value_type: TypeRef, slot: u16 },
    Field { kind: FieldAccessKind, field: FieldRef },
    Invoke { kind: InvocationKind, method: MethodRef },
    New(String),
    Dup(DupKind),
    Pop(StackSize),
    CheckCast(TypeRef),
    /// Binary arithmetic on two operands of `operand_type`
    Arithmetic { opcode: u8, operand_type: PrimitiveType },
    /// Primitive conversion
    Convert { opcode: u8, from: PrimitiveType, to: PrimitiveType },
    /// Compare two operands and push `1` or `0`
    Compare { operand_type: PrimitiveType, relation: Relation },
    Return(TypeRef),
    Throw,
}

impl Op {
    pub fn size(&self) -> Size {
        match self {
            Op::Push(value) => value.stack_size().to_increasing_size(),
            Op::Load { value_type, .. } => value_type.stack_size().to_increasing_size(),
            Op::Store { value_type, .. } => value_type.stack_size().to_decreasing_size(),
            Op::Field { kind, field } => {
                let words = field.field_type.stack_size().size() as i32;
                match kind {
                    FieldAccessKind::GetStatic => Size::new(words, words),
                    FieldAccessKind::PutStatic => Size::new(-words, 0),
                    FieldAccessKind::GetField => Size::new(words - 1, (words - 1).max(0)),
                    FieldAccessKind::PutField => Size::new(-(words + 1), 0),
                }
            }
            Op::Invoke { kind, method } => {
                let receiver = if *kind == InvocationKind::Static { 0 } else { 1 };
                let impact = method.return_type.stack_size().size() as i32 - (method.parameter_size() as i32 + receiver);
                Size::new(impact, impact.max(0))
            }
            Op::New(_) => StackSize::Single.to_increasing_size(),
            Op::Dup(kind) => {
                let (copied, _) = kind.shape();
                Size::new(copied as i32, copied as i32)
            }
            Op::Pop(size) => size.to_decreasing_size(),
            Op::CheckCast(_) => Size::ZERO,
            Op::Arithmetic { operand_type, .. } => operand_type.stack_size().to_decreasing_size(),
            Op::Convert { from, to, .. } => {
                let impact = to.stack_size().size() as i32 - from.stack_size().size() as i32;
                Size::new(impact, impact.max(0))
            }
            Op::Compare { operand_type, .. } => {
                Size::new(1 - 2 * operand_type.stack_size().size() as i32, 0)
            }
            Op::Return(value_type) => value_type.stack_size().to_decreasing_size(),
            Op::Throw => StackSize::Single.to_decreasing_size(),
        }
    }

    /// Control does not continue to the next instruction
    pub fn is_terminal(&self) -> bool {
        matches!(self, Op::Return(_) | Op::Throw)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Push(value) => write!(f, "push {:?}", value),
            Op::Load { value_type, slot } => write!(f, "load {} {}", value_type, slot),
            Op::Store { value_type, slot } => write!(f, "store {} {}", value_type, slot),
            Op::Field { kind, field } => write!(f, "{:?} {}.{}", kind, field.owner, field.name),
            Op::Invoke { kind, method } => write!(f, "invoke {:?} {}.{}{}", kind, method.owner, method.name, method.descriptor()),
            Op::New(name) => write!(f, "new {}", name),
            Op::Dup(kind) => write!(f, "{:?}", kind),
            Op::Pop(size) => write!(f, "pop {}", size.size()),
            Op::CheckCast(target) => write!(f, "checkcast {}", target),
            Op::Arithmetic { opcode, operand_type } => write!(f, "arithmetic 0x{:02x} {}", opcode, operand_type.name()),
            Op::Convert { from, to, .. } => write!(f, "convert {} to {}", from.name(), to.name()),
            Op::Compare { operand_type, relation } => write!(f, "compare {} {:?}", operand_type.name(), relation),
            Op::Return(value_type) => write!(f, "return {}", value_type),
            Op::Throw => write!(f, "throw"),
        }
    }
}
