//! StackMapTable frames and the symbolic value types tracked while writing code

use super::constpool::ConstantPool;
use super::error::ConstPoolResult;

/// A verifier value type whose class references are still names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameType {
    Top,
    Integer,
    Float,
    Long,
    Double,
    Null,
    UninitializedThis,
    Object(String),
    /// Result of a `new` at the given code offset
    Uninitialized(u16),
}

impl FrameType {
    /// Number of local variable or operand stack slots the value occupies
    pub fn width(&self) -> u16 {
        match self {
            FrameType::Long | FrameType::Double => 2,
            _ => 1,
        }
    }

    pub fn resolve(&self, pool: &mut ConstantPool) -> ConstPoolResult<VerificationType> {
        Ok(match self {
            FrameType::Top => VerificationType::Top,
            FrameType::Integer => VerificationType::Integer,
            FrameType::Float => VerificationType::Float,
            FrameType::Long => VerificationType::Long,
            FrameType::Double => VerificationType::Double,
            FrameType::Null => VerificationType::Null,
            FrameType::UninitializedThis => VerificationType::UninitializedThis,
            FrameType::Object(name) => VerificationType::Object(pool.add_class(name)?),
            FrameType::Uninitialized(offset) => VerificationType::Uninitialized(*offset),
        })
    }
}

/// VerificationTypeInfo as defined in JVMS 4.7.4
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,
    UninitializedThis,
    Object(u16),        // cpool index to CONSTANT_Class
    Uninitialized(u16), // offset
}

impl VerificationType {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            VerificationType::Top => vec![0],
            VerificationType::Integer => vec![1],
            VerificationType::Float => vec![2],
            VerificationType::Double => vec![3],
            VerificationType::Long => vec![4],
            VerificationType::Null => vec![5],
            VerificationType::UninitializedThis => vec![6],
            VerificationType::Object(cp_index) => {
                let mut bytes = vec![7];
                bytes.extend_from_slice(&cp_index.to_be_bytes());
                bytes
            }
            VerificationType::Uninitialized(offset) => {
                let mut bytes = vec![8];
                bytes.extend_from_slice(&offset.to_be_bytes());
                bytes
            }
        }
    }
}

/// StackMapFrame variants written by the code writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackMapFrame {
    Same { offset_delta: u16 },
    SameLocals1StackItem { offset_delta: u16, stack: VerificationType },
    Full { offset_delta: u16, locals: Vec<VerificationType>, stack: Vec<VerificationType> },
}

impl StackMapFrame {
    pub fn offset_delta(&self) -> u16 {
        match self {
            StackMapFrame::Same { offset_delta }
            | StackMapFrame::SameLocals1StackItem { offset_delta, .. }
            | StackMapFrame::Full { offset_delta, .. } => *offset_delta,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        match self {
            StackMapFrame::Same { offset_delta } => {
                if *offset_delta <= 63 {
                    bytes.push(*offset_delta as u8);
                } else {
                    bytes.push(251); // same_frame_extended
                    bytes.extend_from_slice(&offset_delta.to_be_bytes());
                }
            }
            StackMapFrame::SameLocals1StackItem { offset_delta, stack } => {
                if *offset_delta <= 63 {
                    bytes.push(64 + *offset_delta as u8);
                } else {
                    bytes.push(247); // same_locals_1_stack_item_frame_extended
                    bytes.extend_from_slice(&offset_delta.to_be_bytes());
                }
                bytes.extend_from_slice(&stack.to_bytes());
            }
            StackMapFrame::Full { offset_delta, locals, stack } => {
                bytes.push(255);
                bytes.extend_from_slice(&offset_delta.to_be_bytes());
                bytes.extend_from_slice(&(locals.len() as u16).to_be_bytes());
                for local in locals {
                    bytes.extend_from_slice(&local.to_bytes());
                }
                bytes.extend_from_slice(&(stack.len() as u16).to_be_bytes());
                for item in stack {
                    bytes.extend_from_slice(&item.to_bytes());
                }
            }
        }
        bytes
    }
}

/// A recorded frame at an absolute code offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSnapshot {
    pub offset: u16,
    pub locals: Vec<FrameType>,
    pub stack: Vec<FrameType>,
}

#[derive(Debug, Default, Clone)]
pub struct StackMapTable {
    pub frames: Vec<StackMapFrame>,
}

impl StackMapTable {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Compress snapshots into delta-encoded frames relative to the initial locals
    pub fn from_snapshots(
        initial_locals: &[FrameType],
        snapshots: &[FrameSnapshot],
        pool: &mut ConstantPool,
    ) -> ConstPoolResult<Self> {
        let mut frames = Vec::with_capacity(snapshots.len());
        let mut previous_locals = compact_locals(initial_locals);
        let mut previous_offset: Option<u16> = None;
        for snapshot in snapshots {
            let offset_delta = match previous_offset {
                None => snapshot.offset,
                Some(previous) => snapshot.offset.saturating_sub(previous).saturating_sub(1),
            };
            let locals = compact_locals(&snapshot.locals);
            let frame = if locals == previous_locals && snapshot.stack.is_empty() {
                StackMapFrame::Same { offset_delta }
            } else if locals == previous_locals && snapshot.stack.len() == 1 {
                StackMapFrame::SameLocals1StackItem { offset_delta, stack: snapshot.stack[0].resolve(pool)? }
            } else {
                StackMapFrame::Full {
                    offset_delta,
                    locals: locals.iter().map(|l| l.resolve(pool)).collect::<ConstPoolResult<_>>()?,
                    stack: snapshot.stack.iter().map(|s| s.resolve(pool)).collect::<ConstPoolResult<_>>()?,
                }
            };
            frames.push(frame);
            previous_locals = locals;
            previous_offset = Some(snapshot.offset);
        }
        Ok(Self { frames })
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.frames.len() as u16).to_be_bytes());
        for frame in &self.frames {
            bytes.extend_from_slice(&frame.to_bytes());
        }
        bytes
    }
}

/// Frame locals list one entry per value, so the slot following a long or double is dropped,
/// as are trailing unused slots
fn compact_locals(slots: &[FrameType]) -> Vec<FrameType> {
    let mut compact = Vec::with_capacity(slots.len());
    let mut index = 0;
    while index < slots.len() {
        let value = slots[index].clone();
        index += value.width() as usize;
        compact.push(value);
    }
    while compact.last() == Some(&FrameType::Top) {
        compact.pop();
    }
    compact
}
