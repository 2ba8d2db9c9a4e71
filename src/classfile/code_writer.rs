//! Lowering of symbolic instructions into a `Code` attribute body
//!
//! The writer tracks the verifier type of every operand stack entry and local variable while
//! it emits, so that branch targets can be described by `StackMapTable` frames and the
//! operand stack depth can be checked against the size computed by the manipulations.

use std::collections::HashMap;

use super::constpool::ConstantPool;
use super::error::{BytecodeError, BytecodeResult};
use super::frame::{FrameSnapshot, FrameType};
use super::opcodes::*;
use crate::bytecode::op::{ConstantValue, DupKind, FieldAccessKind, InvocationKind, MethodRef, Op, Relation};
use crate::bytecode::StackSize;
use crate::consts::{CLASS, CONSTRUCTOR_NAME, STRING};
use crate::description::{MethodDescription, PrimitiveType, TypeRef};

const MAX_CODE_LENGTH: usize = 65535;

/// Operand stack and local variable types at the current instruction
#[derive(Debug, Clone, Default)]
pub struct State {
    pub stack: Vec<FrameType>,
    pub locals: Vec<FrameType>,
    pub stacksize: u16,
    pub max_stacksize: u16,
}

impl State {
    pub fn push(&mut self, value: FrameType) {
        self.stacksize += value.width();
        self.max_stacksize = self.max_stacksize.max(self.stacksize);
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> BytecodeResult<FrameType> {
        let value = self.stack.pop().ok_or(BytecodeError::StackUnderflow)?;
        self.stacksize -= value.width();
        Ok(value)
    }

    /// Pop values covering exactly `words` stack words, returned bottom first
    pub fn pop_words(&mut self, words: u16) -> BytecodeResult<Vec<FrameType>> {
        let mut popped = Vec::new();
        let mut remaining = words;
        while remaining > 0 {
            let value = self.pop()?;
            if value.width() > remaining {
                return Err(BytecodeError::StackUnderflow);
            }
            remaining -= value.width();
            popped.push(value);
        }
        popped.reverse();
        Ok(popped)
    }

    pub fn set_local(&mut self, slot: u16, value: FrameType) {
        let end = (slot + value.width()) as usize;
        if self.locals.len() < end {
            self.locals.resize(end, FrameType::Top);
        }
        let wide = value.width() == 2;
        self.locals[slot as usize] = value;
        if wide {
            self.locals[slot as usize + 1] = FrameType::Top;
        }
    }

    /// Replace an uninitialized value by its initialized type after a constructor call
    fn initialize(&mut self, uninitialized: &FrameType, initialized: &FrameType) {
        for value in self.stack.iter_mut().chain(self.locals.iter_mut()) {
            if value == uninitialized {
                *value = initialized.clone();
            }
        }
    }
}

/// Output of [`CodeWriter::write`]
#[derive(Debug, Clone)]
pub struct WrittenCode {
    pub code: Vec<u8>,
    pub max_stack: u16,
    pub max_locals: u16,
    pub initial_locals: Vec<FrameType>,
    pub frames: Vec<FrameSnapshot>,
}

pub struct CodeWriter<'a> {
    pool: &'a mut ConstantPool,
    code: Vec<u8>,
    state: State,
    initial_locals: Vec<FrameType>,
    frames: Vec<FrameSnapshot>,
    record_frames: bool,
    alive: bool,
    this_type: String,
    created: HashMap<u16, String>,
    max_locals: u16,
}

impl<'a> CodeWriter<'a> {
    /// A writer for the body of `method` declared by `this_type`
    pub fn new(pool: &'a mut ConstantPool, method: &MethodDescription, this_type: &str, record_frames: bool) -> Self {
        let mut state = State::default();
        if !method.is_static() {
            let this = if method.is_constructor() {
                FrameType::UninitializedThis
            } else {
                FrameType::Object(this_type.to_string())
            };
            state.set_local(0, this);
        }
        for (parameter, slot) in method.parameters.iter().zip(method.parameter_offsets()) {
            state.set_local(slot, parameter.frame_type());
        }
        let initial_locals = state.locals.clone();
        let max_locals = initial_locals.len() as u16;
        Self {
            pool,
            code: Vec::new(),
            state,
            initial_locals,
            frames: Vec::new(),
            record_frames,
            alive: true,
            this_type: this_type.to_string(),
            created: HashMap::new(),
            max_locals,
        }
    }

    pub fn write(mut self, ops: &[Op]) -> BytecodeResult<WrittenCode> {
        for op in ops {
            if !self.alive {
                return Err(BytecodeError::UnreachableCode { offset: self.code.len() });
            }
            self.emit(op)?;
        }
        if self.alive {
            return Err(BytecodeError::FallsOffEnd);
        }
        if self.code.len() > MAX_CODE_LENGTH {
            return Err(BytecodeError::CodeTooLarge { length: self.code.len() });
        }
        Ok(WrittenCode {
            code: self.code,
            max_stack: self.state.max_stacksize,
            max_locals: self.max_locals.max(self.state.locals.len() as u16),
            initial_locals: self.initial_locals,
            frames: self.frames,
        })
    }

    fn pc(&self) -> u16 {
        self.code.len() as u16
    }

    fn emit1(&mut self, od: u8) {
        self.code.push(od);
    }

    fn emit2(&mut self, od: u16) {
        self.code.extend_from_slice(&od.to_be_bytes());
    }

    fn emitop2(&mut self, op: u8, od: u16) {
        self.emit1(op);
        self.emit2(od);
    }

    fn emit(&mut self, op: &Op) -> BytecodeResult<()> {
        match op {
            Op::Push(value) => self.emit_push(value),
            Op::Load { value_type, slot } => {
                self.emit_local(load_opcode(value_type), *slot);
                let tracked = self.state.locals.get(*slot as usize).cloned().filter(|t| *t != FrameType::Top);
                self.state.push(tracked.unwrap_or_else(|| value_type.frame_type()));
                Ok(())
            }
            Op::Store { value_type, slot } => {
                self.emit_local(load_opcode(value_type) + (ISTORE - ILOAD), *slot);
                let value = self.state.pop()?;
                self.state.set_local(*slot, value);
                Ok(())
            }
            Op::Field { kind, field } => {
                let index = self.pool.add_field_ref(&field.owner, &field.name, &field.field_type.descriptor())?;
                let opcode = match kind {
                    FieldAccessKind::GetStatic => GETSTATIC,
                    FieldAccessKind::PutStatic => PUTSTATIC,
                    FieldAccessKind::GetField => GETFIELD,
                    FieldAccessKind::PutField => PUTFIELD,
                };
                self.emitop2(opcode, index);
                match kind {
                    FieldAccessKind::GetStatic => self.state.push(field.field_type.frame_type()),
                    FieldAccessKind::PutStatic => {
                        self.state.pop()?;
                    }
                    FieldAccessKind::GetField => {
                        self.state.pop()?;
                        self.state.push(field.field_type.frame_type());
                    }
                    FieldAccessKind::PutField => {
                        self.state.pop()?;
                        self.state.pop()?;
                    }
                }
                Ok(())
            }
            Op::Invoke { kind, method } => self.emit_invoke(*kind, method),
            Op::New(name) => {
                let offset = self.pc();
                let index = self.pool.add_class(name)?;
                self.emitop2(NEW, index);
                self.created.insert(offset, name.clone());
                self.state.push(FrameType::Uninitialized(offset));
                Ok(())
            }
            Op::Dup(kind) => {
                let opcode = match kind {
                    DupKind::Dup => DUP,
                    DupKind::DupX1 => DUP_X1,
                    DupKind::DupX2 => DUP_X2,
                    DupKind::Dup2 => DUP2,
                    DupKind::Dup2X1 => DUP2_X1,
                    DupKind::Dup2X2 => DUP2_X2,
                };
                self.emit1(opcode);
                let (copied, under) = kind.shape();
                let top = self.state.pop_words(copied)?;
                let below = self.state.pop_words(under)?;
                for value in top.iter().chain(below.iter()).chain(top.iter()) {
                    self.state.push(value.clone());
                }
                Ok(())
            }
            Op::Pop(size) => {
                self.emit1(if *size == StackSize::Double { POP2 } else { POP });
                self.state.pop_words(size.size())?;
                Ok(())
            }
            Op::CheckCast(target) => {
                let index = self.pool.add_class(&target.class_constant_name())?;
                self.emitop2(CHECKCAST, index);
                self.state.pop()?;
                self.state.push(target.frame_type());
                Ok(())
            }
            Op::Arithmetic { opcode, operand_type } => {
                self.emit1(*opcode);
                self.state.pop()?;
                self.state.pop()?;
                self.state.push(TypeRef::primitive(*operand_type).frame_type());
                Ok(())
            }
            Op::Convert { opcode, to, .. } => {
                self.emit1(*opcode);
                self.state.pop()?;
                self.state.push(TypeRef::primitive(*to).frame_type());
                Ok(())
            }
            Op::Compare { operand_type, relation } => self.emit_compare(*operand_type, *relation),
            Op::Return(value_type) => {
                let opcode = match value_type.as_primitive() {
                    Some(PrimitiveType::Void) => RETURN,
                    _ => load_opcode(value_type) - ILOAD + IRETURN,
                };
                self.emit1(opcode);
                if !value_type.is_void() {
                    self.state.pop()?;
                }
                self.alive = false;
                Ok(())
            }
            Op::Throw => {
                self.emit1(ATHROW);
                self.state.pop()?;
                self.alive = false;
                Ok(())
            }
        }
    }

    fn emit_push(&mut self, value: &ConstantValue) -> BytecodeResult<()> {
        let pushed = match value {
            ConstantValue::Int(value) => {
                match *value {
                    -1..=5 => self.emit1((ICONST_0 as i32 + value) as u8),
                    v if i8::try_from(v).is_ok() => {
                        self.emit1(BIPUSH);
                        self.emit1(v as i8 as u8);
                    }
                    v if i16::try_from(v).is_ok() => self.emitop2(SIPUSH, v as i16 as u16),
                    v => {
                        let index = self.pool.add_integer(v)?;
                        self.emit_ldc(index);
                    }
                }
                FrameType::Integer
            }
            ConstantValue::Long(value) => {
                match *value {
                    0 | 1 => self.emit1(LCONST_0 + *value as u8),
                    v => {
                        let index = self.pool.add_long(v)?;
                        self.emitop2(LDC2_W, index);
                    }
                }
                FrameType::Long
            }
            ConstantValue::Float(value) => {
                match [0.0f32, 1.0, 2.0].iter().position(|c| c.to_bits() == value.to_bits()) {
                    Some(position) => self.emit1(FCONST_0 + position as u8),
                    None => {
                        let index = self.pool.add_float(*value)?;
                        self.emit_ldc(index);
                    }
                }
                FrameType::Float
            }
            ConstantValue::Double(value) => {
                match [0.0f64, 1.0].iter().position(|c| c.to_bits() == value.to_bits()) {
                    Some(position) => self.emit1(DCONST_0 + position as u8),
                    None => {
                        let index = self.pool.add_double(*value)?;
                        self.emitop2(LDC2_W, index);
                    }
                }
                FrameType::Double
            }
            ConstantValue::Null => {
                self.emit1(ACONST_NULL);
                FrameType::Null
            }
            ConstantValue::Text(text) => {
                let index = self.pool.add_string(text)?;
                self.emit_ldc(index);
                FrameType::Object(STRING.to_string())
            }
            ConstantValue::Type(type_ref) => {
                let index = self.pool.add_class(&type_ref.class_constant_name())?;
                self.emit_ldc(index);
                FrameType::Object(CLASS.to_string())
            }
        };
        self.state.push(pushed);
        Ok(())
    }

    fn emit_ldc(&mut self, index: u16) {
        match u8::try_from(index) {
            Ok(short) => {
                self.emit1(LDC);
                self.emit1(short);
            }
            Err(_) => self.emitop2(LDC_W, index),
        }
    }

    /// Load or store with the short form for slots 0 to 3
    fn emit_local(&mut self, opcode: u8, slot: u16) {
        let family = if opcode >= ISTORE { opcode - ISTORE } else { opcode - ILOAD };
        let short_base = if opcode >= ISTORE { ISTORE_0 } else { ILOAD_0 };
        match slot {
            0..=3 => self.emit1(short_base + family * 4 + slot as u8),
            4..=255 => {
                self.emit1(opcode);
                self.emit1(slot as u8);
            }
            _ => {
                self.emit1(WIDE);
                self.emitop2(opcode, slot);
            }
        }
        let end = slot + if matches!(family, 1 | 3) { 2 } else { 1 };
        self.max_locals = self.max_locals.max(end);
    }

    fn emit_invoke(&mut self, kind: InvocationKind, method: &MethodRef) -> BytecodeResult<()> {
        let descriptor = method.descriptor();
        let index = if method.interface {
            self.pool.add_interface_method_ref(&method.owner, &method.name, &descriptor)?
        } else {
            self.pool.add_method_ref(&method.owner, &method.name, &descriptor)?
        };
        let opcode = match kind {
            InvocationKind::Static => INVOKESTATIC,
            InvocationKind::Virtual => INVOKEVIRTUAL,
            InvocationKind::Interface => INVOKEINTERFACE,
            InvocationKind::Special => INVOKESPECIAL,
        };
        self.emitop2(opcode, index);
        if kind == InvocationKind::Interface {
            self.emit1((method.parameter_size() + 1) as u8);
            self.emit1(0);
        }
        for _ in &method.parameters {
            self.state.pop()?;
        }
        if kind != InvocationKind::Static {
            let receiver = self.state.pop()?;
            if method.name == CONSTRUCTOR_NAME {
                let initialized = match &receiver {
                    FrameType::UninitializedThis => Some(self.this_type.clone()),
                    FrameType::Uninitialized(offset) => self.created.get(offset).cloned(),
                    _ => None,
                };
                if let Some(name) = initialized {
                    self.state.initialize(&receiver, &FrameType::Object(name));
                }
            }
        }
        if !method.return_type.is_void() {
            self.state.push(method.return_type.frame_type());
        }
        Ok(())
    }

    /// `[cmp] ifXX +7; iconst_0; goto +4; iconst_1`, with frames at the `1` branch and the join
    fn emit_compare(&mut self, operand_type: PrimitiveType, relation: Relation) -> BytecodeResult<()> {
        self.state.pop()?;
        self.state.pop()?;
        let branch = match relation.compare_opcode(operand_type) {
            Some(compare) => {
                self.emit1(compare);
                relation.zero_branch()
            }
            None => relation.int_branch(),
        };
        let branch_pc = self.pc();
        self.emitop2(branch, 7);
        self.emit1(ICONST_0);
        self.emitop2(GOTO, 4);
        self.record_frame(branch_pc + 7);
        self.emit1(ICONST_1);
        self.state.push(FrameType::Integer);
        self.record_frame(branch_pc + 8);
        Ok(())
    }

    fn record_frame(&mut self, offset: u16) {
        if self.record_frames {
            self.frames.push(FrameSnapshot {
                offset,
                locals: self.state.locals.clone(),
                stack: self.state.stack.clone(),
            });
        }
    }
}

/// `xload` family opcode for a value type
fn load_opcode(value_type: &TypeRef) -> u8 {
    match value_type.as_primitive() {
        Some(PrimitiveType::Long) => LLOAD,
        Some(PrimitiveType::Float) => FLOAD,
        Some(PrimitiveType::Double) => DLOAD,
        Some(_) => ILOAD,
        None => ALOAD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::member::{MethodInvocation, MethodReturn, MethodVariableAccess};
    use crate::bytecode::comparison::Comparison;
    use crate::bytecode::{Code, StackManipulation};
    use crate::description::Modifiers;

    fn write(method: &MethodDescription, manipulation: StackManipulation) -> WrittenCode {
        let mut code = Code::new();
        manipulation.apply(&mut code).unwrap();
        let mut pool = ConstantPool::new();
        CodeWriter::new(&mut pool, method, &method.declaring_type, true).write(code.ops()).unwrap()
    }

    #[test]
    fn test_constructor_initializes_this() {
        let constructor = MethodDescription::new("demo/Foo", "<init>", Modifiers::PUBLIC, vec![], TypeRef::void());
        let object_init = MethodDescription::new("java/lang/Object", "<init>", Modifiers::PUBLIC, vec![], TypeRef::void());
        let body = StackManipulation::compound(vec![
            MethodVariableAccess::load_this("demo/Foo"),
            MethodInvocation::invoke(&object_init),
            MethodReturn::void(),
        ]);
        let written = write(&constructor, body);
        assert_eq!(written.code[0], ALOAD_0);
        assert_eq!(written.code[1], INVOKESPECIAL);
        assert_eq!(written.code[4], RETURN);
        assert_eq!((written.max_stack, written.max_locals), (1, 1));
        assert_eq!(written.initial_locals, vec![FrameType::UninitializedThis]);
    }

    #[test]
    fn test_long_comparison_layout_and_frames() {
        let method = MethodDescription::new(
            "demo/Foo",
            "less",
            Modifiers::PUBLIC | Modifiers::STATIC,
            vec![TypeRef::long(), TypeRef::long()],
            TypeRef::boolean(),
        );
        let body = StackManipulation::compound(vec![
            MethodVariableAccess::load_arguments(&method),
            Comparison::of(PrimitiveType::Long, Relation::Less),
            MethodReturn::of(&TypeRef::boolean()),
        ]);
        let written = write(&method, body);
        assert_eq!(
            written.code,
            vec![LLOAD_0, LLOAD_0 + 2, LCMP, IFLT, 0, 7, ICONST_0, GOTO, 0, 4, ICONST_1, IRETURN]
        );
        assert_eq!(written.max_stack, 4);
        assert_eq!(written.frames.len(), 2);
        assert_eq!(written.frames[0].offset, 10);
        assert!(written.frames[0].stack.is_empty());
        assert_eq!(written.frames[1].offset, 11);
        assert_eq!(written.frames[1].stack, vec![FrameType::Integer]);
    }

    #[test]
    fn test_missing_return_is_rejected() {
        let method = MethodDescription::new("demo/Foo", "run", Modifiers::PUBLIC, vec![], TypeRef::void());
        let mut pool = ConstantPool::new();
        let result = CodeWriter::new(&mut pool, &method, "demo/Foo", false).write(&[]);
        assert_eq!(result.unwrap_err(), BytecodeError::FallsOffEnd);
    }

    #[test]
    fn test_wide_local_slots() {
        let method = MethodDescription::new("demo/Foo", "run", Modifiers::PUBLIC, vec![], TypeRef::void());
        let body = StackManipulation::compound(vec![
            crate::bytecode::constant::IntegerConstant::for_value(300),
            MethodVariableAccess::store(&TypeRef::int(), 300),
            MethodReturn::void(),
        ]);
        let written = write(&method, body);
        assert_eq!(written.code, vec![SIPUSH, 0x01, 0x2c, WIDE, ISTORE, 0x01, 0x2c, RETURN]);
        assert_eq!(written.max_locals, 301);
    }
}
