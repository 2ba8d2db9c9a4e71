//! Errors raised while reading or writing class files

use thiserror::Error;

/// Errors that can occur during constant pool operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstPoolError {
    #[error("Constant pool is out of space")]
    OutOfSpace,
    #[error("Invalid constant pool index: {0}")]
    InvalidIndex(u16),
    #[error("Constant pool entry {index} is not a {expected}")]
    UnexpectedEntry { index: u16, expected: &'static str },
}

/// Errors that can occur during class file generation
#[derive(Error, Debug)]
pub enum ClassGenerationError {
    #[error("Constant pool error: {0}")]
    ConstPool(#[from] ConstPoolError),
    #[error("Bytecode generation error in {method}: {source}")]
    Bytecode { method: String, source: BytecodeError },
    #[error("Attribute data too large: {size} bytes")]
    DataTooLarge { size: usize },
    #[error("Class file was finished before it was started")]
    NotStarted,
}

/// Errors that can occur while lowering instructions to bytecode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BytecodeError {
    #[error("Stack underflow")]
    StackUnderflow,
    #[error("Local variable index out of bounds: {index}")]
    LocalIndexOutOfBounds { index: u16 },
    #[error("Branch target too far: {offset}")]
    BranchTooFar { offset: i32 },
    #[error("Code length {length} exceeds the class file limit")]
    CodeTooLarge { length: usize },
    #[error("Unreachable instruction at offset {offset}")]
    UnreachableCode { offset: usize },
    #[error("Control flow falls off the end of the code")]
    FallsOffEnd,
    #[error("Constant pool error: {0}")]
    ConstPool(#[from] ConstPoolError),
}

/// Errors that can occur while parsing a class file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassFormatError {
    #[error("Invalid magic number 0x{0:08x}")]
    InvalidMagic(u32),
    #[error("Unexpected end of class file at offset {0}")]
    UnexpectedEof(usize),
    #[error("Invalid constant tag {tag} at index {index}")]
    InvalidConstantTag { tag: u8, index: u16 },
    #[error("Constant pool error: {0}")]
    ConstPool(#[from] ConstPoolError),
    #[error("Malformed descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("Malformed modified UTF-8 at index {0}")]
    InvalidUtf8(u16),
}

/// Generic result type for constant pool operations
pub type ConstPoolResult<T> = Result<T, ConstPoolError>;

/// Generic result type for bytecode operations
pub type BytecodeResult<T> = Result<T, BytecodeError>;
