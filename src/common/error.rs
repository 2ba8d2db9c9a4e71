use thiserror::Error;

use crate::classfile::error::{ClassFormatError, ClassGenerationError, ConstPoolError};

/// Result type for classweave operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types raised while describing, compiling or writing a type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Class format error: {0}")]
    ClassFormat(#[from] ClassFormatError),

    #[error("Class generation error: {0}")]
    ClassGeneration(#[from] ClassGenerationError),

    #[error("Constant pool error: {0}")]
    ConstPool(#[from] ConstPoolError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unknown type: {name}")]
    UnknownType { name: String },

    #[error("Circular type hierarchy detected at {name}")]
    CircularHierarchy { name: String },

    #[error("Field {name} is already declared by {type_name}")]
    DuplicateField { type_name: String, name: String },

    #[error("Method {signature} is already declared by {type_name}")]
    DuplicateMethod { type_name: String, signature: String },

    #[error("Illegal modifiers 0x{modifiers:04x} on {target}")]
    IllegalModifiers { target: String, modifiers: u16 },

    #[error("Illegal name: {name}")]
    InvalidName { name: String },

    #[error("{super_type} does not declare exactly one zero-argument constructor visible to {type_name} (found {found})")]
    NoDefaultConstructor { type_name: String, super_type: String, found: usize },

    #[error("No implementation is registered for {method}")]
    MissingImplementation { method: String },

    #[error("Method {method} is not reachable from {type_name}")]
    MethodNotReachable { type_name: String, method: String },

    #[error("Illegal stack manipulation: {message}")]
    IllegalStackManipulation { message: String },

    #[error("Linkage error: {message}")]
    Linkage { message: String },

    #[error("Transformation failed for {class_name}: {message}")]
    Transformation { class_name: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create an unknown type error
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    /// Create an illegal stack manipulation error
    pub fn illegal_manipulation(message: impl Into<String>) -> Self {
        Self::IllegalStackManipulation { message: message.into() }
    }

    /// Create a linkage error
    pub fn linkage(message: impl Into<String>) -> Self {
        Self::Linkage { message: message.into() }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Whether this error describes caller misuse detected before emission
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::DuplicateField { .. }
                | Self::DuplicateMethod { .. }
                | Self::IllegalModifiers { .. }
                | Self::InvalidName { .. }
                | Self::NoDefaultConstructor { .. }
                | Self::MissingImplementation { .. }
                | Self::MethodNotReachable { .. }
                | Self::UnknownType { .. }
        )
    }
}
