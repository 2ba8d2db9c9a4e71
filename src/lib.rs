//! ClassWeave
//!
//! Runtime generation of JVM class files from a description of the wanted type structure and
//! a strategy for every method body.
//!
//! ## Architecture
//!
//! - **description**: Immutable descriptions of types, methods and fields
//! - **pool**: Resolution of type names to descriptions, backed by class files
//! - **scaffold**: Instrumented type, method graph, method registry and type writer
//! - **implementation**: Method body strategies, super-call resolution and accessors
//! - **auxiliary**: Helper types generated next to the instrumented type
//! - **bytecode**: Stack manipulations and byte code appenders
//! - **classfile**: Reading and writing of class files
//! - **dynamic**: The builder, its output and class loading
//! - **transformer**: Process-wide registry of class file transformers
//!
//! ## Build Flow
//!
//! ```text
//! Builder → InstrumentedType → MethodRegistry::prepare → MethodGraph
//!                                     ↓
//!                 Implementation → ByteCodeAppender → TypeWriter → bytes
//!                                     ↓
//!                   accessors + auxiliary types (MethodCallProxy)
//! ```

pub mod auxiliary;
pub mod bytecode;
pub mod classfile;
pub mod common;
pub mod consts;
pub mod description;
pub mod dynamic;
pub mod implementation;
pub mod pool;
pub mod scaffold;
pub mod transformer;

pub use common::{Config, Error, Result};
pub use dynamic::{Builder, ClassWeaver, DynamicType};
pub use implementation::{Implementation, Value};
pub use scaffold::{ConstructorStrategy, ElementMatcher};
