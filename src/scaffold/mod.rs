//! Building blocks of a generated type
//!
//! The instrumented type collects declarations, the method graph resolves what it inherits,
//! the method registry binds implementations to slots and the type writer hands the result to
//! a [`ClassVisitor`].

pub mod bridge;
pub mod constructor_strategy;
pub mod instrumented_type;
pub mod matcher;
pub mod method_graph;
pub mod method_registry;
pub mod type_writer;

pub use bridge::{BridgeMethodResolver, BridgeTarget};
pub use constructor_strategy::ConstructorStrategy;
pub use instrumented_type::InstrumentedType;
pub use matcher::ElementMatcher;
pub use method_graph::{MethodGraph, MethodNode};
pub use method_registry::{MethodRegistry, PreparedMethod, PreparedRegistry};
pub use type_writer::{ClassVisitor, CompiledMethod, MethodBody, TypeHeader, TypeWriter};
