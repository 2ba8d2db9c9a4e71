//! The type model: descriptions of types, methods and fields
//!
//! Descriptions are plain immutable values. Types refer to their supertypes by internal
//! name and are resolved through a [`TypePool`](crate::pool::TypePool).

pub mod field;
pub mod method;
pub mod modifiers;
pub mod type_description;
pub mod type_ref;

pub use field::{FieldDescription, FieldToken};
pub use method::{MethodDescription, MethodToken, SignatureToken};
pub use modifiers::{Modifiers, Visibility};
pub use type_description::TypeDescription;
pub use type_ref::{internal_name, method_descriptor, package_of, parse_method_descriptor, PrimitiveType, TypeRef};
