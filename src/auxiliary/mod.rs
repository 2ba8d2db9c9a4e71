//! Helper types generated while compiling an instrumented type
//!
//! Auxiliary types are built through the same writer protocol as the instrumented type and
//! are returned next to it. Their names derive from the instrumented type's name so that they
//! share its package.

pub mod method_call_proxy;
pub mod naming;

use crate::common::{Config, Result};
use crate::dynamic::DynamicType;

pub use method_call_proxy::{AssignableSignatureCall, MethodCallProxy};
pub use naming::AuxiliaryNaming;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuxiliaryType {
    MethodCallProxy(MethodCallProxy),
}

impl AuxiliaryType {
    /// Build the type under `name`
    pub fn make(&self, name: &str, config: &Config) -> Result<DynamicType> {
        match self {
            AuxiliaryType::MethodCallProxy(proxy) => proxy.make(name, config),
        }
    }
}

impl From<MethodCallProxy> for AuxiliaryType {
    fn from(proxy: MethodCallProxy) -> Self {
        AuxiliaryType::MethodCallProxy(proxy)
    }
}
