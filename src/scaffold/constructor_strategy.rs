//! Constructors contributed to a subclass

use log::debug;

use super::matcher::ElementMatcher;
use super::method_registry::MethodRegistry;
use crate::common::{Error, Result};
use crate::description::{MethodToken, Modifiers, TypeDescription, Visibility};
use crate::implementation::Implementation;

/// Decides which constructors a subclass declares; every generated constructor forwards its
/// arguments to the super constructor of equal signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstructorStrategy {
    NoConstructors,
    /// A single public no-argument constructor
    DefaultConstructor,
    /// Every super constructor visible to the subclass, with its modifiers
    #[default]
    ImitateSuperType,
    /// Every public super constructor
    ImitateSuperTypePublic,
}

impl ConstructorStrategy {
    pub fn extract_constructors(&self, super_type: &TypeDescription, instrumented: &str) -> Result<Vec<MethodToken>> {
        let visible = || super_type.declared_constructors().filter(|c| c.is_visible_to(instrumented) && !c.is_private());
        let constructors: Vec<MethodToken> = match self {
            ConstructorStrategy::NoConstructors => Vec::new(),
            ConstructorStrategy::DefaultConstructor => {
                let candidates: Vec<_> = visible().filter(|c| c.parameters.is_empty()).collect();
                if candidates.len() != 1 {
                    return Err(Error::NoDefaultConstructor {
                        type_name: instrumented.to_string(),
                        super_type: super_type.name.clone(),
                        found: candidates.len(),
                    });
                }
                vec![MethodToken::constructor(Modifiers::PUBLIC, Vec::new())]
            }
            ConstructorStrategy::ImitateSuperType => visible().map(|c| imitate(c.token(), c.modifiers)).collect(),
            ConstructorStrategy::ImitateSuperTypePublic => visible()
                .filter(|c| c.modifiers.is_public())
                .map(|c| imitate(c.token(), c.modifiers.with_visibility(Visibility::Public)))
                .collect(),
        };
        debug!(
            "{:?} extracted {} constructors of {} for {}",
            self,
            constructors.len(),
            super_type.name,
            instrumented
        );
        Ok(constructors)
    }

    /// Bind the generated constructors at the lowest priority so that explicit interceptions win
    pub fn inject(&self, registry: &mut MethodRegistry) {
        if *self != ConstructorStrategy::NoConstructors {
            registry.append(ElementMatcher::IsConstructor, Implementation::SuperMethodCall);
        }
    }
}

fn imitate(mut token: MethodToken, modifiers: Modifiers) -> MethodToken {
    token.modifiers = modifiers.without(Modifiers::SYNTHETIC);
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{OBJECT, STRING};
    use crate::description::TypeRef;

    fn base() -> TypeDescription {
        TypeDescription::class("demo/Base", OBJECT)
            .with_method(MethodToken::constructor(Modifiers::PUBLIC, vec![]))
            .with_method(
                MethodToken::constructor(Modifiers::PROTECTED, vec![TypeRef::object(STRING), TypeRef::long()])
                    .with_exceptions(vec!["java/io/IOException".to_string()]),
            )
            .with_method(MethodToken::constructor(Modifiers::PRIVATE, vec![TypeRef::int()]))
            .with_method(MethodToken::constructor(Modifiers::EMPTY, vec![TypeRef::boolean()]))
    }

    #[test]
    fn test_imitate_super_type_copies_visible_constructors() {
        let extracted = ConstructorStrategy::ImitateSuperType.extract_constructors(&base(), "demo/Sub").unwrap();
        assert_eq!(extracted.len(), 3);
        assert_eq!(extracted[1].modifiers, Modifiers::PROTECTED);
        assert_eq!(extracted[1].exceptions, vec!["java/io/IOException"]);

        let elsewhere = ConstructorStrategy::ImitateSuperType.extract_constructors(&base(), "other/Sub").unwrap();
        assert_eq!(elsewhere.len(), 2);
    }

    #[test]
    fn test_imitate_public_only() {
        let extracted = ConstructorStrategy::ImitateSuperTypePublic.extract_constructors(&base(), "demo/Sub").unwrap();
        assert_eq!(extracted, vec![MethodToken::constructor(Modifiers::PUBLIC, vec![])]);
    }

    #[test]
    fn test_default_constructor_requires_no_argument_constructor() {
        let without = TypeDescription::class("demo/Base", OBJECT)
            .with_method(MethodToken::constructor(Modifiers::PUBLIC, vec![TypeRef::int()]));
        let result = ConstructorStrategy::DefaultConstructor.extract_constructors(&without, "demo/Sub");
        assert!(matches!(result, Err(Error::NoDefaultConstructor { found: 0, .. })));
        let extracted = ConstructorStrategy::DefaultConstructor.extract_constructors(&base(), "demo/Sub").unwrap();
        assert_eq!(extracted.len(), 1);
    }

    #[test]
    fn test_no_constructors() {
        assert!(ConstructorStrategy::NoConstructors.extract_constructors(&base(), "demo/Sub").unwrap().is_empty());
        let mut registry = MethodRegistry::new();
        ConstructorStrategy::NoConstructors.inject(&mut registry);
        assert!(registry.is_empty());
        ConstructorStrategy::DefaultConstructor.inject(&mut registry);
        assert_eq!(registry.len(), 1);
    }
}
