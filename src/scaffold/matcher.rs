//! Matchers selecting methods for interception or exclusion

use std::fmt;
use std::sync::Arc;

use crate::description::{internal_name, MethodDescription, SignatureToken, TypeRef};

type MethodPredicate = Arc<dyn Fn(&MethodDescription) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum ElementMatcher {
    Any,
    None,
    Named(String),
    NameStartsWith(String),
    NameEndsWith(String),
    IsConstructor,
    /// Neither a constructor nor a type initializer
    IsMethod,
    IsAbstract,
    IsStatic,
    IsSynthetic,
    /// `finalize()` as declared by `java.lang.Object`
    IsDefaultFinalizer,
    TakesArguments(usize),
    Returns(TypeRef),
    DeclaredBy(String),
    HasSignature(SignatureToken),
    Not(Box<ElementMatcher>),
    And(Vec<ElementMatcher>),
    Or(Vec<ElementMatcher>),
    Predicate(MethodPredicate),
}

impl ElementMatcher {
    pub fn named(name: impl Into<String>) -> Self {
        ElementMatcher::Named(name.into())
    }

    pub fn declared_by(type_name: &str) -> Self {
        ElementMatcher::DeclaredBy(internal_name(type_name))
    }

    pub fn predicate(predicate: impl Fn(&MethodDescription) -> bool + Send + Sync + 'static) -> Self {
        ElementMatcher::Predicate(Arc::new(predicate))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        ElementMatcher::Not(Box::new(self))
    }

    pub fn and(self, other: ElementMatcher) -> Self {
        match self {
            ElementMatcher::And(mut matchers) => {
                matchers.push(other);
                ElementMatcher::And(matchers)
            }
            matcher => ElementMatcher::And(vec![matcher, other]),
        }
    }

    pub fn or(self, other: ElementMatcher) -> Self {
        match self {
            ElementMatcher::Or(mut matchers) => {
                matchers.push(other);
                ElementMatcher::Or(matchers)
            }
            matcher => ElementMatcher::Or(vec![matcher, other]),
        }
    }

    pub fn matches(&self, method: &MethodDescription) -> bool {
        match self {
            ElementMatcher::Any => true,
            ElementMatcher::None => false,
            ElementMatcher::Named(name) => method.name == *name,
            ElementMatcher::NameStartsWith(prefix) => method.name.starts_with(prefix.as_str()),
            ElementMatcher::NameEndsWith(suffix) => method.name.ends_with(suffix.as_str()),
            ElementMatcher::IsConstructor => method.is_constructor(),
            ElementMatcher::IsMethod => method.is_method(),
            ElementMatcher::IsAbstract => method.is_abstract(),
            ElementMatcher::IsStatic => method.is_static(),
            ElementMatcher::IsSynthetic => method.is_synthetic(),
            ElementMatcher::IsDefaultFinalizer => method.is_default_finalizer(),
            ElementMatcher::TakesArguments(count) => method.parameters.len() == *count,
            ElementMatcher::Returns(return_type) => method.return_type == *return_type,
            ElementMatcher::DeclaredBy(type_name) => method.declaring_type == *type_name,
            ElementMatcher::HasSignature(token) => method.signature_token() == *token,
            ElementMatcher::Not(matcher) => !matcher.matches(method),
            ElementMatcher::And(matchers) => matchers.iter().all(|m| m.matches(method)),
            ElementMatcher::Or(matchers) => matchers.iter().any(|m| m.matches(method)),
            ElementMatcher::Predicate(predicate) => predicate(method),
        }
    }
}

impl Default for ElementMatcher {
    /// Synthetic methods and the default finalizer
    fn default() -> Self {
        ElementMatcher::IsSynthetic.or(ElementMatcher::IsDefaultFinalizer)
    }
}

impl fmt::Debug for ElementMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementMatcher::Any => write!(f, "any()"),
            ElementMatcher::None => write!(f, "none()"),
            ElementMatcher::Named(name) => write!(f, "named({})", name),
            ElementMatcher::NameStartsWith(prefix) => write!(f, "nameStartsWith({})", prefix),
            ElementMatcher::NameEndsWith(suffix) => write!(f, "nameEndsWith({})", suffix),
            ElementMatcher::IsConstructor => write!(f, "isConstructor()"),
            ElementMatcher::IsMethod => write!(f, "isMethod()"),
            ElementMatcher::IsAbstract => write!(f, "isAbstract()"),
            ElementMatcher::IsStatic => write!(f, "isStatic()"),
            ElementMatcher::IsSynthetic => write!(f, "isSynthetic()"),
            ElementMatcher::IsDefaultFinalizer => write!(f, "isDefaultFinalizer()"),
            ElementMatcher::TakesArguments(count) => write!(f, "takesArguments({})", count),
            ElementMatcher::Returns(return_type) => write!(f, "returns({})", return_type),
            ElementMatcher::DeclaredBy(type_name) => write!(f, "isDeclaredBy({})", type_name),
            ElementMatcher::HasSignature(token) => write!(f, "hasSignature({})", token),
            ElementMatcher::Not(matcher) => write!(f, "not({:?})", matcher),
            ElementMatcher::And(matchers) => write!(f, "and({:?})", matchers),
            ElementMatcher::Or(matchers) => write!(f, "or({:?})", matchers),
            ElementMatcher::Predicate(_) => write!(f, "predicate(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::OBJECT;
    use crate::description::Modifiers;

    fn method(declaring: &str, name: &str, modifiers: Modifiers) -> MethodDescription {
        MethodDescription::new(declaring, name, modifiers, vec![], TypeRef::void())
    }

    #[test]
    fn test_default_ignores_synthetic_and_default_finalizer() {
        let ignored = ElementMatcher::default();
        assert!(ignored.matches(&method(OBJECT, "finalize", Modifiers::PROTECTED)));
        assert!(!ignored.matches(&method("demo/Foo", "finalize", Modifiers::PROTECTED)));
        assert!(ignored.matches(&method("demo/Foo", "bridge", Modifiers::PUBLIC | Modifiers::SYNTHETIC)));
        assert!(!ignored.matches(&method("demo/Foo", "run", Modifiers::PUBLIC)));
    }

    #[test]
    fn test_composition() {
        let matcher = ElementMatcher::NameStartsWith("get".into())
            .and(ElementMatcher::TakesArguments(0))
            .and(ElementMatcher::IsStatic.not());
        assert!(matcher.matches(&method("demo/Foo", "getValue", Modifiers::PUBLIC)));
        assert!(!matcher.matches(&method("demo/Foo", "getValue", Modifiers::PUBLIC | Modifiers::STATIC)));
        let custom = ElementMatcher::predicate(|m| m.name.len() == 3).or(ElementMatcher::None);
        assert!(custom.matches(&method("demo/Foo", "run", Modifiers::PUBLIC)));
        assert!(ElementMatcher::declared_by("demo.Foo").matches(&method("demo/Foo", "run", Modifiers::PUBLIC)));
    }
}
