//! Resolution of non-virtual invocations of inherited implementations

use log::trace;

use crate::bytecode::member::MethodInvocation;
use crate::bytecode::StackManipulation;
use crate::description::{MethodDescription, SignatureToken, TypeDescription};
use crate::pool::TypePool;
use crate::scaffold::bridge::{BridgeMethodResolver, BridgeTarget};
use crate::scaffold::method_graph::{is_specializable, MethodGraph};

/// The outcome of resolving a super or default method call
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialMethodInvocation {
    /// `method` may be invoked with `invokespecial` on `owner`
    Legal { method: MethodDescription, owner: TypeDescription },
    Illegal,
}

impl SpecialMethodInvocation {
    pub fn is_valid(&self) -> bool {
        matches!(self, SpecialMethodInvocation::Legal { .. })
    }

    pub fn method(&self) -> Option<&MethodDescription> {
        match self {
            SpecialMethodInvocation::Legal { method, .. } => Some(method),
            SpecialMethodInvocation::Illegal => None,
        }
    }

    /// The `invokespecial` instruction, or an illegal manipulation
    pub fn manipulation(&self) -> StackManipulation {
        match self {
            SpecialMethodInvocation::Legal { method, owner } => MethodInvocation::special(method, owner),
            SpecialMethodInvocation::Illegal => StackManipulation::Illegal,
        }
    }
}

/// The type being compiled, as seen by implementations looking for code to call
pub struct ImplementationTarget<'a> {
    instrumented: &'a TypeDescription,
    graph: &'a MethodGraph,
    pool: &'a TypePool,
}

impl<'a> ImplementationTarget<'a> {
    pub fn new(instrumented: &'a TypeDescription, graph: &'a MethodGraph, pool: &'a TypePool) -> Self {
        Self { instrumented, graph, pool }
    }

    pub fn instrumented(&self) -> &TypeDescription {
        self.instrumented
    }

    pub fn graph(&self) -> &MethodGraph {
        self.graph
    }

    pub fn pool(&self) -> &TypePool {
        self.pool
    }

    pub fn super_type(&self) -> Option<&TypeDescription> {
        let name = self.instrumented.super_class.as_deref()?;
        self.graph.hierarchy().get(name)
    }

    /// Resolve the implementation the super class provides for `token`
    pub fn invoke_super(&self, token: &SignatureToken) -> SpecialMethodInvocation {
        let Some(super_type) = self.super_type() else {
            return SpecialMethodInvocation::Illegal;
        };
        if token.is_constructor() {
            return super_type
                .declared_constructors()
                .find(|c| c.signature_token() == *token && c.is_visible_to(&self.instrumented.name))
                .map(|c| SpecialMethodInvocation::Legal { method: c.clone(), owner: super_type.clone() })
                .unwrap_or(SpecialMethodInvocation::Illegal);
        }
        let Some(declaration) = self
            .graph
            .locate(token)
            .and_then(|node| node.super_declaration(&self.instrumented.name))
        else {
            return SpecialMethodInvocation::Illegal;
        };
        let declaration = self.resolve_bridge(declaration);
        let invocation = if is_specializable(&declaration, &super_type.name, self.graph.hierarchy()) {
            SpecialMethodInvocation::Legal { method: declaration, owner: super_type.clone() }
        } else {
            SpecialMethodInvocation::Illegal
        };
        trace!("{}: super call of {} is {}", self.instrumented.name, token, legality(&invocation));
        invocation
    }

    /// Resolve the default method `interface` provides for `token`; `interface` must be implemented directly
    pub fn invoke_default(&self, interface: &str, token: &SignatureToken) -> SpecialMethodInvocation {
        if !self.instrumented.interfaces.iter().any(|i| i == interface) {
            return SpecialMethodInvocation::Illegal;
        }
        let method = self
            .graph
            .default_methods_of(interface)
            .and_then(|defaults| defaults.iter().find(|m| m.signature_token() == *token));
        match (method, self.graph.hierarchy().get(interface)) {
            (Some(method), Some(owner)) => {
                SpecialMethodInvocation::Legal { method: method.clone(), owner: owner.clone() }
            }
            _ => SpecialMethodInvocation::Illegal,
        }
    }

    /// The super implementation if there is one, otherwise the only default method of a directly
    /// implemented interface
    pub fn invoke_dominant(&self, token: &SignatureToken) -> SpecialMethodInvocation {
        let invocation = self.invoke_super(token);
        if invocation.is_valid() {
            return invocation;
        }
        let mut defaults = self
            .instrumented
            .interfaces
            .iter()
            .map(|interface| self.invoke_default(interface, token))
            .filter(SpecialMethodInvocation::is_valid);
        match (defaults.next(), defaults.next()) {
            (Some(invocation), None) => invocation,
            _ => SpecialMethodInvocation::Illegal,
        }
    }

    /// A bridge is replaced by its unique target when both share the erased signature
    fn resolve_bridge(&self, declaration: &MethodDescription) -> MethodDescription {
        let Some(declaring) = self.graph.hierarchy().get(&declaration.declaring_type) else {
            return declaration.clone();
        };
        match BridgeMethodResolver::new(self.pool).resolve(declaration, &declaring.methods) {
            BridgeTarget::Resolved(target) if target.signature_token() == declaration.signature_token() => target,
            _ => declaration.clone(),
        }
    }
}

fn legality(invocation: &SpecialMethodInvocation) -> &'static str {
    if invocation.is_valid() {
        "legal"
    } else {
        "illegal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{OBJECT, STRING};
    use crate::description::{MethodToken, Modifiers, TypeRef};

    fn to_string_token() -> SignatureToken {
        SignatureToken::new("toString", vec![], TypeRef::object(STRING))
    }

    #[test]
    fn test_super_call_to_object_method() {
        let pool = TypePool::new();
        let instrumented = TypeDescription::class("demo/Foo", OBJECT);
        let graph = MethodGraph::compile(&instrumented, &pool).unwrap();
        let target = ImplementationTarget::new(&instrumented, &graph, &pool);
        match target.invoke_super(&to_string_token()) {
            SpecialMethodInvocation::Legal { method, owner } => {
                assert_eq!(method.declaring_type, OBJECT);
                assert_eq!(owner.name, OBJECT);
            }
            SpecialMethodInvocation::Illegal => panic!("expected a legal super call"),
        }
        let constructor = SignatureToken::new("<init>", vec![], TypeRef::void());
        assert!(target.invoke_super(&constructor).is_valid());
        let missing = SignatureToken::new("<init>", vec![TypeRef::int()], TypeRef::void());
        assert!(!target.invoke_super(&missing).is_valid());
    }

    #[test]
    fn test_abstract_super_method_is_illegal() {
        let pool = TypePool::new();
        pool.register(
            TypeDescription::new("demo/Base", Modifiers::PUBLIC | Modifiers::ABSTRACT, Some(OBJECT)).with_method(
                MethodToken::new("run", Modifiers::PUBLIC | Modifiers::ABSTRACT, vec![], TypeRef::void()),
            ),
        );
        let instrumented = TypeDescription::class("demo/Foo", "demo/Base");
        let graph = MethodGraph::compile(&instrumented, &pool).unwrap();
        let target = ImplementationTarget::new(&instrumented, &graph, &pool);
        let token = SignatureToken::new("run", vec![], TypeRef::void());
        assert_eq!(target.invoke_super(&token), SpecialMethodInvocation::Illegal);
        assert!(!target.invoke_super(&token).manipulation().is_valid());
    }

    #[test]
    fn test_default_method_resolution() {
        let pool = TypePool::new();
        let greet = MethodToken::new("greet", Modifiers::PUBLIC, vec![], TypeRef::void());
        pool.register(TypeDescription::interface("demo/Greeter").with_method(greet.clone()));
        let instrumented = TypeDescription::class("demo/Foo", OBJECT).with_interface("demo/Greeter");
        let graph = MethodGraph::compile(&instrumented, &pool).unwrap();
        let target = ImplementationTarget::new(&instrumented, &graph, &pool);
        let token = greet.signature_token();
        assert!(target.invoke_default("demo/Greeter", &token).is_valid());
        assert!(!target.invoke_default("demo/Other", &token).is_valid());
        assert!(!target.invoke_super(&token).is_valid());
        match target.invoke_dominant(&token) {
            SpecialMethodInvocation::Legal { owner, .. } => assert!(owner.is_interface()),
            SpecialMethodInvocation::Illegal => panic!("expected the default method"),
        }
    }
}
