//! Resolution of compiler-generated bridge methods to the methods they delegate to

use crate::consts::OBJECT;
use crate::description::{MethodDescription, TypeRef};
use crate::pool::TypePool;

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeTarget {
    Resolved(MethodDescription),
    /// No declaration matches the bridge
    Unknown,
    /// Several declarations match the bridge
    Ambiguous(Vec<MethodDescription>),
}

/// Finds the unique non-bridge method a bridge stands in for
pub struct BridgeMethodResolver<'a> {
    pool: &'a TypePool,
}

impl<'a> BridgeMethodResolver<'a> {
    pub fn new(pool: &'a TypePool) -> Self {
        Self { pool }
    }

    /// Resolve `method` among the methods of its declaring type; non-bridges resolve to themselves
    pub fn resolve(&self, method: &MethodDescription, declared: &[MethodDescription]) -> BridgeTarget {
        if !method.is_bridge() {
            return BridgeTarget::Resolved(method.clone());
        }
        let mut candidates: Vec<MethodDescription> = declared
            .iter()
            .filter(|candidate| {
                !candidate.is_bridge()
                    && candidate.declaring_type == method.declaring_type
                    && candidate.name == method.name
                    && candidate.parameters.len() == method.parameters.len()
                    && self.is_assignable(&candidate.return_type, &method.return_type)
                    && candidate
                        .parameters
                        .iter()
                        .zip(&method.parameters)
                        .all(|(specific, erased)| self.is_assignable(specific, erased))
            })
            .cloned()
            .collect();
        match candidates.len() {
            0 => BridgeTarget::Unknown,
            1 => BridgeTarget::Resolved(candidates.remove(0)),
            _ => BridgeTarget::Ambiguous(candidates),
        }
    }

    fn is_assignable(&self, source: &TypeRef, target: &TypeRef) -> bool {
        if source == target {
            return true;
        }
        match (source, target) {
            (TypeRef::Primitive(_), _) | (_, TypeRef::Primitive(_)) => false,
            (_, TypeRef::Reference(name)) if name == OBJECT => true,
            (TypeRef::Array(source), TypeRef::Array(target)) => self.is_assignable(source, target),
            (TypeRef::Reference(source), TypeRef::Reference(target)) => self
                .pool
                .describe(source)
                .and_then(|description| self.pool.hierarchy_of(&description))
                .map(|hierarchy| hierarchy.is_assignable_from(target, source))
                .unwrap_or(false),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::STRING;
    use crate::description::Modifiers;

    fn compare_to(parameter: TypeRef, modifiers: Modifiers) -> MethodDescription {
        MethodDescription::new("demo/Name", "compareTo", modifiers, vec![parameter], TypeRef::int())
    }

    #[test]
    fn test_bridge_resolves_to_specific_method() {
        let pool = TypePool::new();
        let bridge = compare_to(TypeRef::java_object(), Modifiers::PUBLIC | Modifiers::BRIDGE | Modifiers::SYNTHETIC);
        let specific = compare_to(TypeRef::object(STRING), Modifiers::PUBLIC);
        let resolver = BridgeMethodResolver::new(&pool);
        let declared = vec![bridge.clone(), specific.clone()];
        assert_eq!(resolver.resolve(&bridge, &declared), BridgeTarget::Resolved(specific.clone()));
        assert_eq!(resolver.resolve(&specific, &declared), BridgeTarget::Resolved(specific));
    }

    #[test]
    fn test_unknown_and_ambiguous_bridges() {
        let pool = TypePool::new();
        let resolver = BridgeMethodResolver::new(&pool);
        let bridge = compare_to(TypeRef::java_object(), Modifiers::PUBLIC | Modifiers::BRIDGE);
        assert_eq!(resolver.resolve(&bridge, std::slice::from_ref(&bridge)), BridgeTarget::Unknown);
        let first = compare_to(TypeRef::object(STRING), Modifiers::PUBLIC);
        let second = compare_to(TypeRef::object("java/lang/Integer"), Modifiers::PUBLIC);
        match resolver.resolve(&bridge, &[bridge.clone(), first, second]) {
            BridgeTarget::Ambiguous(candidates) => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }
}
