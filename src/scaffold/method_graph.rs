//! Resolution of the methods reachable on a type
//!
//! A [`MethodGraph`] holds exactly one [`MethodNode`] per [`SignatureToken`]. The instrumented
//! type's own declarations come first, then the overridable methods of its superclass chain and
//! finally the methods of every implemented interface. Interface declarations of the same
//! signature are reduced to the most specific ones; when several incomparable declarations
//! remain the slot becomes a conflicting placeholder that can be implemented but never
//! invoked as a super method.

use std::collections::{HashMap, HashSet, VecDeque};

use log::{debug, trace};

use super::matcher::ElementMatcher;
use crate::common::Result;
use crate::description::{MethodDescription, Modifiers, SignatureToken, TypeDescription};
use crate::pool::{TypeHierarchy, TypePool};

#[derive(Debug, Clone, PartialEq)]
pub enum MethodNode {
    /// A single declaration
    Resolved(MethodDescription),
    /// Declarations along the class chain, most specific first
    Overridden(Vec<MethodDescription>),
    /// Incomparable interface declarations merged into an abstract placeholder
    Conflicting { placeholder: MethodDescription, declarations: Vec<MethodDescription> },
}

impl MethodNode {
    /// The method a subtype sees in this slot
    pub fn representative(&self) -> &MethodDescription {
        match self {
            MethodNode::Resolved(method) => method,
            MethodNode::Overridden(chain) => &chain[0],
            MethodNode::Conflicting { placeholder, .. } => placeholder,
        }
    }

    pub fn declarations(&self) -> &[MethodDescription] {
        match self {
            MethodNode::Resolved(method) => std::slice::from_ref(method),
            MethodNode::Overridden(chain) => chain,
            MethodNode::Conflicting { declarations, .. } => declarations,
        }
    }

    pub fn signature_token(&self) -> SignatureToken {
        self.representative().signature_token()
    }

    pub fn is_conflicting(&self) -> bool {
        matches!(self, MethodNode::Conflicting { .. })
    }

    /// The most specific declaration not made by `instrumented`
    pub fn super_declaration(&self, instrumented: &str) -> Option<&MethodDescription> {
        match self {
            MethodNode::Conflicting { .. } => None,
            _ => self.declarations().iter().find(|method| method.declaring_type != instrumented),
        }
    }

    /// Whether the slot has an implementation `target` may invoke non-virtually
    pub fn is_specializable_for(&self, target: &str, hierarchy: &TypeHierarchy) -> bool {
        match self {
            MethodNode::Conflicting { .. } => false,
            _ => is_specializable(self.representative(), target, hierarchy),
        }
    }

    fn extend(&mut self, method: MethodDescription) {
        match self {
            MethodNode::Resolved(first) => *self = MethodNode::Overridden(vec![first.clone(), method]),
            MethodNode::Overridden(chain) => chain.push(method),
            MethodNode::Conflicting { declarations, .. } => declarations.push(method),
        }
    }
}

/// Whether `target` may invoke `method` with `invokespecial`
pub fn is_specializable(method: &MethodDescription, target: &str, hierarchy: &TypeHierarchy) -> bool {
    !method.is_abstract() && !method.is_static() && hierarchy.is_assignable_from(&method.declaring_type, target)
}

/// The reachable method table of a type
#[derive(Debug, Clone)]
pub struct MethodGraph {
    instrumented: String,
    nodes: Vec<MethodNode>,
    index: HashMap<SignatureToken, usize>,
    defaults: HashMap<String, Vec<MethodDescription>>,
    hierarchy: TypeHierarchy,
}

impl MethodGraph {
    pub fn compile(instrumented: &TypeDescription, pool: &TypePool) -> Result<Self> {
        Self::compile_with(instrumented, pool, &ElementMatcher::None)
    }

    /// Compile the graph leaving out every declaration matched by `ignored`
    pub fn compile_with(instrumented: &TypeDescription, pool: &TypePool, ignored: &ElementMatcher) -> Result<Self> {
        let hierarchy = pool.hierarchy_of(instrumented)?;
        let mut graph = Self {
            instrumented: instrumented.name.clone(),
            nodes: Vec::new(),
            index: HashMap::new(),
            defaults: HashMap::new(),
            hierarchy,
        };

        for method in instrumented.declared_methods().filter(|m| !ignored.matches(m)) {
            graph.insert_or_extend(method.clone());
        }
        let superclasses: Vec<TypeDescription> = graph.hierarchy.superclasses().into_iter().cloned().collect();
        for superclass in &superclasses {
            for method in superclass.declared_methods() {
                if method.is_private() || method.is_static() || !method.is_visible_to(&instrumented.name) {
                    continue;
                }
                if ignored.matches(method) {
                    continue;
                }
                graph.insert_or_extend(method.clone());
            }
        }
        let class_signatures: HashSet<SignatureToken> = graph.index.keys().cloned().collect();
        graph.remove_final_inherited();

        let roots: Vec<String> = instrumented
            .interfaces
            .iter()
            .chain(superclasses.iter().flat_map(|s| s.interfaces.iter()))
            .cloned()
            .collect();
        let candidates = graph.collect_interface_methods(&roots, &class_signatures, ignored);
        for (token, declarations) in candidates {
            let node = graph.merge(declarations);
            trace!("{}: interface slot {} -> {:?}", graph.instrumented, token, node);
            graph.index.insert(token, graph.nodes.len());
            graph.nodes.push(node);
        }

        for interface in &instrumented.interfaces {
            let visible = graph.collect_interface_methods(std::slice::from_ref(interface), &HashSet::new(), ignored);
            let defaults: Vec<MethodDescription> = visible
                .into_iter()
                .filter_map(|(_, declarations)| match graph.merge(declarations) {
                    MethodNode::Resolved(method) if method.is_default_method() => Some(method),
                    _ => None,
                })
                .collect();
            graph.defaults.insert(interface.clone(), defaults);
        }

        debug!(
            "Compiled method graph of {}: {} reachable methods, {} conflicting",
            graph.instrumented,
            graph.nodes.len(),
            graph.nodes.iter().filter(|n| n.is_conflicting()).count()
        );
        Ok(graph)
    }

    fn insert_or_extend(&mut self, method: MethodDescription) {
        let token = method.signature_token();
        match self.index.get(&token) {
            Some(&position) => self.nodes[position].extend(method),
            None => {
                self.index.insert(token, self.nodes.len());
                self.nodes.push(MethodNode::Resolved(method));
            }
        }
    }

    /// Inherited slots whose most specific declaration is final cannot be overridden
    fn remove_final_inherited(&mut self) {
        let instrumented = self.instrumented.clone();
        self.nodes.retain(|node| {
            let method = node.representative();
            !(method.is_final() && method.declaring_type != instrumented)
        });
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index = self.nodes.iter().enumerate().map(|(position, node)| (node.signature_token(), position)).collect();
    }

    /// Virtual methods of every interface reachable from `roots`, grouped by signature in
    /// discovery order
    fn collect_interface_methods(
        &self,
        roots: &[String],
        skipped: &HashSet<SignatureToken>,
        ignored: &ElementMatcher,
    ) -> Vec<(SignatureToken, Vec<MethodDescription>)> {
        let mut grouped: Vec<(SignatureToken, Vec<MethodDescription>)> = Vec::new();
        let mut positions: HashMap<SignatureToken, usize> = HashMap::new();
        let mut visited = HashSet::new();
        let mut pending: VecDeque<&str> = roots.iter().map(String::as_str).collect();
        while let Some(name) = pending.pop_front() {
            if !visited.insert(name) {
                continue;
            }
            let Some(interface) = self.hierarchy.get(name) else {
                continue;
            };
            for method in interface.declared_methods() {
                if !method.is_virtual() || ignored.matches(method) {
                    continue;
                }
                let token = method.signature_token();
                if skipped.contains(&token) {
                    continue;
                }
                match positions.get(&token) {
                    Some(&position) => grouped[position].1.push(method.clone()),
                    None => {
                        positions.insert(token.clone(), grouped.len());
                        grouped.push((token, vec![method.clone()]));
                    }
                }
            }
            pending.extend(interface.interfaces.iter().map(String::as_str));
        }
        grouped
    }

    /// Keep every declaration that no other declaration's interface overrides
    fn merge(&self, declarations: Vec<MethodDescription>) -> MethodNode {
        let mut retained: Vec<MethodDescription> = Vec::new();
        for candidate in &declarations {
            let dominated = declarations.iter().any(|other| {
                other.declaring_type != candidate.declaring_type
                    && self.hierarchy.is_assignable_from(&candidate.declaring_type, &other.declaring_type)
            });
            let seen = retained.iter().any(|kept| kept.declaring_type == candidate.declaring_type);
            if !dominated && !seen {
                retained.push(candidate.clone());
            }
        }
        let first = match retained.as_slice() {
            [] => return MethodNode::Resolved(declarations[0].clone()),
            [single] => return MethodNode::Resolved(single.clone()),
            [first, ..] => first,
        };
        let mut placeholder = MethodDescription::new(
            self.instrumented.clone(),
            first.name.clone(),
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
            first.parameters.clone(),
            first.return_type.clone(),
        );
        placeholder.exceptions = first
            .exceptions
            .iter()
            .filter(|exception| retained.iter().all(|method| method.exceptions.contains(exception)))
            .cloned()
            .collect();
        MethodNode::Conflicting { placeholder, declarations: retained }
    }

    pub fn instrumented(&self) -> &str {
        &self.instrumented
    }

    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }

    pub fn locate(&self, token: &SignatureToken) -> Option<&MethodNode> {
        self.index.get(token).map(|&position| &self.nodes[position])
    }

    pub fn nodes(&self) -> &[MethodNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn reachable_methods(&self) -> impl Iterator<Item = &MethodDescription> {
        self.nodes.iter().map(MethodNode::representative)
    }

    /// Default methods visible through a directly implemented interface
    pub fn default_methods_of(&self, interface: &str) -> Option<&[MethodDescription]> {
        self.defaults.get(interface).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::OBJECT;
    use crate::description::{MethodToken, TypeRef};

    fn abstract_method(name: &str) -> MethodToken {
        MethodToken::new(name, Modifiers::PUBLIC | Modifiers::ABSTRACT, vec![], TypeRef::void())
    }

    fn default_method(name: &str) -> MethodToken {
        MethodToken::new(name, Modifiers::PUBLIC, vec![], TypeRef::void())
    }

    #[test]
    fn test_object_methods_are_reachable_except_final_ones() {
        let pool = TypePool::new();
        let instrumented = TypeDescription::class("demo/Foo", OBJECT);
        let graph = MethodGraph::compile(&instrumented, &pool).unwrap();
        let names: Vec<&str> = graph.reachable_methods().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"toString"));
        assert!(names.contains(&"finalize"));
        assert!(!names.contains(&"getClass"));
        assert!(!names.contains(&"wait"));
    }

    #[test]
    fn test_own_declaration_overrides_super_declaration() {
        let pool = TypePool::new();
        let instrumented = TypeDescription::class("demo/Foo", OBJECT).with_method(MethodToken::new(
            "toString",
            Modifiers::PUBLIC,
            vec![],
            TypeRef::object("java/lang/String"),
        ));
        let baseline = MethodGraph::compile(&TypeDescription::class("demo/Bar", OBJECT), &pool).unwrap();
        let graph = MethodGraph::compile(&instrumented, &pool).unwrap();
        assert_eq!(graph.len(), baseline.len());
        let token = SignatureToken::new("toString", vec![], TypeRef::object("java/lang/String"));
        let node = graph.locate(&token).unwrap();
        assert_eq!(node.representative().declaring_type, "demo/Foo");
        assert_eq!(node.super_declaration("demo/Foo").unwrap().declaring_type, OBJECT);
    }

    #[test]
    fn test_unrelated_interfaces_conflict() {
        let pool = TypePool::new();
        pool.register(TypeDescription::interface("demo/A").with_method(default_method("greet")));
        pool.register(TypeDescription::interface("demo/B").with_method(default_method("greet")));
        let instrumented = TypeDescription::class("demo/Foo", OBJECT).with_interface("demo/A").with_interface("demo/B");
        let graph = MethodGraph::compile(&instrumented, &pool).unwrap();
        let node = graph.locate(&SignatureToken::new("greet", vec![], TypeRef::void())).unwrap();
        assert!(node.is_conflicting());
        assert_eq!(node.declarations().len(), 2);
        assert_eq!(node.representative().declaring_type, "demo/Foo");
        assert!(!node.is_specializable_for("demo/Foo", graph.hierarchy()));
        assert_eq!(graph.default_methods_of("demo/A").unwrap().len(), 1);
    }

    #[test]
    fn test_sub_interface_declaration_dominates() {
        let pool = TypePool::new();
        pool.register(TypeDescription::interface("demo/A").with_method(abstract_method("greet")));
        pool.register(
            TypeDescription::interface("demo/B").with_interface("demo/A").with_method(default_method("greet")),
        );
        let instrumented = TypeDescription::class("demo/Foo", OBJECT).with_interface("demo/A").with_interface("demo/B");
        let graph = MethodGraph::compile(&instrumented, &pool).unwrap();
        let node = graph.locate(&SignatureToken::new("greet", vec![], TypeRef::void())).unwrap();
        assert_eq!(node, &MethodNode::Resolved(node.representative().clone()));
        assert_eq!(node.representative().declaring_type, "demo/B");
    }

    #[test]
    fn test_conflict_set_is_order_independent() {
        let pool = TypePool::new();
        pool.register(TypeDescription::interface("demo/A").with_method(abstract_method("greet")));
        pool.register(TypeDescription::interface("demo/B").with_method(abstract_method("greet")));
        pool.register(
            TypeDescription::interface("demo/C").with_interface("demo/A").with_method(abstract_method("greet")),
        );
        let orders = [["demo/A", "demo/B", "demo/C"], ["demo/C", "demo/B", "demo/A"], ["demo/B", "demo/C", "demo/A"]];
        for order in orders {
            let mut instrumented = TypeDescription::class("demo/Foo", OBJECT);
            for interface in order {
                instrumented = instrumented.with_interface(interface);
            }
            let graph = MethodGraph::compile(&instrumented, &pool).unwrap();
            let node = graph.locate(&SignatureToken::new("greet", vec![], TypeRef::void())).unwrap();
            let mut owners: Vec<&str> = node.declarations().iter().map(|m| m.declaring_type.as_str()).collect();
            owners.sort_unstable();
            assert_eq!(owners, vec!["demo/B", "demo/C"]);
        }
    }

    #[test]
    fn test_ignored_methods_are_left_out() {
        let pool = TypePool::new();
        let instrumented = TypeDescription::class("demo/Foo", OBJECT);
        let graph = MethodGraph::compile_with(&instrumented, &pool, &ElementMatcher::default()).unwrap();
        assert!(graph.reachable_methods().all(|m| m.name != "finalize"));
    }
}
