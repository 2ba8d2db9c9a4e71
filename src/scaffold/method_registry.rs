//! Binding of implementations to the method slots of the instrumented type

use log::{debug, trace};

use super::instrumented_type::InstrumentedType;
use super::matcher::ElementMatcher;
use super::method_graph::MethodGraph;
use super::type_writer::{CompiledMethod, MethodBody};
use crate::bytecode::Code;
use crate::common::{Error, Result};
use crate::description::{MethodDescription, Modifiers, TypeDescription, Visibility};
use crate::implementation::{Implementation, ImplementationContext, ImplementationTarget};
use crate::pool::TypePool;

#[derive(Debug, Clone)]
struct Entry {
    matcher: ElementMatcher,
    implementation: Implementation,
}

/// Ordered matcher to implementation bindings; the first matching entry wins
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    entries: Vec<Entry>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind with the highest priority
    pub fn prepend(&mut self, matcher: ElementMatcher, implementation: Implementation) {
        self.entries.insert(0, Entry { matcher, implementation });
    }

    /// Bind with the lowest priority
    pub fn append(&mut self, matcher: ElementMatcher, implementation: Implementation) {
        self.entries.push(Entry { matcher, implementation });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn implementations(&self) -> impl Iterator<Item = &Implementation> {
        self.entries.iter().map(|entry| &entry.implementation)
    }

    fn binding(&self, method: &MethodDescription) -> Option<&Implementation> {
        self.entries.iter().find(|entry| entry.matcher.matches(method)).map(|entry| &entry.implementation)
    }

    /// Let every implementation prepare the type, then decide which methods are written
    ///
    /// Methods declared by the instrumented type are always written; a declared method that is
    /// neither abstract nor native must be bound. Inherited and interface methods are written as
    /// overrides only when an entry matches them. `ignored` removes inherited methods from
    /// consideration altogether.
    pub fn prepare(
        &self,
        instrumented: InstrumentedType,
        pool: &TypePool,
        ignored: &ElementMatcher,
    ) -> Result<PreparedRegistry> {
        let instrumented = self
            .entries
            .iter()
            .try_fold(instrumented, |current, entry| entry.implementation.prepare(current))?;
        let mut description = instrumented.into_description();
        let graph = MethodGraph::compile_with(&description, pool, ignored)?;

        let mut methods = Vec::new();
        for declared in description.methods.iter().filter(|m| !m.is_type_initializer()) {
            match self.binding(declared) {
                Some(implementation) => {
                    let mut method = declared.clone();
                    method.modifiers = method.modifiers.without(Modifiers::ABSTRACT | Modifiers::NATIVE);
                    methods.push(PreparedMethod { description: method, implementation: Some(implementation.clone()) });
                }
                None if declared.is_abstract() || declared.modifiers.is_native() => {
                    methods.push(PreparedMethod { description: declared.clone(), implementation: None });
                }
                None => return Err(Error::MissingImplementation { method: declared.to_string() }),
            }
        }

        for node in graph.nodes() {
            let inherited = node.representative();
            if description.find_method(&node.signature_token()).is_some() {
                continue;
            }
            let Some(implementation) = self.binding(inherited) else {
                if node.is_conflicting() {
                    trace!("{}: leaving conflicting slot {} abstract", description.name, node.signature_token());
                }
                continue;
            };
            let mut method = inherited.clone();
            method.declaring_type = description.name.clone();
            method.declared_by_interface = false;
            method.modifiers = method.modifiers.without(Modifiers::ABSTRACT | Modifiers::NATIVE | Modifiers::BRIDGE);
            if inherited.declared_by_interface || node.is_conflicting() {
                method.modifiers = method.modifiers.with_visibility(Visibility::Public);
            }
            trace!("{}: overriding {}", description.name, inherited);
            methods.push(PreparedMethod { description: method, implementation: Some(implementation.clone()) });
        }

        description.methods = methods.iter().map(|m| m.description.clone()).collect();
        debug!(
            "Prepared {}: {} methods, {} implemented",
            description.name,
            methods.len(),
            methods.iter().filter(|m| m.implementation.is_some()).count()
        );
        Ok(PreparedRegistry { instrumented: description, graph, methods })
    }
}

/// A method to be written and the implementation of its body, if any
#[derive(Debug, Clone)]
pub struct PreparedMethod {
    pub description: MethodDescription,
    pub implementation: Option<Implementation>,
}

/// The final shape of the instrumented type
#[derive(Debug, Clone)]
pub struct PreparedRegistry {
    instrumented: TypeDescription,
    graph: MethodGraph,
    methods: Vec<PreparedMethod>,
}

impl PreparedRegistry {
    /// The instrumented type declaring every written method
    pub fn instrumented(&self) -> &TypeDescription {
        &self.instrumented
    }

    pub fn graph(&self) -> &MethodGraph {
        &self.graph
    }

    pub fn methods(&self) -> &[PreparedMethod] {
        &self.methods
    }

    /// Write the body of every implemented method
    pub fn compile(&self, pool: &TypePool, context: &mut ImplementationContext) -> Result<Vec<CompiledMethod>> {
        let target = ImplementationTarget::new(&self.instrumented, &self.graph, pool);
        let mut compiled = Vec::with_capacity(self.methods.len());
        for prepared in &self.methods {
            let method = &prepared.description;
            let Some(implementation) = &prepared.implementation else {
                compiled.push(CompiledMethod::without_body(method.clone()));
                continue;
            };
            let appender = implementation.appender(&target, context, method)?;
            let mut code = Code::new();
            let size = appender.apply(&mut code, method)?;
            if !code.is_terminated() {
                return Err(Error::illegal_manipulation(format!("{} does not end in a return or throw", method)));
            }
            trace!("{}: compiled {} into {} instructions", self.instrumented.name, method, code.len());
            compiled.push(CompiledMethod::new(method.clone(), Some(MethodBody::new(code, size))));
        }
        Ok(compiled)
    }
}
