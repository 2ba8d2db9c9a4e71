//! The fluent entry point for defining a new type
//!
//! ```ignore
//! let weaver = ClassWeaver::new(Config::default());
//! let dynamic = weaver
//!     .subclass("java.lang.Object")?
//!     .name("demo.Greeter")
//!     .method(ElementMatcher::named("toString"))
//!     .intercept(Implementation::FixedValue(Value::Text("hello".into())))
//!     .make()?;
//! ```

use std::sync::Arc;

use log::debug;

use super::{write_type, DynamicType};
use crate::auxiliary::naming::{compose, next_suffix};
use crate::common::{Config, Error, Result};
use crate::consts::{DEFAULT_NAME_INFIX, DEFAULT_PACKAGE, OBJECT};
use crate::description::{internal_name, FieldToken, MethodToken, Modifiers, TypeDescription, TypeRef};
use crate::implementation::{Implementation, ImplementationContext};
use crate::pool::TypePool;
use crate::scaffold::{ConstructorStrategy, ElementMatcher, InstrumentedType, MethodRegistry};

/// Creates builders sharing one configuration and type pool
#[derive(Debug, Clone)]
pub struct ClassWeaver {
    config: Config,
    pool: Arc<TypePool>,
}

impl Default for ClassWeaver {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl ClassWeaver {
    pub fn new(config: Config) -> Self {
        Self::with_pool(config, Arc::new(TypePool::new()))
    }

    pub fn with_pool(config: Config, pool: Arc<TypePool>) -> Self {
        Self { config, pool }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &Arc<TypePool> {
        &self.pool
    }

    /// Start a new type extending `super_type`, or implementing it when it is an interface
    pub fn subclass(&self, super_type: &str) -> Result<Builder> {
        let super_type = self.pool.describe(&internal_name(super_type))?;
        if super_type.is_final() {
            return Err(Error::config(format!("cannot subclass final type {}", super_type.name)));
        }
        debug!("Subclassing {}", super_type.name);
        Ok(Builder {
            config: self.config.clone(),
            pool: Arc::clone(&self.pool),
            super_type,
            name: None,
            modifiers: Modifiers::PUBLIC,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            registry: MethodRegistry::new(),
            ignored: ElementMatcher::default(),
            constructor_strategy: ConstructorStrategy::default(),
            signature: None,
        })
    }
}

/// The definition of one dynamic type
#[derive(Debug, Clone)]
pub struct Builder {
    config: Config,
    pool: Arc<TypePool>,
    super_type: Arc<TypeDescription>,
    name: Option<String>,
    modifiers: Modifiers,
    interfaces: Vec<String>,
    fields: Vec<FieldToken>,
    methods: Vec<MethodToken>,
    registry: MethodRegistry,
    ignored: ElementMatcher,
    constructor_strategy: ConstructorStrategy,
    signature: Option<String>,
}

impl Builder {
    /// Binary or internal name of the new type
    pub fn name(mut self, name: impl AsRef<str>) -> Self {
        self.name = Some(internal_name(name.as_ref()));
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn implement(mut self, interface: impl AsRef<str>) -> Self {
        let interface = internal_name(interface.as_ref());
        if !self.interfaces.contains(&interface) {
            self.interfaces.push(interface);
        }
        self
    }

    pub fn define_field(mut self, name: impl Into<String>, field_type: TypeRef, modifiers: Modifiers) -> Self {
        self.fields.push(FieldToken::new(name, field_type, modifiers));
        self
    }

    pub fn define_method(
        self,
        name: impl Into<String>,
        return_type: TypeRef,
        parameters: Vec<TypeRef>,
        modifiers: Modifiers,
    ) -> MethodDefinition {
        let token = MethodToken::new(name, modifiers, parameters, return_type);
        MethodDefinition { builder: self, token }
    }

    pub fn define_constructor(self, parameters: Vec<TypeRef>, modifiers: Modifiers) -> MethodDefinition {
        MethodDefinition { builder: self, token: MethodToken::constructor(modifiers, parameters) }
    }

    /// Select methods to intercept; later selections take precedence over earlier ones
    ///
    /// Constructors and type initializers are never selected, see [`Builder::constructor`].
    pub fn method(self, matcher: ElementMatcher) -> MethodInterception {
        MethodInterception { builder: self, matcher: ElementMatcher::IsMethod.and(matcher) }
    }

    /// Select constructors to intercept; the implementation must invoke a super or sibling
    /// constructor itself
    pub fn constructor(self, matcher: ElementMatcher) -> MethodInterception {
        MethodInterception { builder: self, matcher: ElementMatcher::IsConstructor.and(matcher) }
    }

    /// Keep methods matched by `matcher` out of the inherited method graph
    pub fn ignore_also(mut self, matcher: ElementMatcher) -> Self {
        self.ignored = self.ignored.or(matcher);
        self
    }

    pub fn constructor_strategy(mut self, strategy: ConstructorStrategy) -> Self {
        self.constructor_strategy = strategy;
        self
    }

    /// Generic signature of the type
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Compile the type and every auxiliary type it needs
    pub fn make(self) -> Result<DynamicType> {
        let name = self.name.clone().unwrap_or_else(|| self.default_name());
        let mut registry = self.registry;
        let mut instrumented = InstrumentedType::subclass(name.as_str(), self.modifiers, &self.super_type)
            .with_interfaces(self.interfaces.iter().cloned());
        if let Some(signature) = self.signature {
            instrumented = instrumented.with_signature(signature);
        }
        for interface in &self.interfaces {
            if !self.pool.describe(interface)?.is_interface() {
                return Err(Error::config(format!("{} cannot implement class {}", name, interface)));
            }
        }
        for field in self.fields {
            instrumented = instrumented.with_field(field)?;
        }

        let constructor_source = if self.super_type.is_interface() {
            self.pool.describe(OBJECT)?
        } else {
            Arc::clone(&self.super_type)
        };
        for constructor in self.constructor_strategy.extract_constructors(&constructor_source, &name)? {
            instrumented = instrumented.with_method(constructor)?;
        }
        self.constructor_strategy.inject(&mut registry);
        for method in self.methods {
            instrumented = instrumented.with_method(method)?;
        }
        if self.config.type_validation {
            instrumented.validate()?;
        }

        let prepared = registry.prepare(instrumented, &self.pool, &self.ignored)?;
        let mut context = ImplementationContext::new(prepared.instrumented(), &self.config);
        let methods = prepared.compile(&self.pool, &mut context)?;
        let (accessors, auxiliary) = context.into_parts();

        let mut description = prepared.instrumented().clone();
        description.methods.extend(accessors.iter().map(|accessor| accessor.description.clone()));
        let bytes = write_type(&description, &methods, &accessors, &self.config)?;
        debug!(
            "Made {}: {} methods, {} accessors, {} auxiliary types, {} bytes",
            name,
            methods.len(),
            accessors.len(),
            auxiliary.len(),
            bytes.len()
        );
        Ok(DynamicType::new(description, bytes, auxiliary))
    }

    /// `{super}$ClassWeave${n}`, moved out of `java/` packages
    fn default_name(&self) -> String {
        let base = if self.super_type.name.starts_with("java/") {
            format!("{}/{}", DEFAULT_PACKAGE, self.super_type.simple_name())
        } else {
            self.super_type.name.clone()
        };
        compose(&base, DEFAULT_NAME_INFIX, &next_suffix().to_string())
    }
}

/// A builder waiting for the implementation of the selected methods
#[derive(Debug)]
pub struct MethodInterception {
    builder: Builder,
    matcher: ElementMatcher,
}

impl MethodInterception {
    pub fn intercept(mut self, implementation: Implementation) -> Builder {
        self.builder.registry.prepend(self.matcher, implementation);
        self.builder
    }
}

/// A builder waiting for the body of a newly declared method
#[derive(Debug)]
pub struct MethodDefinition {
    builder: Builder,
    token: MethodToken,
}

impl MethodDefinition {
    pub fn intercept(mut self, implementation: Implementation) -> Builder {
        let matcher = ElementMatcher::HasSignature(self.token.signature_token());
        self.builder.registry.prepend(matcher, implementation);
        self.builder.methods.push(self.token);
        self.builder
    }

    /// Declare the method abstract
    pub fn without_code(mut self) -> Builder {
        self.token.modifiers = self.token.modifiers.union(Modifiers::ABSTRACT);
        self.builder.methods.push(self.token);
        self.builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::reader::ClassReader;
    use crate::consts::{RUNNABLE, STRING, UNSUPPORTED_OPERATION_EXCEPTION};
    use crate::implementation::Value;

    fn weaver() -> ClassWeaver {
        ClassWeaver::new(Config::default())
    }

    #[test]
    fn test_unnamed_type_leaves_java_packages() {
        let dynamic = weaver().subclass("java.lang.Object").unwrap().make().unwrap();
        assert!(dynamic.name().starts_with("classweave/generated/Object$ClassWeave$"));
    }

    #[test]
    fn test_intercepted_method_is_written() {
        let dynamic = weaver()
            .subclass(OBJECT)
            .unwrap()
            .name("demo.Greeter")
            .method(ElementMatcher::named("toString"))
            .intercept(Implementation::FixedValue(Value::Text("hello".into())))
            .make()
            .unwrap();
        assert_eq!(dynamic.name(), "demo/Greeter");
        let parsed = ClassReader::new(&dynamic.bytes).read().unwrap();
        assert!(parsed.method("toString", "()Ljava/lang/String;").is_some());
        assert!(parsed.method("<init>", "()V").is_some());
    }

    #[test]
    fn test_method_selection_skips_constructors() {
        let dynamic = weaver()
            .subclass(OBJECT)
            .unwrap()
            .name("demo/Stubbed")
            .method(ElementMatcher::Any)
            .intercept(Implementation::StubValue)
            .make()
            .unwrap();
        let parsed = ClassReader::new(&dynamic.bytes).read().unwrap();
        let code = &parsed.method("<init>", "()V").unwrap().code.as_ref().unwrap().code;
        // aload_0, invokespecial java/lang/Object.<init>, return
        assert_eq!(code.len(), 5);
        assert_eq!(code[0], 0x2a);
        assert_eq!(code[1], 0xb7);
        let index = u16::from_be_bytes([code[2], code[3]]);
        assert_eq!(parsed.constant_pool.member_ref(index).unwrap(), (OBJECT, "<init>", "()V"));
        let to_string = &parsed.method("toString", "()Ljava/lang/String;").unwrap().code.as_ref().unwrap().code;
        assert_eq!(to_string.as_slice(), &[0x01, 0xb0]);
    }

    #[test]
    fn test_constructor_selection() {
        let dynamic = weaver()
            .subclass(OBJECT)
            .unwrap()
            .name("demo/Unconstructable")
            .constructor(ElementMatcher::Any)
            .intercept(Implementation::exception(UNSUPPORTED_OPERATION_EXCEPTION, "sealed"))
            .make()
            .unwrap();
        let parsed = ClassReader::new(&dynamic.bytes).read().unwrap();
        let code = &parsed.method("<init>", "()V").unwrap().code.as_ref().unwrap().code;
        assert_eq!(code.last(), Some(&0xbf));
        assert!(parsed.method("toString", "()Ljava/lang/String;").is_none());
    }

    #[test]
    fn test_defined_members() {
        let dynamic = weaver()
            .subclass(OBJECT)
            .unwrap()
            .name("demo/Holder")
            .implement(RUNNABLE)
            .define_field("value", TypeRef::object(STRING), Modifiers::PRIVATE)
            .define_method("getValue", TypeRef::object(STRING), vec![], Modifiers::PUBLIC)
            .intercept(Implementation::field_accessor("value"))
            .define_method("run", TypeRef::void(), vec![], Modifiers::PUBLIC)
            .intercept(Implementation::StubValue)
            .make()
            .unwrap();
        let parsed = ClassReader::new(&dynamic.bytes).read().unwrap();
        assert_eq!(parsed.interfaces, vec![RUNNABLE]);
        assert!(parsed.field("value").is_some());
        assert!(parsed.method("getValue", "()Ljava/lang/String;").is_some());
        assert!(parsed.method("run", "()V").is_some());
    }

    #[test]
    fn test_configuration_errors() {
        let duplicate = weaver()
            .subclass(OBJECT)
            .unwrap()
            .define_field("x", TypeRef::int(), Modifiers::PRIVATE)
            .define_field("x", TypeRef::long(), Modifiers::PRIVATE)
            .make();
        assert!(matches!(duplicate, Err(Error::DuplicateField { .. })));

        let not_an_interface = weaver().subclass(OBJECT).unwrap().implement(STRING).make();
        assert!(matches!(not_an_interface, Err(Error::Config { .. })));

        assert!(weaver().subclass(STRING).is_err());

        let invalid = weaver().subclass(OBJECT).unwrap().name("demo/class").make();
        assert!(matches!(invalid, Err(Error::InvalidName { .. })));
    }

    #[test]
    fn test_abstract_method_definition() {
        let dynamic = weaver()
            .subclass(OBJECT)
            .unwrap()
            .name("demo/Shape")
            .modifiers(Modifiers::PUBLIC | Modifiers::ABSTRACT)
            .define_method("area", TypeRef::primitive(crate::description::PrimitiveType::Double), vec![], Modifiers::PUBLIC)
            .without_code()
            .make()
            .unwrap();
        let parsed = ClassReader::new(&dynamic.bytes).read().unwrap();
        let area = parsed.method("area", "()D").unwrap();
        assert!(area.code.is_none());
    }
}
