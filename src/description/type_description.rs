//! Descriptions of classes and interfaces

use std::fmt;

use super::field::{FieldDescription, FieldToken};
use super::method::{MethodDescription, MethodToken, SignatureToken};
use super::modifiers::{Modifiers, Visibility};
use super::type_ref::{package_of, TypeRef};

/// An immutable description of a class or interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescription {
    pub name: String,
    pub modifiers: Modifiers,
    /// Absent for `java/lang/Object` and for interfaces
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldDescription>,
    pub methods: Vec<MethodDescription>,
    pub signature: Option<String>,
}

impl TypeDescription {
    pub fn new(name: impl Into<String>, modifiers: Modifiers, super_class: Option<&str>) -> Self {
        Self {
            name: name.into(),
            modifiers,
            super_class: super_class.map(str::to_string),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            signature: None,
        }
    }

    /// A public class extending `super_class`
    pub fn class(name: impl Into<String>, super_class: &str) -> Self {
        Self::new(name, Modifiers::PUBLIC, Some(super_class))
    }

    /// A public interface
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, Modifiers::PUBLIC | Modifiers::INTERFACE | Modifiers::ABSTRACT, None)
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_method(mut self, token: MethodToken) -> Self {
        let interface = self.is_interface();
        self.methods.push(MethodDescription::from_token(self.name.clone(), interface, &token));
        self
    }

    pub fn with_field(mut self, token: FieldToken) -> Self {
        self.fields.push(FieldDescription::from_token(self.name.clone(), &token));
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn as_type_ref(&self) -> TypeRef {
        TypeRef::Reference(self.name.clone())
    }

    pub fn is_interface(&self) -> bool {
        self.modifiers.is_interface()
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract()
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.is_final()
    }

    pub fn package(&self) -> &str {
        package_of(&self.name)
    }

    pub fn simple_name(&self) -> &str {
        let start = self.name.rfind('/').map(|index| index + 1).unwrap_or(0);
        &self.name[start..]
    }

    /// Whether code in `type_name` may refer to this type
    pub fn is_visible_to(&self, type_name: &str) -> bool {
        match self.modifiers.visibility() {
            Visibility::Public => true,
            _ => self.package() == package_of(type_name),
        }
    }

    pub fn declared_constructors(&self) -> impl Iterator<Item = &MethodDescription> {
        self.methods.iter().filter(|method| method.is_constructor())
    }

    /// Declared methods excluding constructors and the type initializer
    pub fn declared_methods(&self) -> impl Iterator<Item = &MethodDescription> {
        self.methods.iter().filter(|method| method.is_method())
    }

    pub fn find_method(&self, token: &SignatureToken) -> Option<&MethodDescription> {
        self.methods.iter().find(|method| method.signature_token() == *token)
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldDescription> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Direct supertypes, superclass first
    pub fn direct_supertypes(&self) -> impl Iterator<Item = &str> {
        self.super_class.iter().map(String::as_str).chain(self.interfaces.iter().map(String::as_str))
    }
}

impl fmt::Display for TypeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_interface() { "interface" } else { "class" };
        write!(f, "{} {}", kind, self.name.replace('/', "."))
    }
}
