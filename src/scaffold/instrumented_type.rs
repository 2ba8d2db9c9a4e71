//! The type being built

use log::trace;

use crate::common::{Error, Result};
use crate::consts::OBJECT;
use crate::description::{FieldToken, MethodToken, Modifiers, TypeDescription};

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const", "continue",
    "default", "do", "double", "else", "enum", "extends", "false", "final", "finally", "float", "for", "goto", "if",
    "implements", "import", "instanceof", "int", "interface", "long", "native", "new", "null", "package", "private",
    "protected", "public", "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this",
    "throw", "throws", "transient", "true", "try", "void", "volatile", "while",
];

/// A type under construction; every addition yields a new value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentedType {
    description: TypeDescription,
}

impl InstrumentedType {
    /// A subclass of `super_type`; subclassing an interface extends `Object` and implements it
    pub fn subclass(name: impl Into<String>, modifiers: Modifiers, super_type: &TypeDescription) -> Self {
        let name = name.into();
        let description = if super_type.is_interface() {
            TypeDescription::new(name, modifiers, Some(OBJECT)).with_interface(super_type.name.clone())
        } else {
            TypeDescription::new(name, modifiers, Some(&super_type.name))
        };
        Self { description }
    }

    pub fn description(&self) -> &TypeDescription {
        &self.description
    }

    pub fn into_description(self) -> TypeDescription {
        self.description
    }

    pub fn name(&self) -> &str {
        &self.description.name
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        for method in &mut self.description.methods {
            method.declaring_type = name.clone();
        }
        for field in &mut self.description.fields {
            field.declaring_type = name.clone();
        }
        self.description.name = name;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.description.modifiers = modifiers;
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.description.signature = Some(signature.into());
        self
    }

    /// Add interfaces not yet implemented
    pub fn with_interfaces(mut self, interfaces: impl IntoIterator<Item = String>) -> Self {
        for interface in interfaces {
            if !self.description.interfaces.contains(&interface) {
                self.description.interfaces.push(interface);
            }
        }
        self
    }

    pub fn with_field(self, token: FieldToken) -> Result<Self> {
        if self.description.find_field(&token.name).is_some() {
            return Err(Error::DuplicateField { type_name: self.description.name.clone(), name: token.name });
        }
        trace!("{}: adding field {}", self.description.name, token.name);
        Ok(Self { description: self.description.with_field(token) })
    }

    pub fn with_method(self, token: MethodToken) -> Result<Self> {
        let signature = token.signature_token();
        if self.description.find_method(&signature).is_some() {
            return Err(Error::DuplicateMethod {
                type_name: self.description.name.clone(),
                signature: signature.to_string(),
            });
        }
        trace!("{}: adding method {}", self.description.name, signature);
        Ok(Self { description: self.description.with_method(token) })
    }

    /// Check names and modifiers of the type and its members
    pub fn validate(&self) -> Result<()> {
        let description = &self.description;
        validate_binary_name(&description.name)?;
        let modifiers = description.modifiers;
        if !modifiers.has_single_visibility()
            || modifiers.is_private()
            || modifiers.is_protected()
            || (modifiers.is_final() && modifiers.is_abstract())
            || (modifiers.is_interface() && !modifiers.is_abstract())
        {
            return Err(illegal(&description.name, modifiers));
        }
        for field in &description.fields {
            validate_identifier(&field.name)?;
            let illegal_field = !field.modifiers.has_single_visibility()
                || field.modifiers.is_abstract()
                || (field.modifiers.is_final() && field.modifiers.contains(Modifiers::VOLATILE));
            if illegal_field {
                return Err(illegal(&format!("{}.{}", description.name, field.name), field.modifiers));
            }
        }
        for method in &description.methods {
            if method.is_method() {
                validate_identifier(&method.name)?;
            }
            let mods = method.modifiers;
            let abstract_conflict = mods.is_abstract()
                && (mods.is_final() || mods.is_static() || mods.is_private() || mods.is_native()
                    || !description.is_abstract());
            let constructor_conflict = method.is_constructor() && (mods.is_static() || mods.is_abstract());
            if !mods.has_single_visibility() || abstract_conflict || constructor_conflict {
                return Err(illegal(&method.to_string(), mods));
            }
        }
        Ok(())
    }
}

fn illegal(target: &str, modifiers: Modifiers) -> Error {
    Error::IllegalModifiers { target: target.to_string(), modifiers: modifiers.bits() }
}

fn validate_binary_name(name: &str) -> Result<()> {
    name.split('/').try_for_each(validate_identifier)
}

fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars.next().map(|c| c.is_alphabetic() || c == '_' || c == '$').unwrap_or(false);
    let valid_rest = chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if !valid_start || !valid_rest || JAVA_KEYWORDS.contains(&name) {
        return Err(Error::InvalidName { name: name.to_string() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::TypeRef;

    fn base() -> InstrumentedType {
        InstrumentedType::subclass("demo/Foo", Modifiers::PUBLIC, &TypeDescription::class(OBJECT, OBJECT))
    }

    #[test]
    fn test_duplicate_members_are_rejected() {
        let token = FieldToken::new("value", TypeRef::int(), Modifiers::PRIVATE);
        let instrumented = base().with_field(token.clone()).unwrap();
        assert!(matches!(instrumented.clone().with_field(token), Err(Error::DuplicateField { .. })));

        let method = MethodToken::new("run", Modifiers::PUBLIC, vec![], TypeRef::void());
        let instrumented = instrumented.with_method(method.clone()).unwrap();
        assert!(matches!(instrumented.with_method(method), Err(Error::DuplicateMethod { .. })));
    }

    #[test]
    fn test_interface_super_type_becomes_interface() {
        let runnable = TypeDescription::interface("java/lang/Runnable");
        let instrumented = InstrumentedType::subclass("demo/Task", Modifiers::PUBLIC, &runnable);
        assert_eq!(instrumented.description().super_class.as_deref(), Some(OBJECT));
        assert_eq!(instrumented.description().interfaces, vec!["java/lang/Runnable"]);
    }

    #[test]
    fn test_validation() {
        assert!(base().validate().is_ok());
        let bad_name = base().with_name("demo/class");
        assert!(matches!(bad_name.validate(), Err(Error::InvalidName { .. })));
        let abstract_in_concrete = base()
            .with_method(MethodToken::new("run", Modifiers::PUBLIC | Modifiers::ABSTRACT, vec![], TypeRef::void()))
            .unwrap();
        assert!(matches!(abstract_in_concrete.validate(), Err(Error::IllegalModifiers { .. })));
        let final_abstract = base().with_modifiers(Modifiers::PUBLIC | Modifiers::FINAL | Modifiers::ABSTRACT);
        assert!(final_abstract.validate().is_err());
    }
}
