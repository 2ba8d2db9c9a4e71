//! Method descriptions and the tokens used to compare them across hierarchies

use std::fmt;

use super::modifiers::{Modifiers, Visibility};
use super::type_ref::{method_descriptor, package_of, TypeRef};
use crate::consts::{CONSTRUCTOR_NAME, FINALIZE_NAME, OBJECT, TYPE_INITIALIZER_NAME};

/// Name and erased descriptor of a method; two methods with equal tokens share a virtual slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignatureToken {
    pub name: String,
    pub parameters: Vec<TypeRef>,
    pub return_type: TypeRef,
}

impl SignatureToken {
    pub fn new(name: impl Into<String>, parameters: Vec<TypeRef>, return_type: TypeRef) -> Self {
        Self { name: name.into(), parameters, return_type }
    }

    pub fn descriptor(&self) -> String {
        method_descriptor(&self.parameters, &self.return_type)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }
}

impl fmt::Display for SignatureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.descriptor())
    }
}

/// Shape of a method declaration that is not yet bound to a declaring type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodToken {
    pub name: String,
    pub modifiers: Modifiers,
    pub parameters: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub exceptions: Vec<String>,
    pub signature: Option<String>,
}

impl MethodToken {
    pub fn new(name: impl Into<String>, modifiers: Modifiers, parameters: Vec<TypeRef>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            modifiers,
            parameters,
            return_type,
            exceptions: Vec::new(),
            signature: None,
        }
    }

    pub fn constructor(modifiers: Modifiers, parameters: Vec<TypeRef>) -> Self {
        Self::new(CONSTRUCTOR_NAME, modifiers, parameters, TypeRef::void())
    }

    pub fn with_exceptions(mut self, exceptions: Vec<String>) -> Self {
        self.exceptions = exceptions;
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn signature_token(&self) -> SignatureToken {
        SignatureToken::new(self.name.clone(), self.parameters.clone(), self.return_type.clone())
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }
}

/// A method bound to its declaring type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescription {
    pub declaring_type: String,
    /// Whether `declaring_type` is an interface
    pub declared_by_interface: bool,
    pub name: String,
    pub modifiers: Modifiers,
    pub parameters: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub exceptions: Vec<String>,
    pub signature: Option<String>,
}

impl MethodDescription {
    pub fn new(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        modifiers: Modifiers,
        parameters: Vec<TypeRef>,
        return_type: TypeRef,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            declared_by_interface: false,
            name: name.into(),
            modifiers,
            parameters,
            return_type,
            exceptions: Vec::new(),
            signature: None,
        }
    }

    pub fn from_token(declaring_type: impl Into<String>, declared_by_interface: bool, token: &MethodToken) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            declared_by_interface,
            name: token.name.clone(),
            modifiers: token.modifiers,
            parameters: token.parameters.clone(),
            return_type: token.return_type.clone(),
            exceptions: token.exceptions.clone(),
            signature: token.signature.clone(),
        }
    }

    pub fn token(&self) -> MethodToken {
        MethodToken {
            name: self.name.clone(),
            modifiers: self.modifiers,
            parameters: self.parameters.clone(),
            return_type: self.return_type.clone(),
            exceptions: self.exceptions.clone(),
            signature: self.signature.clone(),
        }
    }

    pub fn signature_token(&self) -> SignatureToken {
        SignatureToken::new(self.name.clone(), self.parameters.clone(), self.return_type.clone())
    }

    pub fn descriptor(&self) -> String {
        method_descriptor(&self.parameters, &self.return_type)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn is_type_initializer(&self) -> bool {
        self.name == TYPE_INITIALIZER_NAME
    }

    /// Neither a constructor nor a type initializer
    pub fn is_method(&self) -> bool {
        !self.is_constructor() && !self.is_type_initializer()
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract()
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.is_final()
    }

    pub fn is_private(&self) -> bool {
        self.modifiers.is_private()
    }

    pub fn is_bridge(&self) -> bool {
        self.modifiers.contains(Modifiers::BRIDGE)
    }

    pub fn is_synthetic(&self) -> bool {
        self.modifiers.is_synthetic()
    }

    /// Dispatched through a vtable or itable
    pub fn is_virtual(&self) -> bool {
        self.is_method() && !self.is_static() && !self.is_private()
    }

    /// Non-abstract instance method of an interface
    pub fn is_default_method(&self) -> bool {
        self.declared_by_interface && self.is_virtual() && !self.is_abstract()
    }

    /// `Object.finalize()` as declared by `java.lang.Object` itself
    pub fn is_default_finalizer(&self) -> bool {
        self.declaring_type == OBJECT && self.is_finalizer()
    }

    /// Any `void finalize()` declaration
    pub fn is_finalizer(&self) -> bool {
        self.name == FINALIZE_NAME && self.parameters.is_empty() && self.return_type.is_void()
    }

    /// Local variable slots used by the receiver and the parameters
    pub fn stack_size(&self) -> u16 {
        let receiver = if self.is_static() { 0 } else { 1 };
        receiver + self.parameter_stack_size()
    }

    pub fn parameter_stack_size(&self) -> u16 {
        self.parameters.iter().map(|p| p.stack_size().size()).sum()
    }

    /// Local variable slot of each parameter
    pub fn parameter_offsets(&self) -> Vec<u16> {
        let mut offset = if self.is_static() { 0 } else { 1 };
        self.parameters
            .iter()
            .map(|parameter| {
                let current = offset;
                offset += parameter.stack_size().size();
                current
            })
            .collect()
    }

    /// Whether code in `type_name` may refer to this method
    pub fn is_visible_to(&self, type_name: &str) -> bool {
        match self.modifiers.visibility() {
            Visibility::Public | Visibility::Protected => true,
            Visibility::Package => package_of(&self.declaring_type) == package_of(type_name),
            Visibility::Private => self.declaring_type == type_name,
        }
    }
}

/// Renders like `java.lang.reflect.Method#toString`
impl fmt::Display for MethodDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.modifiers.to_string();
        if !modifiers.is_empty() {
            write!(f, "{} ", modifiers)?;
        }
        let owner = self.declaring_type.replace('/', ".");
        if self.is_constructor() {
            write!(f, "{}(", owner)?;
        } else {
            write!(f, "{} {}.{}(", self.return_type, owner, self.name)?;
        }
        let parameters: Vec<String> = self.parameters.iter().map(|p| p.to_string()).collect();
        write!(f, "{})", parameters.join(","))?;
        if !self.exceptions.is_empty() {
            let exceptions: Vec<String> = self.exceptions.iter().map(|e| e.replace('/', ".")).collect();
            write!(f, " throws {}", exceptions.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compute() -> MethodDescription {
        MethodDescription::new(
            "demo/Base",
            "compute",
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
            vec![TypeRef::long(), TypeRef::int()],
            TypeRef::object("java/lang/String"),
        )
    }

    #[test]
    fn test_signature_token_ignores_declaring_type() {
        let mut other = compute();
        other.declaring_type = "demo/Other".to_string();
        other.modifiers = Modifiers::PUBLIC;
        assert_eq!(compute().signature_token(), other.signature_token());
        assert_ne!(compute(), other);
    }

    #[test]
    fn test_parameter_offsets_account_for_wide_types() {
        let method = compute();
        assert_eq!(method.parameter_offsets(), vec![1, 3]);
        assert_eq!(method.stack_size(), 4);
    }

    #[test]
    fn test_display_matches_reflection_format() {
        assert_eq!(
            compute().to_string(),
            "public abstract java.lang.String demo.Base.compute(long,int)"
        );
    }

    #[test]
    fn test_package_private_visibility() {
        let method = MethodDescription::new("demo/Base", "hidden", Modifiers::EMPTY, vec![], TypeRef::void());
        assert!(method.is_visible_to("demo/Sub"));
        assert!(!method.is_visible_to("other/Sub"));
    }
}
