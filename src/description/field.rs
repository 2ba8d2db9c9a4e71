//! Field descriptions

use super::modifiers::Modifiers;
use super::type_ref::TypeRef;

/// Shape of a field declaration not yet bound to a declaring type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldToken {
    pub name: String,
    pub modifiers: Modifiers,
    pub field_type: TypeRef,
    pub signature: Option<String>,
}

impl FieldToken {
    pub fn new(name: impl Into<String>, field_type: TypeRef, modifiers: Modifiers) -> Self {
        Self { name: name.into(), modifiers, field_type, signature: None }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescription {
    pub declaring_type: String,
    pub name: String,
    pub modifiers: Modifiers,
    pub field_type: TypeRef,
    pub signature: Option<String>,
}

impl FieldDescription {
    pub fn from_token(declaring_type: impl Into<String>, token: &FieldToken) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: token.name.clone(),
            modifiers: token.modifiers,
            field_type: token.field_type.clone(),
            signature: token.signature.clone(),
        }
    }

    pub fn token(&self) -> FieldToken {
        FieldToken {
            name: self.name.clone(),
            modifiers: self.modifiers,
            field_type: self.field_type.clone(),
            signature: self.signature.clone(),
        }
    }

    pub fn descriptor(&self) -> String {
        self.field_type.descriptor()
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }
}
