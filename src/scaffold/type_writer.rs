//! The boundary between the compiled type model and class file serialization

use log::debug;

use crate::bytecode::{AppenderSize, Code, Op};
use crate::classfile::defs::ClassFileVersion;
use crate::common::Result;
use crate::description::{FieldDescription, MethodDescription, Modifiers, TypeDescription};

/// Everything a visitor needs to begin a type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeHeader {
    pub version: ClassFileVersion,
    pub modifiers: Modifiers,
    pub name: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub signature: Option<String>,
}

impl TypeHeader {
    pub fn of(description: &TypeDescription, version: ClassFileVersion) -> Self {
        Self {
            version,
            modifiers: description.modifiers,
            name: description.name.clone(),
            super_class: description.super_class.clone(),
            interfaces: description.interfaces.clone(),
            signature: description.signature.clone(),
        }
    }
}

/// A compiled method body
#[derive(Debug, Clone, PartialEq)]
pub struct MethodBody {
    pub ops: Vec<Op>,
    pub max_stack: u16,
    pub max_locals: u16,
}

impl MethodBody {
    pub fn new(code: Code, size: AppenderSize) -> Self {
        Self {
            ops: code.into_ops(),
            max_stack: size.operand_stack_size,
            max_locals: size.local_variable_size,
        }
    }
}

/// A method together with its body; abstract and native methods have none
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMethod {
    pub description: MethodDescription,
    pub body: Option<MethodBody>,
}

impl CompiledMethod {
    pub fn new(description: MethodDescription, body: Option<MethodBody>) -> Self {
        Self { description, body }
    }

    pub fn without_body(description: MethodDescription) -> Self {
        Self { description, body: None }
    }
}

/// Structural callbacks turning a type into bytes
pub trait ClassVisitor {
    fn visit(&mut self, header: &TypeHeader) -> Result<()>;
    fn visit_field(&mut self, field: &FieldDescription) -> Result<()>;
    fn visit_method(&mut self, method: &MethodDescription, body: Option<&MethodBody>) -> Result<()>;
    fn visit_end(&mut self) -> Result<Vec<u8>>;
}

/// Drives a [`ClassVisitor`] in the fixed order header, fields, methods, accessors, end
pub struct TypeWriter<'a> {
    header: TypeHeader,
    fields: &'a [FieldDescription],
    methods: &'a [CompiledMethod],
    accessors: &'a [CompiledMethod],
}

impl<'a> TypeWriter<'a> {
    pub fn new(
        header: TypeHeader,
        fields: &'a [FieldDescription],
        methods: &'a [CompiledMethod],
        accessors: &'a [CompiledMethod],
    ) -> Self {
        Self { header, fields, methods, accessors }
    }

    pub fn write<V: ClassVisitor>(&self, visitor: &mut V) -> Result<Vec<u8>> {
        debug!(
            "Writing {} with {} fields, {} methods and {} accessors",
            self.header.name,
            self.fields.len(),
            self.methods.len(),
            self.accessors.len()
        );
        visitor.visit(&self.header)?;
        for field in self.fields {
            visitor.visit_field(field)?;
        }
        for method in self.methods.iter().chain(self.accessors) {
            visitor.visit_method(&method.description, method.body.as_ref())?;
        }
        visitor.visit_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{FieldToken, TypeRef};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ClassVisitor for Recorder {
        fn visit(&mut self, header: &TypeHeader) -> Result<()> {
            self.events.push(format!("type {}", header.name));
            Ok(())
        }

        fn visit_field(&mut self, field: &FieldDescription) -> Result<()> {
            self.events.push(format!("field {}", field.name));
            Ok(())
        }

        fn visit_method(&mut self, method: &MethodDescription, body: Option<&MethodBody>) -> Result<()> {
            self.events.push(format!("method {} {}", method.name, body.is_some()));
            Ok(())
        }

        fn visit_end(&mut self) -> Result<Vec<u8>> {
            self.events.push("end".to_string());
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_visit_order() {
        let description = TypeDescription::class("demo/Foo", "java/lang/Object");
        let field = FieldDescription::from_token("demo/Foo", &FieldToken::new("value", TypeRef::int(), Modifiers::PRIVATE));
        let method = |name: &str| {
            CompiledMethod::without_body(MethodDescription::new("demo/Foo", name, Modifiers::ABSTRACT, vec![], TypeRef::void()))
        };
        let methods = vec![method("first")];
        let accessors = vec![method("first$accessor$1")];
        let fields = vec![field];
        let writer = TypeWriter::new(TypeHeader::of(&description, ClassFileVersion::JAVA_V8), &fields, &methods, &accessors);
        let mut recorder = Recorder::default();
        writer.write(&mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            vec!["type demo/Foo", "field value", "method first false", "method first$accessor$1 false", "end"]
        );
    }
}
