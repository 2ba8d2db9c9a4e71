//! The default [`ClassVisitor`]: builds a [`ClassFile`] and serializes it

use log::trace;

use super::attribute::{
    make_code_attribute, make_exceptions_attribute, make_signature_attribute, make_stack_map_attribute, CodeAttribute,
};
use super::class::{ClassFile, FieldInfo, MethodInfo};
use super::code_writer::CodeWriter;
use super::error::ClassGenerationError;
use super::frame::StackMapTable;
use super::writer::ClassfileWritable;
use crate::common::Result;
use crate::consts::OBJECT;
use crate::description::{FieldDescription, MethodDescription, Modifiers};
use crate::scaffold::type_writer::{ClassVisitor, MethodBody, TypeHeader};

/// Writes class files, with `StackMapTable` frames when `emit_frames` is set and the
/// version requires them
#[derive(Debug, Default)]
pub struct ClassFileWriter {
    emit_frames: bool,
    class_file: Option<ClassFile>,
    name: String,
}

impl ClassFileWriter {
    pub fn new(emit_frames: bool) -> Self {
        Self { emit_frames, class_file: None, name: String::new() }
    }

    fn class_file(&mut self) -> std::result::Result<&mut ClassFile, ClassGenerationError> {
        self.class_file.as_mut().ok_or(ClassGenerationError::NotStarted)
    }
}

impl ClassVisitor for ClassFileWriter {
    fn visit(&mut self, header: &TypeHeader) -> Result<()> {
        let mut class_file = ClassFile::new(header.version);
        let pool = &mut class_file.constant_pool;
        let mut modifiers = header.modifiers;
        if !modifiers.is_interface() {
            modifiers |= Modifiers::SUPER;
        }
        class_file.access_flags = modifiers.bits();
        class_file.this_class = pool.add_class(&header.name)?;
        class_file.super_class = pool.add_class(header.super_class.as_deref().unwrap_or(OBJECT))?;
        for interface in &header.interfaces {
            let index = pool.add_class(interface)?;
            class_file.interfaces.push(index);
        }
        if let Some(signature) = &header.signature {
            let attribute = make_signature_attribute(pool, signature)?;
            class_file.attributes.push(attribute);
        }
        self.emit_frames = self.emit_frames && header.version.uses_stack_map_frames();
        self.name = header.name.clone();
        self.class_file = Some(class_file);
        Ok(())
    }

    fn visit_field(&mut self, field: &FieldDescription) -> Result<()> {
        let class_file = self.class_file()?;
        let pool = &mut class_file.constant_pool;
        let mut info = FieldInfo::new(field.modifiers.bits(), pool.add_utf8(&field.name)?, pool.add_utf8(&field.descriptor())?);
        if let Some(signature) = &field.signature {
            info.attributes.push(make_signature_attribute(pool, signature)?);
        }
        class_file.fields.push(info);
        Ok(())
    }

    fn visit_method(&mut self, method: &MethodDescription, body: Option<&MethodBody>) -> Result<()> {
        let emit_frames = self.emit_frames;
        let name = self.name.clone();
        let class_file = self.class_file()?;
        let pool = &mut class_file.constant_pool;
        let mut info = MethodInfo::new(method.modifiers.bits(), pool.add_utf8(&method.name)?, pool.add_utf8(&method.descriptor())?);
        if let Some(body) = body {
            let written = CodeWriter::new(pool, method, &name, emit_frames)
                .write(&body.ops)
                .map_err(|source| ClassGenerationError::Bytecode { method: method.to_string(), source })?;
            trace!("{}: {} bytes of code, {} frames", method, written.code.len(), written.frames.len());
            let mut code = CodeAttribute::new(
                body.max_stack.max(written.max_stack),
                body.max_locals.max(written.max_locals),
                written.code,
            );
            if emit_frames && !written.frames.is_empty() {
                let table = StackMapTable::from_snapshots(&written.initial_locals, &written.frames, pool)?;
                code.attributes.push(make_stack_map_attribute(pool, &table)?);
            }
            info.attributes.push(make_code_attribute(pool, &code)?);
        }
        if !method.exceptions.is_empty() {
            info.attributes.push(make_exceptions_attribute(pool, &method.exceptions)?);
        }
        if let Some(signature) = &method.signature {
            info.attributes.push(make_signature_attribute(pool, signature)?);
        }
        class_file.methods.push(info);
        Ok(())
    }

    fn visit_end(&mut self) -> Result<Vec<u8>> {
        let class_file = self.class_file.take().ok_or(ClassGenerationError::NotStarted)?;
        Ok(class_file.to_classfile_bytes()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::defs::ClassFileVersion;
    use crate::classfile::reader::ClassReader;
    use crate::description::TypeRef;

    #[test]
    fn test_written_class_can_be_read_back() {
        let mut writer = ClassFileWriter::new(true);
        writer
            .visit(&TypeHeader {
                version: ClassFileVersion::JAVA_V8,
                modifiers: Modifiers::PUBLIC,
                name: "demo/Empty".to_string(),
                super_class: Some(OBJECT.to_string()),
                interfaces: vec!["java/lang/Runnable".to_string()],
                signature: None,
            })
            .unwrap();
        let run = MethodDescription::new("demo/Empty", "run", Modifiers::PUBLIC | Modifiers::ABSTRACT, vec![], TypeRef::void());
        writer.visit_method(&run, None).unwrap();
        let bytes = writer.visit_end().unwrap();
        let parsed = ClassReader::new(&bytes).read().unwrap();
        assert_eq!(parsed.name, "demo/Empty");
        assert_eq!(parsed.access_flags, (Modifiers::PUBLIC | Modifiers::SUPER).bits());
        assert_eq!(parsed.interfaces, vec!["java/lang/Runnable"]);
        assert!(parsed.method("run", "()V").unwrap().code.is_none());
    }

    #[test]
    fn test_method_before_visit_fails() {
        let mut writer = ClassFileWriter::new(false);
        let run = MethodDescription::new("demo/Empty", "run", Modifiers::PUBLIC, vec![], TypeRef::void());
        assert!(writer.visit_method(&run, None).is_err());
    }
}
