//! Parsing of class files into descriptions
//!
//! Only the surface needed to describe a type is decoded: header, fields, methods and the
//! `Signature`, `Exceptions` and `Code` attributes. Everything else is skipped.

use super::constpool::{constant_tags::*, decode_modified_utf8, Constant, ConstantPool};
use super::defs::{access_flags::ACC_INTERFACE, attribute_names, ClassFileVersion, MAGIC};
use super::error::ClassFormatError;
use crate::description::{
    parse_method_descriptor, FieldDescription, MethodDescription, Modifiers, TypeDescription, TypeRef,
};

type ReadResult<T> = Result<T, ClassFormatError>;

/// Body of a `Code` attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCode {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    /// Names of the nested attributes, e.g. `StackMapTable`
    pub attributes: Vec<(String, Vec<u8>)>,
}

impl ParsedCode {
    pub fn attribute(&self, name: &str) -> Option<&[u8]> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, info)| info.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMember {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
    pub code: Option<ParsedCode>,
}

#[derive(Debug, Clone)]
pub struct ParsedClass {
    pub version: ClassFileVersion,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub name: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ParsedMember>,
    pub methods: Vec<ParsedMember>,
    pub signature: Option<String>,
}

impl ParsedClass {
    pub fn method(&self, name: &str, descriptor: &str) -> Option<&ParsedMember> {
        self.methods.iter().find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn field(&self, name: &str) -> Option<&ParsedMember> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn to_type_description(&self) -> ReadResult<TypeDescription> {
        let interface = self.access_flags & ACC_INTERFACE != 0;
        let mut description = TypeDescription::new(
            self.name.clone(),
            Modifiers::from_bits(self.access_flags),
            if interface { None } else { self.super_class.as_deref() },
        );
        description.interfaces = self.interfaces.clone();
        description.signature = self.signature.clone();
        for field in &self.fields {
            description.fields.push(FieldDescription {
                declaring_type: self.name.clone(),
                name: field.name.clone(),
                modifiers: Modifiers::from_bits(field.access_flags),
                field_type: TypeRef::parse_descriptor(&field.descriptor)?,
                signature: field.signature.clone(),
            });
        }
        for method in &self.methods {
            let (parameters, return_type) = parse_method_descriptor(&method.descriptor)?;
            let mut described = MethodDescription::new(
                self.name.clone(),
                method.name.clone(),
                Modifiers::from_bits(method.access_flags),
                parameters,
                return_type,
            );
            described.declared_by_interface = interface;
            described.exceptions = method.exceptions.clone();
            described.signature = method.signature.clone();
            description.methods.push(described);
        }
        Ok(description)
    }
}

/// Cursor over class file bytes
pub struct ClassReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ClassReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn take(&mut self, length: usize) -> ReadResult<&'a [u8]> {
        let end = self.position.checked_add(length).filter(|end| *end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.position..end];
                self.position = end;
                Ok(slice)
            }
            None => Err(ClassFormatError::UnexpectedEof(self.position)),
        }
    }

    fn u1(&mut self) -> ReadResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u2(&mut self) -> ReadResult<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u4(&mut self) -> ReadResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn u8(&mut self) -> ReadResult<u64> {
        Ok(((self.u4()? as u64) << 32) | self.u4()? as u64)
    }

    pub fn read(mut self) -> ReadResult<ParsedClass> {
        let magic = self.u4()?;
        if magic != MAGIC {
            return Err(ClassFormatError::InvalidMagic(magic));
        }
        let minor = self.u2()?;
        let major = self.u2()?;
        let constant_pool = self.read_constant_pool()?;
        let access_flags = self.u2()?;
        let name = constant_pool.class_name(self.u2()?)?.to_string();
        let super_index = self.u2()?;
        let super_class = if super_index == 0 {
            None
        } else {
            Some(constant_pool.class_name(super_index)?.to_string())
        };
        let interface_count = self.u2()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(constant_pool.class_name(self.u2()?)?.to_string());
        }
        let fields = self.read_members(&constant_pool)?;
        let methods = self.read_members(&constant_pool)?;
        let mut signature = None;
        for (attribute_name, info) in self.read_attributes(&constant_pool)? {
            if attribute_name == attribute_names::SIGNATURE {
                signature = Some(signature_of(&constant_pool, &info)?);
            }
        }
        Ok(ParsedClass {
            version: ClassFileVersion { major, minor },
            constant_pool,
            access_flags,
            name,
            super_class,
            interfaces,
            fields,
            methods,
            signature,
        })
    }

    fn read_constant_pool(&mut self) -> ReadResult<ConstantPool> {
        let count = self.u2()?;
        let mut pool = ConstantPool::new();
        let mut index = 1u16;
        while index < count {
            let tag = self.u1()?;
            let constant = match tag {
                CONSTANT_UTF8 => {
                    let length = self.u2()? as usize;
                    let bytes = self.take(length)?;
                    Constant::Utf8(decode_modified_utf8(bytes).ok_or(ClassFormatError::InvalidUtf8(index))?)
                }
                CONSTANT_INTEGER => Constant::Integer(self.u4()? as i32),
                CONSTANT_FLOAT => Constant::Float(f32::from_bits(self.u4()?)),
                CONSTANT_LONG => Constant::Long(self.u8()? as i64),
                CONSTANT_DOUBLE => Constant::Double(f64::from_bits(self.u8()?)),
                CONSTANT_CLASS => Constant::Class(self.u2()?),
                CONSTANT_STRING => Constant::String(self.u2()?),
                CONSTANT_FIELDREF => Constant::FieldRef(self.u2()?, self.u2()?),
                CONSTANT_METHODREF => Constant::MethodRef(self.u2()?, self.u2()?),
                CONSTANT_INTERFACEMETHODREF => Constant::InterfaceMethodRef(self.u2()?, self.u2()?),
                CONSTANT_NAMEANDTYPE => Constant::NameAndType(self.u2()?, self.u2()?),
                CONSTANT_METHODHANDLE => Constant::MethodHandle(self.u1()?, self.u2()?),
                CONSTANT_METHODTYPE => Constant::MethodType(self.u2()?),
                CONSTANT_DYNAMIC => Constant::Dynamic(self.u2()?, self.u2()?),
                CONSTANT_INVOKEDYNAMIC => Constant::InvokeDynamic(self.u2()?, self.u2()?),
                CONSTANT_MODULE => Constant::Module(self.u2()?),
                CONSTANT_PACKAGE => Constant::Package(self.u2()?),
                tag => return Err(ClassFormatError::InvalidConstantTag { tag, index }),
            };
            let width = constant.width();
            pool.insert_at(index, constant);
            index = index.saturating_add(width);
        }
        Ok(pool)
    }

    fn read_members(&mut self, pool: &ConstantPool) -> ReadResult<Vec<ParsedMember>> {
        let count = self.u2()?;
        let mut members = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let access_flags = self.u2()?;
            let name = pool.utf8(self.u2()?)?.to_string();
            let descriptor = pool.utf8(self.u2()?)?.to_string();
            let mut member = ParsedMember {
                access_flags,
                name,
                descriptor,
                signature: None,
                exceptions: Vec::new(),
                code: None,
            };
            for (attribute_name, info) in self.read_attributes(pool)? {
                match attribute_name.as_str() {
                    attribute_names::SIGNATURE => member.signature = Some(signature_of(pool, &info)?),
                    attribute_names::EXCEPTIONS => member.exceptions = exceptions_of(pool, &info)?,
                    attribute_names::CODE => member.code = Some(code_of(pool, &info)?),
                    _ => {}
                }
            }
            members.push(member);
        }
        Ok(members)
    }

    fn read_attributes(&mut self, pool: &ConstantPool) -> ReadResult<Vec<(String, Vec<u8>)>> {
        let count = self.u2()?;
        let mut attributes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name = pool.utf8(self.u2()?)?.to_string();
            let length = self.u4()? as usize;
            attributes.push((name, self.take(length)?.to_vec()));
        }
        Ok(attributes)
    }
}

fn signature_of(pool: &ConstantPool, info: &[u8]) -> ReadResult<String> {
    let mut reader = ClassReader::new(info);
    Ok(pool.utf8(reader.u2()?)?.to_string())
}

fn exceptions_of(pool: &ConstantPool, info: &[u8]) -> ReadResult<Vec<String>> {
    let mut reader = ClassReader::new(info);
    let count = reader.u2()?;
    (0..count)
        .map(|_| -> ReadResult<String> { Ok(pool.class_name(reader.u2()?)?.to_string()) })
        .collect()
}

fn code_of(pool: &ConstantPool, info: &[u8]) -> ReadResult<ParsedCode> {
    let mut reader = ClassReader::new(info);
    let max_stack = reader.u2()?;
    let max_locals = reader.u2()?;
    let length = reader.u4()? as usize;
    let code = reader.take(length)?.to_vec();
    let handlers = reader.u2()? as usize;
    reader.take(handlers * 8)?;
    let attributes = reader.read_attributes(pool)?;
    Ok(ParsedCode { max_stack, max_locals, code, attributes })
}
