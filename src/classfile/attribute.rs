//! Attributes written into class files

use super::constpool::ConstantPool;
use super::defs::attribute_names;
use super::error::ConstPoolResult;
use super::frame::StackMapTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub info: Vec<u8>,
}

impl AttributeInfo {
    pub fn new(name_index: u16, info: Vec<u8>) -> Self {
        Self { name_index, info }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(6 + self.info.len());
        bytes.extend_from_slice(&self.name_index.to_be_bytes());
        bytes.extend_from_slice(&(self.info.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.info);
        bytes
    }
}

#[derive(Debug, Clone)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub attributes: Vec<AttributeInfo>,
}

impl CodeAttribute {
    pub fn new(max_stack: u16, max_locals: u16, code: Vec<u8>) -> Self {
        Self { max_stack, max_locals, code, attributes: Vec::new() }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.max_stack.to_be_bytes());
        bytes.extend_from_slice(&self.max_locals.to_be_bytes());
        bytes.extend_from_slice(&(self.code.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.code);
        // generated bodies carry no exception handlers
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for attribute in &self.attributes {
            bytes.extend_from_slice(&attribute.to_bytes());
        }
        bytes
    }
}

pub fn make_code_attribute(pool: &mut ConstantPool, code: &CodeAttribute) -> ConstPoolResult<AttributeInfo> {
    let name_index = pool.add_utf8(attribute_names::CODE)?;
    Ok(AttributeInfo::new(name_index, code.to_bytes()))
}

pub fn make_stack_map_attribute(pool: &mut ConstantPool, table: &StackMapTable) -> ConstPoolResult<AttributeInfo> {
    let name_index = pool.add_utf8(attribute_names::STACK_MAP_TABLE)?;
    Ok(AttributeInfo::new(name_index, table.to_bytes()))
}

pub fn make_signature_attribute(pool: &mut ConstantPool, signature: &str) -> ConstPoolResult<AttributeInfo> {
    let name_index = pool.add_utf8(attribute_names::SIGNATURE)?;
    let signature_index = pool.add_utf8(signature)?;
    Ok(AttributeInfo::new(name_index, signature_index.to_be_bytes().to_vec()))
}

pub fn make_exceptions_attribute(pool: &mut ConstantPool, exceptions: &[String]) -> ConstPoolResult<AttributeInfo> {
    let name_index = pool.add_utf8(attribute_names::EXCEPTIONS)?;
    let mut info = Vec::with_capacity(2 + exceptions.len() * 2);
    info.extend_from_slice(&(exceptions.len() as u16).to_be_bytes());
    for exception in exceptions {
        info.extend_from_slice(&pool.add_class(exception)?.to_be_bytes());
    }
    Ok(AttributeInfo::new(name_index, info))
}
