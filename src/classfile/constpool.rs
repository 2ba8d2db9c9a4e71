//! Constant pool and constants for Java class files

use std::collections::HashMap;

use super::error::{ConstPoolError, ConstPoolResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    Dynamic(u16, u16),
    InvokeDynamic(u16, u16),
    Module(u16),
    Package(u16),
}

pub mod constant_tags {
    pub const CONSTANT_UTF8: u8 = 1;
    pub const CONSTANT_INTEGER: u8 = 3;
    pub const CONSTANT_FLOAT: u8 = 4;
    pub const CONSTANT_LONG: u8 = 5;
    pub const CONSTANT_DOUBLE: u8 = 6;
    pub const CONSTANT_CLASS: u8 = 7;
    pub const CONSTANT_STRING: u8 = 8;
    pub const CONSTANT_FIELDREF: u8 = 9;
    pub const CONSTANT_METHODREF: u8 = 10;
    pub const CONSTANT_INTERFACEMETHODREF: u8 = 11;
    pub const CONSTANT_NAMEANDTYPE: u8 = 12;
    pub const CONSTANT_METHODHANDLE: u8 = 15;
    pub const CONSTANT_METHODTYPE: u8 = 16;
    pub const CONSTANT_DYNAMIC: u8 = 17;
    pub const CONSTANT_INVOKEDYNAMIC: u8 = 18;
    pub const CONSTANT_MODULE: u8 = 19;
    pub const CONSTANT_PACKAGE: u8 = 20;
}

fn pair(tag: u8, first: u16, second: u16) -> Vec<u8> {
    let mut bytes = vec![tag];
    bytes.extend_from_slice(&first.to_be_bytes());
    bytes.extend_from_slice(&second.to_be_bytes());
    bytes
}

fn single(tag: u8, index: u16) -> Vec<u8> {
    let mut bytes = vec![tag];
    bytes.extend_from_slice(&index.to_be_bytes());
    bytes
}

/// Encode a string as the modified UTF-8 used by class files
pub fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007f => bytes.push(unit as u8),
            0x0000 | 0x0080..=0x07ff => {
                bytes.push(0xc0 | ((unit >> 6) & 0x1f) as u8);
                bytes.push(0x80 | (unit & 0x3f) as u8);
            }
            _ => {
                bytes.push(0xe0 | ((unit >> 12) & 0x0f) as u8);
                bytes.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                bytes.push(0x80 | (unit & 0x3f) as u8);
            }
        }
    }
    bytes
}

/// Decode modified UTF-8; `None` for malformed input
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        let first = bytes[index] as u16;
        if first & 0x80 == 0 {
            units.push(first);
            index += 1;
        } else if first & 0xe0 == 0xc0 {
            let second = *bytes.get(index + 1)? as u16;
            units.push(((first & 0x1f) << 6) | (second & 0x3f));
            index += 2;
        } else if first & 0xf0 == 0xe0 {
            let second = *bytes.get(index + 1)? as u16;
            let third = *bytes.get(index + 2)? as u16;
            units.push(((first & 0x0f) << 12) | ((second & 0x3f) << 6) | (third & 0x3f));
            index += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}

impl Constant {
    pub fn to_bytes(&self) -> Vec<u8> {
        use constant_tags::*;
        match self {
            Constant::Utf8(value) => {
                let encoded = encode_modified_utf8(value);
                let mut bytes = vec![CONSTANT_UTF8];
                bytes.extend_from_slice(&(encoded.len() as u16).to_be_bytes());
                bytes.extend_from_slice(&encoded);
                bytes
            }
            Constant::Integer(value) => {
                let mut bytes = vec![CONSTANT_INTEGER];
                bytes.extend_from_slice(&value.to_be_bytes());
                bytes
            }
            Constant::Float(value) => {
                let mut bytes = vec![CONSTANT_FLOAT];
                bytes.extend_from_slice(&value.to_bits().to_be_bytes());
                bytes
            }
            Constant::Long(value) => {
                let mut bytes = vec![CONSTANT_LONG];
                bytes.extend_from_slice(&value.to_be_bytes());
                bytes
            }
            Constant::Double(value) => {
                let mut bytes = vec![CONSTANT_DOUBLE];
                bytes.extend_from_slice(&value.to_bits().to_be_bytes());
                bytes
            }
            Constant::Class(name_index) => single(CONSTANT_CLASS, *name_index),
            Constant::String(string_index) => single(CONSTANT_STRING, *string_index),
            Constant::FieldRef(class_index, nat) => pair(CONSTANT_FIELDREF, *class_index, *nat),
            Constant::MethodRef(class_index, nat) => pair(CONSTANT_METHODREF, *class_index, *nat),
            Constant::InterfaceMethodRef(class_index, nat) => {
                pair(CONSTANT_INTERFACEMETHODREF, *class_index, *nat)
            }
            Constant::NameAndType(name_index, descriptor_index) => {
                pair(CONSTANT_NAMEANDTYPE, *name_index, *descriptor_index)
            }
            Constant::MethodHandle(reference_kind, reference_index) => {
                let mut bytes = vec![CONSTANT_METHODHANDLE, *reference_kind];
                bytes.extend_from_slice(&reference_index.to_be_bytes());
                bytes
            }
            Constant::MethodType(descriptor_index) => single(CONSTANT_METHODTYPE, *descriptor_index),
            Constant::Dynamic(bootstrap, nat) => pair(CONSTANT_DYNAMIC, *bootstrap, *nat),
            Constant::InvokeDynamic(bootstrap, nat) => pair(CONSTANT_INVOKEDYNAMIC, *bootstrap, *nat),
            Constant::Module(name_index) => single(CONSTANT_MODULE, *name_index),
            Constant::Package(name_index) => single(CONSTANT_PACKAGE, *name_index),
        }
    }

    /// Long and double constants occupy two pool slots
    pub fn width(&self) -> u16 {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

/// A deduplicating constant pool with 1-based indices
#[derive(Debug, Default, Clone)]
pub struct ConstantPool {
    pub(crate) constants: Vec<(u16, Constant)>,
    lookup: HashMap<Vec<u8>, u16>,
    next_index: u16,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self { constants: Vec::new(), lookup: HashMap::new(), next_index: 1 }
    }

    /// Value of `constant_pool_count` in the class file
    pub fn count(&self) -> u16 {
        self.next_index.max(1)
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Entry stored at a pool index
    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.constants
            .binary_search_by_key(&index, |(slot, _)| *slot)
            .ok()
            .map(|position| &self.constants[position].1)
    }

    /// Text of a `CONSTANT_Utf8` entry
    pub fn utf8(&self, index: u16) -> ConstPoolResult<&str> {
        match self.get(index) {
            Some(Constant::Utf8(value)) => Ok(value),
            Some(_) => Err(ConstPoolError::UnexpectedEntry { index, expected: "Utf8" }),
            None => Err(ConstPoolError::InvalidIndex(index)),
        }
    }

    /// Name of a `CONSTANT_Class` entry
    pub fn class_name(&self, index: u16) -> ConstPoolResult<&str> {
        match self.get(index) {
            Some(Constant::Class(name_index)) => self.utf8(*name_index),
            Some(_) => Err(ConstPoolError::UnexpectedEntry { index, expected: "Class" }),
            None => Err(ConstPoolError::InvalidIndex(index)),
        }
    }

    /// Owner, name and descriptor of a field or method reference
    pub fn member_ref(&self, index: u16) -> ConstPoolResult<(&str, &str, &str)> {
        let (class_index, nat_index) = match self.get(index) {
            Some(Constant::FieldRef(c, n))
            | Some(Constant::MethodRef(c, n))
            | Some(Constant::InterfaceMethodRef(c, n)) => (*c, *n),
            Some(_) => return Err(ConstPoolError::UnexpectedEntry { index, expected: "member reference" }),
            None => return Err(ConstPoolError::InvalidIndex(index)),
        };
        let owner = self.class_name(class_index)?;
        match self.get(nat_index) {
            Some(Constant::NameAndType(name, descriptor)) => Ok((owner, self.utf8(*name)?, self.utf8(*descriptor)?)),
            Some(_) => Err(ConstPoolError::UnexpectedEntry { index: nat_index, expected: "NameAndType" }),
            None => Err(ConstPoolError::InvalidIndex(nat_index)),
        }
    }

    /// Store a constant, reusing an equal entry if present
    pub fn add(&mut self, constant: Constant) -> ConstPoolResult<u16> {
        let key = constant.to_bytes();
        if let Some(index) = self.lookup.get(&key) {
            return Ok(*index);
        }
        let index = self.next_index;
        let next = index.checked_add(constant.width()).ok_or(ConstPoolError::OutOfSpace)?;
        self.next_index = next;
        self.lookup.insert(key, index);
        self.constants.push((index, constant));
        Ok(index)
    }

    /// Place a constant at a fixed index; used by the reader
    pub(crate) fn insert_at(&mut self, index: u16, constant: Constant) {
        let width = constant.width();
        self.lookup.entry(constant.to_bytes()).or_insert(index);
        self.constants.push((index, constant));
        self.next_index = self.next_index.max(index.saturating_add(width));
    }

    pub fn add_utf8(&mut self, value: &str) -> ConstPoolResult<u16> {
        self.add(Constant::Utf8(value.to_string()))
    }

    pub fn add_class(&mut self, name: &str) -> ConstPoolResult<u16> {
        let name_index = self.add_utf8(name)?;
        self.add(Constant::Class(name_index))
    }

    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let name_index = self.add_utf8(name)?;
        let descriptor_index = self.add_utf8(descriptor)?;
        self.add(Constant::NameAndType(name_index, descriptor_index))
    }

    pub fn add_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.add(Constant::FieldRef(class_index, name_and_type_index))
    }

    pub fn add_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.add(Constant::MethodRef(class_index, name_and_type_index))
    }

    pub fn add_interface_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.add(Constant::InterfaceMethodRef(class_index, name_and_type_index))
    }

    pub fn add_string(&mut self, value: &str) -> ConstPoolResult<u16> {
        let utf8_index = self.add_utf8(value)?;
        self.add(Constant::String(utf8_index))
    }

    pub fn add_integer(&mut self, value: i32) -> ConstPoolResult<u16> {
        self.add(Constant::Integer(value))
    }

    pub fn add_float(&mut self, value: f32) -> ConstPoolResult<u16> {
        self.add(Constant::Float(value))
    }

    pub fn add_long(&mut self, value: i64) -> ConstPoolResult<u16> {
        self.add(Constant::Long(value))
    }

    pub fn add_double(&mut self, value: f64) -> ConstPoolResult<u16> {
        self.add(Constant::Double(value))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.count().to_be_bytes());
        for (_, constant) in &self.constants {
            bytes.extend_from_slice(&constant.to_bytes());
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_start_at_one_and_deduplicate() {
        let mut pool = ConstantPool::new();
        let first = pool.add_class("java/lang/Object").unwrap();
        let second = pool.add_class("java/lang/Object").unwrap();
        assert_eq!(first, second);
        assert_eq!(pool.utf8(1).unwrap(), "java/lang/Object");
        assert_eq!(first, 2);
        assert_eq!(pool.count(), 3);
    }

    #[test]
    fn test_wide_constants_take_two_slots() {
        let mut pool = ConstantPool::new();
        let long_index = pool.add_long(42).unwrap();
        let next = pool.add_integer(7).unwrap();
        assert_eq!(long_index, 1);
        assert_eq!(next, 3);
        assert_eq!(pool.count(), 4);
        assert!(pool.get(2).is_none());
    }

    #[test]
    fn test_member_ref_resolution() {
        let mut pool = ConstantPool::new();
        let index = pool.add_method_ref("java/lang/Object", "<init>", "()V").unwrap();
        assert_eq!(pool.member_ref(index).unwrap(), ("java/lang/Object", "<init>", "()V"));
        assert!(matches!(pool.class_name(index), Err(ConstPoolError::UnexpectedEntry { .. })));
    }

    #[test]
    fn test_modified_utf8_encodes_nul_as_two_bytes() {
        let encoded = encode_modified_utf8("a\u{0}b");
        assert_eq!(encoded, vec![b'a', 0xc0, 0x80, b'b']);
        assert_eq!(decode_modified_utf8(&encoded).unwrap(), "a\u{0}b");
    }
}
