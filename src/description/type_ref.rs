//! Erased type references and descriptors

use std::fmt;

use crate::bytecode::size::StackSize;
use crate::classfile::error::ClassFormatError;
use crate::classfile::frame::FrameType;
use crate::consts::OBJECT;

/// A primitive type, `void` included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

struct PrimitiveInfo {
    descriptor: char,
    name: &'static str,
    wrapper: &'static str,
    unboxing_method: &'static str,
    stack_size: StackSize,
}

// Indexed by `PrimitiveType as usize`
const PRIMITIVES: [PrimitiveInfo; 9] = [
    PrimitiveInfo { descriptor: 'Z', name: "boolean", wrapper: "java/lang/Boolean", unboxing_method: "booleanValue", stack_size: StackSize::Single },
    PrimitiveInfo { descriptor: 'B', name: "byte", wrapper: "java/lang/Byte", unboxing_method: "byteValue", stack_size: StackSize::Single },
    PrimitiveInfo { descriptor: 'C', name: "char", wrapper: "java/lang/Character", unboxing_method: "charValue", stack_size: StackSize::Single },
    PrimitiveInfo { descriptor: 'S', name: "short", wrapper: "java/lang/Short", unboxing_method: "shortValue", stack_size: StackSize::Single },
    PrimitiveInfo { descriptor: 'I', name: "int", wrapper: "java/lang/Integer", unboxing_method: "intValue", stack_size: StackSize::Single },
    PrimitiveInfo { descriptor: 'J', name: "long", wrapper: "java/lang/Long", unboxing_method: "longValue", stack_size: StackSize::Double },
    PrimitiveInfo { descriptor: 'F', name: "float", wrapper: "java/lang/Float", unboxing_method: "floatValue", stack_size: StackSize::Single },
    PrimitiveInfo { descriptor: 'D', name: "double", wrapper: "java/lang/Double", unboxing_method: "doubleValue", stack_size: StackSize::Double },
    PrimitiveInfo { descriptor: 'V', name: "void", wrapper: "java/lang/Void", unboxing_method: "", stack_size: StackSize::Zero },
];

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 9] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Char,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
        PrimitiveType::Void,
    ];

    fn info(self) -> &'static PrimitiveInfo {
        &PRIMITIVES[self as usize]
    }

    pub fn descriptor(self) -> char {
        self.info().descriptor
    }

    pub fn from_descriptor(descriptor: char) -> Option<PrimitiveType> {
        Self::ALL.iter().copied().find(|primitive| primitive.descriptor() == descriptor)
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Internal name of the boxing type
    pub fn wrapper(self) -> &'static str {
        self.info().wrapper
    }

    /// Name of the wrapper method returning the primitive value, empty for `void`
    pub fn unboxing_method(self) -> &'static str {
        self.info().unboxing_method
    }

    pub fn stack_size(self) -> StackSize {
        self.info().stack_size
    }

    /// Values represented as `int` on the operand stack
    pub fn is_int_like(self) -> bool {
        matches!(
            self,
            PrimitiveType::Boolean | PrimitiveType::Byte | PrimitiveType::Char | PrimitiveType::Short | PrimitiveType::Int
        )
    }

    /// Primitive boxed by the given wrapper type
    pub fn for_wrapper(wrapper: &str) -> Option<PrimitiveType> {
        Self::ALL
            .iter()
            .copied()
            .find(|primitive| *primitive != PrimitiveType::Void && primitive.wrapper() == wrapper)
    }
}

/// An erased type as it appears in descriptors
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    /// Class or interface by internal name
    Reference(String),
    Array(Box<TypeRef>),
}

impl TypeRef {
    /// Reference to a class or interface; binary names are converted to internal form
    pub fn object(name: impl AsRef<str>) -> TypeRef {
        TypeRef::Reference(internal_name(name.as_ref()))
    }

    pub fn primitive(primitive: PrimitiveType) -> TypeRef {
        TypeRef::Primitive(primitive)
    }

    pub fn void() -> TypeRef {
        TypeRef::Primitive(PrimitiveType::Void)
    }

    pub fn int() -> TypeRef {
        TypeRef::Primitive(PrimitiveType::Int)
    }

    pub fn long() -> TypeRef {
        TypeRef::Primitive(PrimitiveType::Long)
    }

    pub fn boolean() -> TypeRef {
        TypeRef::Primitive(PrimitiveType::Boolean)
    }

    pub fn java_object() -> TypeRef {
        TypeRef::Reference(OBJECT.to_string())
    }

    pub fn array_of(component: TypeRef) -> TypeRef {
        TypeRef::Array(Box::new(component))
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            TypeRef::Primitive(primitive) => Some(*primitive),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(primitive) if *primitive != PrimitiveType::Void)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Primitive(PrimitiveType::Void))
    }

    pub fn is_reference(&self) -> bool {
        !matches!(self, TypeRef::Primitive(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array(_))
    }

    pub fn stack_size(&self) -> StackSize {
        match self {
            TypeRef::Primitive(primitive) => primitive.stack_size(),
            _ => StackSize::Single,
        }
    }

    pub fn descriptor(&self) -> String {
        let mut descriptor = String::new();
        self.write_descriptor(&mut descriptor);
        descriptor
    }

    fn write_descriptor(&self, out: &mut String) {
        match self {
            TypeRef::Primitive(primitive) => out.push(primitive.descriptor()),
            TypeRef::Reference(name) => {
                out.push('L');
                out.push_str(name);
                out.push(';');
            }
            TypeRef::Array(component) => {
                out.push('[');
                component.write_descriptor(out);
            }
        }
    }

    /// Name used by `CONSTANT_Class`: the internal name of a class, the descriptor of an array
    pub fn class_constant_name(&self) -> String {
        match self {
            TypeRef::Reference(name) => name.clone(),
            TypeRef::Array(_) => self.descriptor(),
            TypeRef::Primitive(primitive) => primitive.name().to_string(),
        }
    }

    /// Verifier type of a value of this type
    pub fn frame_type(&self) -> FrameType {
        match self {
            TypeRef::Primitive(PrimitiveType::Long) => FrameType::Long,
            TypeRef::Primitive(PrimitiveType::Float) => FrameType::Float,
            TypeRef::Primitive(PrimitiveType::Double) => FrameType::Double,
            TypeRef::Primitive(PrimitiveType::Void) => FrameType::Top,
            TypeRef::Primitive(_) => FrameType::Integer,
            other => FrameType::Object(other.class_constant_name()),
        }
    }

    pub fn parse_descriptor(descriptor: &str) -> Result<TypeRef, ClassFormatError> {
        let mut chars = descriptor.char_indices().peekable();
        let parsed = parse_field_type(descriptor, &mut chars)?;
        if chars.next().is_some() {
            return Err(ClassFormatError::InvalidDescriptor(descriptor.to_string()));
        }
        Ok(parsed)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(primitive) => write!(f, "{}", primitive.name()),
            TypeRef::Reference(name) => write!(f, "{}", name.replace('/', ".")),
            TypeRef::Array(component) => write!(f, "{}[]", component),
        }
    }
}

/// Convert a binary name (`java.lang.Object`) into internal form (`java/lang/Object`)
pub fn internal_name(name: &str) -> String {
    name.replace('.', "/")
}

/// Package part of an internal name, empty for the default package
pub fn package_of(name: &str) -> &str {
    match name.rfind('/') {
        Some(index) => &name[..index],
        None => "",
    }
}

/// Descriptor of a method taking `parameters` and returning `return_type`
pub fn method_descriptor(parameters: &[TypeRef], return_type: &TypeRef) -> String {
    let mut descriptor = String::from("(");
    for parameter in parameters {
        parameter.write_descriptor(&mut descriptor);
    }
    descriptor.push(')');
    return_type.write_descriptor(&mut descriptor);
    descriptor
}

/// Split a method descriptor into parameter and return types
pub fn parse_method_descriptor(descriptor: &str) -> Result<(Vec<TypeRef>, TypeRef), ClassFormatError> {
    let invalid = || ClassFormatError::InvalidDescriptor(descriptor.to_string());
    let mut chars = descriptor.char_indices().peekable();
    if chars.next().map(|(_, c)| c) != Some('(') {
        return Err(invalid());
    }
    let mut parameters = Vec::new();
    loop {
        match chars.peek() {
            Some((_, ')')) => {
                chars.next();
                break;
            }
            Some(_) => parameters.push(parse_field_type(descriptor, &mut chars)?),
            None => return Err(invalid()),
        }
    }
    let return_type = parse_field_type(descriptor, &mut chars)?;
    if chars.next().is_some() {
        return Err(invalid());
    }
    Ok((parameters, return_type))
}

fn parse_field_type(
    descriptor: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<TypeRef, ClassFormatError> {
    let invalid = || ClassFormatError::InvalidDescriptor(descriptor.to_string());
    let (start, first) = chars.next().ok_or_else(invalid)?;
    match first {
        '[' => Ok(TypeRef::array_of(parse_field_type(descriptor, chars)?)),
        'L' => {
            for (index, c) in chars.by_ref() {
                if c == ';' {
                    let name = &descriptor[start + 1..index];
                    if name.is_empty() {
                        return Err(invalid());
                    }
                    return Ok(TypeRef::Reference(name.to_string()));
                }
            }
            Err(invalid())
        }
        other => PrimitiveType::from_descriptor(other).map(TypeRef::Primitive).ok_or_else(invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_formatting() {
        let string_array = TypeRef::array_of(TypeRef::object("java.lang.String"));
        assert_eq!(string_array.descriptor(), "[Ljava/lang/String;");
        assert_eq!(string_array.class_constant_name(), "[Ljava/lang/String;");
        assert_eq!(string_array.to_string(), "java.lang.String[]");
        assert_eq!(method_descriptor(&[TypeRef::int(), TypeRef::long()], &TypeRef::void()), "(IJ)V");
    }

    #[test]
    fn test_method_descriptor_parsing() {
        let (parameters, return_type) = parse_method_descriptor("(I[JLjava/lang/Object;)Ljava/lang/String;").unwrap();
        assert_eq!(
            parameters,
            vec![TypeRef::int(), TypeRef::array_of(TypeRef::long()), TypeRef::java_object()]
        );
        assert_eq!(return_type, TypeRef::object("java/lang/String"));
        assert!(parse_method_descriptor("(I").is_err());
        assert!(parse_method_descriptor("(L;)V").is_err());
        assert!(TypeRef::parse_descriptor("II").is_err());
    }

    #[test]
    fn test_primitive_lookup_table() {
        assert_eq!(PrimitiveType::Long.stack_size(), StackSize::Double);
        assert_eq!(PrimitiveType::Void.stack_size(), StackSize::Zero);
        assert_eq!(PrimitiveType::Char.wrapper(), "java/lang/Character");
        assert_eq!(PrimitiveType::for_wrapper("java/lang/Integer"), Some(PrimitiveType::Int));
        assert_eq!(PrimitiveType::from_descriptor('Z'), Some(PrimitiveType::Boolean));
        assert_eq!(package_of("java/lang/Object"), "java/lang");
        assert_eq!(package_of("Plain"), "");
    }
}
