//! Local variables, fields, invocations and returns

use super::op::{FieldAccessKind, FieldRef, InvocationKind, MethodRef, Op};
use super::StackManipulation;
use crate::description::{FieldDescription, MethodDescription, TypeDescription, TypeRef};

/// Loads and stores of local variables
pub struct MethodVariableAccess;

impl MethodVariableAccess {
    /// Load a value of `value_type` from `slot`; `void` cannot be loaded
    pub fn load(value_type: &TypeRef, slot: u16) -> StackManipulation {
        if value_type.is_void() {
            return StackManipulation::Illegal;
        }
        StackManipulation::Simple(Op::Load { value_type: value_type.clone(), slot })
    }

    pub fn store(value_type: &TypeRef, slot: u16) -> StackManipulation {
        if value_type.is_void() {
            return StackManipulation::Illegal;
        }
        StackManipulation::Simple(Op::Store { value_type: value_type.clone(), slot })
    }

    /// `aload_0` of the instrumented type
    pub fn load_this(instrumented: &str) -> StackManipulation {
        Self::load(&TypeRef::object(instrumented), 0)
    }

    /// Load every parameter of `method` in declaration order
    pub fn load_arguments(method: &MethodDescription) -> StackManipulation {
        StackManipulation::compound(
            method
                .parameters
                .iter()
                .zip(method.parameter_offsets())
                .map(|(parameter, slot)| Self::load(parameter, slot)),
        )
    }

    /// Load the receiver, unless `method` is static, followed by all parameters
    pub fn load_this_and_arguments(method: &MethodDescription) -> StackManipulation {
        if method.is_static() {
            Self::load_arguments(method)
        } else {
            Self::load_this(&method.declaring_type).and_then(Self::load_arguments(method))
        }
    }
}

/// Reads and writes of fields
pub struct FieldAccess;

impl FieldAccess {
    fn field_ref(field: &FieldDescription) -> FieldRef {
        FieldRef {
            owner: field.declaring_type.clone(),
            name: field.name.clone(),
            field_type: field.field_type.clone(),
        }
    }

    pub fn get(field: &FieldDescription) -> StackManipulation {
        let kind = if field.is_static() { FieldAccessKind::GetStatic } else { FieldAccessKind::GetField };
        StackManipulation::Simple(Op::Field { kind, field: Self::field_ref(field) })
    }

    /// Writing a final field is only legal from constructors, which callers must ensure
    pub fn put(field: &FieldDescription) -> StackManipulation {
        let kind = if field.is_static() { FieldAccessKind::PutStatic } else { FieldAccessKind::PutField };
        StackManipulation::Simple(Op::Field { kind, field: Self::field_ref(field) })
    }
}

/// Method invocations
pub struct MethodInvocation;

impl MethodInvocation {
    /// The natural invocation for `method`: static, interface, special for private members
    /// and constructors, virtual otherwise
    pub fn invoke(method: &MethodDescription) -> StackManipulation {
        if method.is_type_initializer() {
            return StackManipulation::Illegal;
        }
        let kind = if method.is_static() {
            InvocationKind::Static
        } else if method.is_constructor() || method.is_private() {
            InvocationKind::Special
        } else if method.declared_by_interface {
            InvocationKind::Interface
        } else {
            InvocationKind::Virtual
        };
        Self::of(kind, MethodRef::of(method))
    }

    /// Invoke `method` non-virtually on `owner`; abstract and static methods cannot be special-invoked
    pub fn special(method: &MethodDescription, owner: &TypeDescription) -> StackManipulation {
        if method.is_abstract() || method.is_static() || method.is_type_initializer() {
            return StackManipulation::Illegal;
        }
        Self::of(InvocationKind::Special, MethodRef::of(method).on(owner.name.clone(), owner.is_interface()))
    }

    /// Dispatch `method` virtually on `receiver`, which must be a class
    pub fn virtual_on(method: &MethodDescription, receiver: &TypeDescription) -> StackManipulation {
        if !method.is_virtual() || receiver.is_interface() {
            return StackManipulation::Illegal;
        }
        Self::of(InvocationKind::Virtual, MethodRef::of(method).on(receiver.name.clone(), false))
    }

    /// Dispatch `method` through `interface`
    pub fn interface_on(method: &MethodDescription, interface: &TypeDescription) -> StackManipulation {
        if !method.is_virtual() || !interface.is_interface() {
            return StackManipulation::Illegal;
        }
        Self::of(InvocationKind::Interface, MethodRef::of(method).on(interface.name.clone(), true))
    }

    pub fn static_call(method: &MethodDescription) -> StackManipulation {
        if !method.is_static() || method.is_type_initializer() {
            return StackManipulation::Illegal;
        }
        Self::of(InvocationKind::Static, MethodRef::of(method))
    }

    fn of(kind: InvocationKind, method: MethodRef) -> StackManipulation {
        StackManipulation::Simple(Op::Invoke { kind, method })
    }
}

/// Return of a value of the given type
pub struct MethodReturn;

impl MethodReturn {
    pub fn of(return_type: &TypeRef) -> StackManipulation {
        StackManipulation::Simple(Op::Return(return_type.clone()))
    }

    pub fn void() -> StackManipulation {
        Self::of(&TypeRef::void())
    }
}
