//! Method body strategies
//!
//! An [`Implementation`] is bound to method slots through the
//! [`MethodRegistry`](crate::scaffold::method_registry::MethodRegistry). For every bound slot it
//! produces a [`ByteCodeAppender`], resolving super and default calls through the
//! [`ImplementationTarget`] and registering accessors and auxiliary types with the
//! [`ImplementationContext`] of the build.

pub mod context;
pub mod target;

use log::warn;

use crate::auxiliary::{AssignableSignatureCall, MethodCallProxy};
use crate::bytecode::assign::{Assigner, Typing};
use crate::bytecode::constant::{
    ClassConstant, DefaultValue, DoubleConstant, FloatConstant, IntegerConstant, LongConstant, NullConstant,
    TextConstant,
};
use crate::bytecode::duplication::Duplication;
use crate::bytecode::member::{FieldAccess, MethodInvocation, MethodReturn, MethodVariableAccess};
use crate::bytecode::{removal, throw, type_creation, ByteCodeAppender, Op, StackManipulation};
use crate::common::{Error, Result};
use crate::consts::{
    CALLABLE, CLASS, CONSTRUCTOR_NAME, NO_SUPER_IMPLEMENTATION, OBJECT, RUNNABLE, RUNTIME_EXCEPTION, STRING,
    THROWABLE,
};
use crate::description::{
    internal_name, FieldDescription, FieldToken, MethodDescription, Modifiers, PrimitiveType, TypeRef, Visibility,
};
use crate::scaffold::instrumented_type::InstrumentedType;
use crate::scaffold::method_graph::{MethodGraph, MethodNode};

pub use context::ImplementationContext;
pub use target::{ImplementationTarget, SpecialMethodInvocation};

/// A constant returned by [`Implementation::FixedValue`]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(String),
    /// A class literal
    Type(TypeRef),
}

impl Value {
    pub fn value_type(&self) -> TypeRef {
        match self {
            Value::Null => TypeRef::java_object(),
            Value::Boolean(_) => TypeRef::boolean(),
            Value::Int(_) => TypeRef::int(),
            Value::Long(_) => TypeRef::long(),
            Value::Float(_) => TypeRef::primitive(PrimitiveType::Float),
            Value::Double(_) => TypeRef::primitive(PrimitiveType::Double),
            Value::Text(_) => TypeRef::object(STRING),
            Value::Type(_) => TypeRef::object(CLASS),
        }
    }

    fn push(&self) -> StackManipulation {
        match self {
            Value::Null => NullConstant::new(),
            Value::Boolean(value) => IntegerConstant::for_boolean(*value),
            Value::Int(value) => IntegerConstant::for_value(*value),
            Value::Long(value) => LongConstant::for_value(*value),
            Value::Float(value) => FloatConstant::for_value(*value),
            Value::Double(value) => DoubleConstant::for_value(*value),
            Value::Text(text) => TextConstant::new(text.clone()),
            Value::Type(type_ref) => ClassConstant::of(type_ref),
        }
    }
}

/// How a bound method's body is written
#[derive(Debug, Clone, PartialEq)]
pub enum Implementation {
    /// Return the default value of the return type
    StubValue,
    FixedValue(Value),
    /// Invoke the super implementation, or the only default method when the super class has
    /// none; without either the method throws at runtime
    SuperMethodCall,
    /// Throw a new instance of `exception_type`
    ExceptionMethod { exception_type: String, message: Option<String> },
    /// Read or write `field` depending on the method's shape; `definition` adds the field to
    /// the instrumented type first
    FieldAccessor { field: String, definition: Option<FieldToken> },
    /// Pass a `MethodCallProxy` of the super call to a static method of `target_type` named
    /// `method`, taking a `Callable`, `Runnable` or `Object`
    SuperCallDelegation { target_type: String, method: String },
    /// Invoke a default method of a directly implemented interface. Interfaces in `prioritized`
    /// are tried in order; otherwise the remaining interfaces must offer exactly one default.
    DefaultMethodCall { prioritized: Vec<String> },
    /// Invoke the same method on the instance held by `field`
    Forwarding { field: String },
    /// Manipulations emitted as given; they must leave the method themselves
    Simple(Vec<StackManipulation>),
    /// All but the last part drop their result
    Compound(Vec<Implementation>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Return,
    Drop,
}

impl Implementation {
    pub fn exception(exception_type: impl Into<String>, message: impl Into<String>) -> Self {
        Implementation::ExceptionMethod { exception_type: exception_type.into(), message: Some(message.into()) }
    }

    pub fn field_accessor(field: impl Into<String>) -> Self {
        Implementation::FieldAccessor { field: field.into(), definition: None }
    }

    pub fn delegate_to(target_type: impl Into<String>, method: impl Into<String>) -> Self {
        Implementation::SuperCallDelegation { target_type: target_type.into(), method: method.into() }
    }

    pub fn default_method_call<I, S>(prioritized: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prioritized = prioritized.into_iter().map(|name| internal_name(name.as_ref())).collect();
        Implementation::DefaultMethodCall { prioritized }
    }

    pub fn forward_to(field: impl Into<String>) -> Self {
        Implementation::Forwarding { field: field.into() }
    }

    /// Run `next` after this implementation
    pub fn and_then(self, next: Implementation) -> Self {
        match self {
            Implementation::Compound(mut parts) => {
                parts.push(next);
                Implementation::Compound(parts)
            }
            other => Implementation::Compound(vec![other, next]),
        }
    }

    /// Add the members this implementation relies on
    pub fn prepare(&self, instrumented: InstrumentedType) -> Result<InstrumentedType> {
        match self {
            Implementation::FieldAccessor { definition: Some(token), .. } => {
                if instrumented.description().find_field(&token.name).is_some() {
                    Ok(instrumented)
                } else {
                    instrumented.with_field(token.clone())
                }
            }
            Implementation::Compound(parts) => parts.iter().try_fold(instrumented, |current, part| part.prepare(current)),
            _ => Ok(instrumented),
        }
    }

    pub fn appender(
        &self,
        target: &ImplementationTarget<'_>,
        context: &mut ImplementationContext,
        method: &MethodDescription,
    ) -> Result<ByteCodeAppender> {
        match self {
            Implementation::Compound(parts) => {
                let mut appenders = Vec::new();
                let last = parts.len().saturating_sub(1);
                for (index, part) in parts.iter().enumerate() {
                    let completion = if index == last { Completion::Return } else { Completion::Drop };
                    let body = part.body(target, context, method, completion)?;
                    let terminates = completes_abruptly(&body);
                    appenders.push(ByteCodeAppender::simple(vec![body]));
                    if terminates && index < last {
                        warn!("{}: parts after #{} of the compound implementation are unreachable", method, index);
                        break;
                    }
                }
                if appenders.is_empty() {
                    return Err(Error::config(format!("empty compound implementation for {}", method)));
                }
                Ok(ByteCodeAppender::Compound(appenders))
            }
            _ => Ok(ByteCodeAppender::simple(vec![self.body(target, context, method, Completion::Return)?])),
        }
    }

    fn body(
        &self,
        target: &ImplementationTarget<'_>,
        context: &mut ImplementationContext,
        method: &MethodDescription,
        completion: Completion,
    ) -> Result<StackManipulation> {
        let return_type = &method.return_type;
        let body = match self {
            Implementation::StubValue => match completion {
                Completion::Return => DefaultValue::of(return_type).and_then(MethodReturn::of(return_type)),
                Completion::Drop => StackManipulation::Trivial,
            },
            Implementation::FixedValue(value) => {
                let assignment = match value {
                    Value::Null if return_type.is_reference() => StackManipulation::Trivial,
                    Value::Null => StackManipulation::Illegal,
                    other => Assigner::with_hierarchy(target.graph().hierarchy()).assign(
                        &other.value_type(),
                        return_type,
                        Typing::Static,
                    ),
                };
                StackManipulation::compound(vec![value.push(), assignment, complete(return_type, completion)])
            }
            Implementation::SuperMethodCall => {
                let token = method.signature_token();
                let invocation = if method.is_constructor() {
                    target.invoke_super(&token)
                } else {
                    target.invoke_dominant(&token)
                };
                if invocation.is_valid() {
                    StackManipulation::compound(vec![
                        MethodVariableAccess::load_this_and_arguments(method),
                        invocation.manipulation(),
                        complete(return_type, completion),
                    ])
                } else {
                    warn!("{}: no super implementation to call, compiling a runtime exception", method);
                    throw_with_message(RUNTIME_EXCEPTION, &format!("{}{}", NO_SUPER_IMPLEMENTATION, method))
                }
            }
            Implementation::ExceptionMethod { exception_type, message } => {
                exception_method(target, exception_type, message.as_deref())?
            }
            Implementation::FieldAccessor { field, .. } => field_accessor(target, method, field, completion)?,
            Implementation::SuperCallDelegation { target_type, method: delegate } => {
                super_call_delegation(target, context, method, target_type, delegate, completion)?
            }
            Implementation::DefaultMethodCall { prioritized } => {
                default_method_call(target, method, prioritized, completion)?
            }
            Implementation::Forwarding { field } => forwarding(target, method, field, completion)?,
            Implementation::Simple(manipulations) => StackManipulation::compound(manipulations.iter().cloned()),
            Implementation::Compound(parts) => {
                let mut manipulations = Vec::new();
                let last = parts.len().saturating_sub(1);
                for (index, part) in parts.iter().enumerate() {
                    let completion = if index == last { completion } else { Completion::Drop };
                    let body = part.body(target, context, method, completion)?;
                    let terminates = completes_abruptly(&body);
                    manipulations.push(body);
                    if terminates {
                        break;
                    }
                }
                StackManipulation::compound(manipulations)
            }
        };
        Ok(body)
    }
}

fn complete(return_type: &TypeRef, completion: Completion) -> StackManipulation {
    match completion {
        Completion::Return => MethodReturn::of(return_type),
        Completion::Drop => removal(return_type.stack_size()),
    }
}

/// Whether the last instruction of `manipulation` leaves the method
fn completes_abruptly(manipulation: &StackManipulation) -> bool {
    match manipulation {
        StackManipulation::Simple(op) => op.is_terminal(),
        StackManipulation::Compound(parts) => parts.iter().rev().find(|p| **p != StackManipulation::Trivial).is_some_and(completes_abruptly),
        _ => false,
    }
}

/// `throw new <exception_type>(message)`
pub(crate) fn throw_with_message(exception_type: &str, message: &str) -> StackManipulation {
    let constructor = MethodDescription::new(
        exception_type,
        CONSTRUCTOR_NAME,
        Modifiers::PUBLIC,
        vec![TypeRef::object(STRING)],
        TypeRef::void(),
    );
    StackManipulation::compound(vec![
        StackManipulation::Simple(Op::New(exception_type.to_string())),
        Duplication::Single.duplicate(),
        TextConstant::new(message),
        MethodInvocation::invoke(&constructor),
        throw(),
    ])
}

fn exception_method(
    target: &ImplementationTarget<'_>,
    exception_type: &str,
    message: Option<&str>,
) -> Result<StackManipulation> {
    let description = target.pool().describe(exception_type)?;
    if !target.pool().hierarchy_of(&description)?.is_assignable_from(THROWABLE, exception_type) {
        return Err(Error::config(format!("{} is not a throwable type", exception_type)));
    }
    let parameters = match message {
        Some(_) => vec![TypeRef::object(STRING)],
        None => Vec::new(),
    };
    let constructor = description
        .declared_constructors()
        .find(|c| c.parameters == parameters && c.is_visible_to(&target.instrumented().name))
        .ok_or_else(|| {
            Error::config(format!("{} has no visible constructor taking ({})", exception_type, describe(&parameters)))
        })?;
    let message = message.map(TextConstant::new).unwrap_or(StackManipulation::Trivial);
    Ok(StackManipulation::compound(vec![
        type_creation(&description),
        Duplication::Single.duplicate(),
        message,
        MethodInvocation::invoke(constructor),
        throw(),
    ]))
}

fn describe(types: &[TypeRef]) -> String {
    types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
}

/// The named field of the instrumented type or the nearest superclass declaring a visible one
fn locate_field(target: &ImplementationTarget<'_>, name: &str) -> Option<FieldDescription> {
    let instrumented = target.instrumented();
    if let Some(field) = instrumented.find_field(name) {
        return Some(field.clone());
    }
    target.graph().hierarchy().superclasses().into_iter().find_map(|superclass| {
        superclass
            .find_field(name)
            .filter(|field| !field.modifiers.is_private())
            .filter(|field| {
                field.modifiers.visibility() != Visibility::Package
                    || superclass.package() == instrumented.package()
            })
            .cloned()
    })
}

fn field_accessor(
    target: &ImplementationTarget<'_>,
    method: &MethodDescription,
    name: &str,
    completion: Completion,
) -> Result<StackManipulation> {
    let field = locate_field(target, name)
        .ok_or_else(|| Error::config(format!("no field {} is visible to {}", name, target.instrumented().name)))?;
    if method.is_static() && !field.is_static() {
        return Err(Error::config(format!("static {} cannot access instance field {}", method, name)));
    }
    let assigner = Assigner::with_hierarchy(target.graph().hierarchy());
    let receiver = if field.is_static() {
        StackManipulation::Trivial
    } else {
        MethodVariableAccess::load_this(&target.instrumented().name)
    };
    let return_type = &method.return_type;
    match method.parameters.as_slice() {
        [] if !return_type.is_void() => Ok(StackManipulation::compound(vec![
            receiver,
            FieldAccess::get(&field),
            assigner.assign(&field.field_type, return_type, Typing::Dynamic),
            complete(return_type, completion),
        ])),
        [value] if return_type.is_void() => {
            let slot = method.parameter_offsets()[0];
            Ok(StackManipulation::compound(vec![
                receiver,
                MethodVariableAccess::load(value, slot),
                assigner.assign(value, &field.field_type, Typing::Dynamic),
                FieldAccess::put(&field),
                complete(return_type, completion),
            ]))
        }
        _ => Err(Error::config(format!("{} is neither a getter nor a setter of {}", method, name))),
    }
}

fn default_method_call(
    target: &ImplementationTarget<'_>,
    method: &MethodDescription,
    prioritized: &[String],
    completion: Completion,
) -> Result<StackManipulation> {
    if !method.is_virtual() {
        return Err(Error::config(format!("cannot invoke a default method from {}", method)));
    }
    let token = method.signature_token();
    let interfaces = &target.instrumented().interfaces;
    let preferred = prioritized
        .iter()
        .filter(|interface| interfaces.contains(*interface))
        .map(|interface| target.invoke_default(interface, &token))
        .find(SpecialMethodInvocation::is_valid);
    let invocation = match preferred {
        Some(invocation) => invocation,
        None => {
            let mut candidates: Vec<SpecialMethodInvocation> = interfaces
                .iter()
                .filter(|interface| !prioritized.contains(*interface))
                .map(|interface| target.invoke_default(interface, &token))
                .filter(SpecialMethodInvocation::is_valid)
                .collect();
            match candidates.len() {
                0 => return Err(Error::config(format!("cannot invoke default method on {}", method))),
                1 => candidates.remove(0),
                _ => {
                    let declared: Vec<String> = candidates
                        .iter()
                        .filter_map(|invocation| invocation.method())
                        .map(|m| m.declaring_type.clone())
                        .collect();
                    return Err(Error::config(format!(
                        "{} has an ambiguous default method in {}",
                        method,
                        declared.join(" and ")
                    )));
                }
            }
        }
    };
    Ok(StackManipulation::compound(vec![
        MethodVariableAccess::load_this_and_arguments(method),
        invocation.manipulation(),
        complete(&method.return_type, completion),
    ]))
}

fn forwarding(
    target: &ImplementationTarget<'_>,
    method: &MethodDescription,
    name: &str,
    completion: Completion,
) -> Result<StackManipulation> {
    let field = locate_field(target, name)
        .ok_or_else(|| Error::config(format!("no field {} is visible to {}", name, target.instrumented().name)))?;
    if method.is_static() && !field.is_static() {
        return Err(Error::config(format!("static {} cannot forward to instance field {}", method, name)));
    }
    let TypeRef::Reference(field_type) = &field.field_type else {
        return Err(Error::config(format!("cannot forward {} to field {} of type {}", method, name, field.field_type)));
    };
    let receiver_type = target.pool().describe(field_type)?;
    let graph = MethodGraph::compile(&receiver_type, target.pool())?;
    let forwarded = graph
        .locate(&method.signature_token())
        .map(MethodNode::representative)
        .filter(|forwarded| forwarded.is_visible_to(&target.instrumented().name))
        .ok_or_else(|| Error::MethodNotReachable { type_name: field_type.clone(), method: method.to_string() })?;
    let invocation = if receiver_type.is_interface() {
        MethodInvocation::interface_on(forwarded, &receiver_type)
    } else {
        MethodInvocation::virtual_on(forwarded, &receiver_type)
    };
    let receiver = if field.is_static() {
        StackManipulation::Trivial
    } else {
        MethodVariableAccess::load_this(&target.instrumented().name)
    };
    Ok(StackManipulation::compound(vec![
        receiver,
        FieldAccess::get(&field),
        MethodVariableAccess::load_arguments(method),
        invocation,
        complete(&method.return_type, completion),
    ]))
}

fn super_call_delegation(
    target: &ImplementationTarget<'_>,
    context: &mut ImplementationContext,
    method: &MethodDescription,
    target_type: &str,
    delegate: &str,
    completion: Completion,
) -> Result<StackManipulation> {
    let declaring = target.pool().describe(target_type)?;
    let delegate = declaring
        .declared_methods()
        .find(|m| {
            m.name == delegate
                && m.is_static()
                && m.is_visible_to(&target.instrumented().name)
                && matches!(m.parameters.as_slice(), [TypeRef::Reference(p)] if p == CALLABLE || p == RUNNABLE || p == OBJECT)
        })
        .cloned()
        .ok_or_else(|| Error::MethodNotReachable { type_name: target_type.to_string(), method: delegate.to_string() })?;

    let accessor = context.require_accessor_for(target, method)?;
    let proxy = context.register_auxiliary(MethodCallProxy::new(accessor).into())?;
    let constructor = proxy
        .declared_constructors()
        .next()
        .cloned()
        .ok_or_else(|| Error::internal(format!("{} declares no constructor", proxy.name)))?;
    let return_type = &method.return_type;
    Ok(StackManipulation::compound(vec![
        AssignableSignatureCall::of(&proxy, &constructor, method),
        MethodInvocation::invoke(&delegate),
        Assigner::with_hierarchy(target.graph().hierarchy()).assign(&delegate.return_type, return_type, Typing::Dynamic),
        complete(return_type, completion),
    ]))
}
