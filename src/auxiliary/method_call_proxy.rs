//! A `Runnable` and `Callable` capturing one invocation of a method
//!
//! The proxy stores the receiver and every argument in final fields when it is constructed and
//! replays the invocation when `run()` or `call()` is invoked. The proxied method is usually an
//! accessor of the instrumented type, so the proxy lives in the instrumented type's package.

use log::debug;

use crate::bytecode::assign::{Assigner, Typing};
use crate::bytecode::constant::NullConstant;
use crate::bytecode::duplication::Duplication;
use crate::bytecode::member::{FieldAccess, MethodInvocation, MethodReturn, MethodVariableAccess};
use crate::bytecode::{removal, type_creation, ByteCodeAppender, Code, StackManipulation};
use crate::common::{Config, Result};
use crate::consts::{CALLABLE, CONSTRUCTOR_NAME, EXCEPTION, OBJECT, PROXY_FIELD_PREFIX, RUNNABLE};
use crate::description::{FieldDescription, FieldToken, MethodDescription, MethodToken, Modifiers, TypeDescription, TypeRef};
use crate::dynamic::{write_type, DynamicType};
use crate::scaffold::type_writer::{CompiledMethod, MethodBody};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodCallProxy {
    target: MethodDescription,
}

impl MethodCallProxy {
    pub fn new(target: MethodDescription) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &MethodDescription {
        &self.target
    }

    /// Receiver first for instance targets, then the parameters in declaration order
    pub fn captured_types(&self) -> Vec<TypeRef> {
        let receiver = (!self.target.is_static()).then(|| TypeRef::object(&self.target.declaring_type));
        receiver.into_iter().chain(self.target.parameters.iter().cloned()).collect()
    }

    /// The proxy's constructor taking every captured value
    pub fn constructor(&self, name: &str) -> MethodDescription {
        MethodDescription::new(name, CONSTRUCTOR_NAME, Modifiers::SYNTHETIC, self.captured_types(), TypeRef::void())
    }

    pub fn make(&self, name: &str, config: &Config) -> Result<DynamicType> {
        let mut description = TypeDescription::new(name, Modifiers::FINAL | Modifiers::SYNTHETIC, Some(OBJECT))
            .with_interface(RUNNABLE)
            .with_interface(CALLABLE);
        for (index, captured) in self.captured_types().into_iter().enumerate() {
            let token = FieldToken::new(format!("{}{}", PROXY_FIELD_PREFIX, index), captured, Modifiers::PRIVATE | Modifiers::FINAL);
            description = description.with_field(token);
        }
        let constructor = self.constructor(name);
        let call = MethodDescription::from_token(
            name,
            false,
            &MethodToken::new("call", Modifiers::PUBLIC, vec![], TypeRef::java_object()).with_exceptions(vec![EXCEPTION.to_string()]),
        );
        let run = MethodDescription::new(name, "run", Modifiers::PUBLIC, vec![], TypeRef::void());

        let constructor_body = self.constructor_body(&description.fields, &constructor);
        let call_body = self.replay(&description.fields, true);
        let run_body = self.replay(&description.fields, false);
        let methods = vec![
            compile(constructor, constructor_body)?,
            compile(call, call_body)?,
            compile(run, run_body)?,
        ];
        description.methods = methods.iter().map(|m| m.description.clone()).collect();
        let bytes = write_type(&description, &methods, &[], config)?;
        debug!("Made method call proxy {} for {}", name, self.target);
        Ok(DynamicType::new(description, bytes, Vec::new()))
    }

    fn constructor_body(&self, fields: &[FieldDescription], constructor: &MethodDescription) -> Vec<StackManipulation> {
        let object_constructor = MethodDescription::new(OBJECT, CONSTRUCTOR_NAME, Modifiers::PUBLIC, vec![], TypeRef::void());
        let mut body = vec![
            MethodVariableAccess::load_this(&constructor.declaring_type),
            MethodInvocation::invoke(&object_constructor),
        ];
        for (field, slot) in fields.iter().zip(constructor.parameter_offsets()) {
            body.push(MethodVariableAccess::load_this(&constructor.declaring_type));
            body.push(MethodVariableAccess::load(&field.field_type, slot));
            body.push(FieldAccess::put(field));
        }
        body.push(MethodReturn::void());
        body
    }

    /// Reload every field, invoke the target and either return its boxed result or drop it
    fn replay(&self, fields: &[FieldDescription], returning: bool) -> Vec<StackManipulation> {
        let mut body = Vec::new();
        for field in fields {
            body.push(MethodVariableAccess::load_this(&field.declaring_type));
            body.push(FieldAccess::get(field));
        }
        body.push(MethodInvocation::invoke(&self.target));
        let result = &self.target.return_type;
        if returning {
            if result.is_void() {
                body.push(NullConstant::new());
            } else {
                body.push(Assigner::new().assign(result, &TypeRef::java_object(), Typing::Static));
            }
            body.push(MethodReturn::of(&TypeRef::java_object()));
        } else {
            body.push(removal(result.stack_size()));
            body.push(MethodReturn::void());
        }
        body
    }
}

fn compile(method: MethodDescription, body: Vec<StackManipulation>) -> Result<CompiledMethod> {
    let mut code = Code::new();
    let size = ByteCodeAppender::simple(body).apply(&mut code, &method)?;
    Ok(CompiledMethod::new(method, Some(MethodBody::new(code, size))))
}

/// Creates a proxy capturing the current method's receiver and arguments:
/// `new`, `dup`, load this and arguments, `invokespecial <init>`
pub struct AssignableSignatureCall;

impl AssignableSignatureCall {
    pub fn of(proxy: &TypeDescription, constructor: &MethodDescription, method: &MethodDescription) -> StackManipulation {
        StackManipulation::compound(vec![
            type_creation(proxy),
            Duplication::Single.duplicate(),
            MethodVariableAccess::load_this_and_arguments(method),
            MethodInvocation::invoke(constructor),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::reader::ClassReader;
    use crate::consts::STRING;

    fn accessor() -> MethodDescription {
        MethodDescription::new(
            "demo/Foo",
            "greet$accessor$1",
            Modifiers::SYNTHETIC | Modifiers::FINAL,
            vec![TypeRef::object(STRING), TypeRef::long()],
            TypeRef::int(),
        )
    }

    #[test]
    fn test_captured_types_start_with_receiver() {
        let proxy = MethodCallProxy::new(accessor());
        assert_eq!(
            proxy.captured_types(),
            vec![TypeRef::object("demo/Foo"), TypeRef::object(STRING), TypeRef::long()]
        );
        let mut static_target = accessor();
        static_target.modifiers = static_target.modifiers | Modifiers::STATIC;
        assert_eq!(MethodCallProxy::new(static_target).captured_types().len(), 2);
    }

    #[test]
    fn test_proxy_class_shape() {
        let proxy = MethodCallProxy::new(accessor());
        let made = proxy.make("demo/Foo$auxiliary$1", &Config::default()).unwrap();
        let parsed = ClassReader::new(&made.bytes).read().unwrap();
        assert_eq!(parsed.super_class.as_deref(), Some(OBJECT));
        assert_eq!(parsed.interfaces, vec![RUNNABLE, CALLABLE]);
        assert!(parsed.access_flags & Modifiers::FINAL.bits() != 0);
        assert!(parsed.access_flags & Modifiers::SYNTHETIC.bits() != 0);
        for index in 0..3 {
            let field = parsed.field(&format!("argument{}", index)).unwrap();
            assert_eq!(field.access_flags, (Modifiers::PRIVATE | Modifiers::FINAL).bits());
        }
        assert!(parsed.method("<init>", "(Ldemo/Foo;Ljava/lang/String;J)V").is_some());
        assert!(parsed.method("call", "()Ljava/lang/Object;").is_some());
        assert!(parsed.method("run", "()V").is_some());
    }

    #[test]
    fn test_assignable_signature_call_leaves_proxy_on_stack() {
        let proxy = MethodCallProxy::new(accessor());
        let description = TypeDescription::new("demo/Foo$auxiliary$1", Modifiers::FINAL, Some(OBJECT));
        let constructor = proxy.constructor(&description.name);
        let current = MethodDescription::new(
            "demo/Foo",
            "greet",
            Modifiers::PUBLIC,
            vec![TypeRef::object(STRING), TypeRef::long()],
            TypeRef::int(),
        );
        let creation = AssignableSignatureCall::of(&description, &constructor, &current);
        assert!(creation.is_valid());
        assert_eq!(creation.size().size_impact, 1);
    }
}
