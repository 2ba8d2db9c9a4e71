//! Descriptions of the `java.lang` types generated code relies on

use crate::consts::*;
use crate::description::{MethodToken, Modifiers, PrimitiveType, TypeDescription, TypeRef};

fn method(name: &str, modifiers: Modifiers, parameters: Vec<TypeRef>, return_type: TypeRef) -> MethodToken {
    MethodToken::new(name, modifiers, parameters, return_type)
}

fn public_constructor(parameters: Vec<TypeRef>) -> MethodToken {
    MethodToken::constructor(Modifiers::PUBLIC, parameters)
}

fn object() -> TypeDescription {
    let public = Modifiers::PUBLIC;
    let public_final = Modifiers::PUBLIC | Modifiers::FINAL;
    let public_final_native = public_final | Modifiers::NATIVE;
    let interrupted = vec!["java/lang/InterruptedException".to_string()];
    TypeDescription::new(OBJECT, Modifiers::PUBLIC | Modifiers::SUPER, None)
        .with_method(public_constructor(vec![]))
        .with_method(method("equals", public, vec![TypeRef::java_object()], TypeRef::boolean()))
        .with_method(method("hashCode", public | Modifiers::NATIVE, vec![], TypeRef::int()))
        .with_method(method("toString", public, vec![], TypeRef::object(STRING)))
        .with_method(
            method("clone", Modifiers::PROTECTED | Modifiers::NATIVE, vec![], TypeRef::java_object())
                .with_exceptions(vec!["java/lang/CloneNotSupportedException".to_string()]),
        )
        .with_method(
            method(FINALIZE_NAME, Modifiers::PROTECTED, vec![], TypeRef::void()).with_exceptions(vec![THROWABLE.to_string()]),
        )
        .with_method(
            method("getClass", public_final_native, vec![], TypeRef::object(CLASS)).with_signature("()Ljava/lang/Class<*>;"),
        )
        .with_method(method("notify", public_final_native, vec![], TypeRef::void()))
        .with_method(method("notifyAll", public_final_native, vec![], TypeRef::void()))
        .with_method(method("wait", public_final, vec![], TypeRef::void()).with_exceptions(interrupted.clone()))
        .with_method(method("wait", public_final_native, vec![TypeRef::long()], TypeRef::void()).with_exceptions(interrupted.clone()))
        .with_method(
            method("wait", public_final, vec![TypeRef::long(), TypeRef::int()], TypeRef::void()).with_exceptions(interrupted),
        )
}

fn throwable_like(name: &str, super_class: &str) -> TypeDescription {
    let mut description = TypeDescription::new(name, Modifiers::PUBLIC | Modifiers::SUPER, Some(super_class));
    if name == THROWABLE {
        description = description.with_interface(SERIALIZABLE);
    }
    description
        .with_method(public_constructor(vec![]))
        .with_method(public_constructor(vec![TypeRef::object(STRING)]))
        .with_method(public_constructor(vec![TypeRef::object(STRING), TypeRef::object(THROWABLE)]))
        .with_method(public_constructor(vec![TypeRef::object(THROWABLE)]))
}

fn wrapper(primitive: PrimitiveType) -> TypeDescription {
    let name = primitive.wrapper();
    let super_class = match primitive {
        PrimitiveType::Boolean | PrimitiveType::Char | PrimitiveType::Void => OBJECT,
        _ => NUMBER,
    };
    let mut description =
        TypeDescription::new(name, Modifiers::PUBLIC | Modifiers::FINAL | Modifiers::SUPER, Some(super_class)).with_interface(SERIALIZABLE);
    if primitive != PrimitiveType::Void {
        let own = TypeRef::object(name);
        description = description
            .with_method(method(
                "valueOf",
                Modifiers::PUBLIC | Modifiers::STATIC,
                vec![TypeRef::primitive(primitive)],
                own,
            ))
            .with_method(method(primitive.unboxing_method(), Modifiers::PUBLIC, vec![], TypeRef::primitive(primitive)));
    }
    description
}

/// Every built-in description
pub fn java_lang_types() -> Vec<TypeDescription> {
    let abstract_public = Modifiers::PUBLIC | Modifiers::ABSTRACT;
    let mut types = vec![
        object(),
        TypeDescription::interface(SERIALIZABLE),
        TypeDescription::interface(CLONEABLE),
        TypeDescription::interface("java/lang/Comparable")
            .with_signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
            .with_method(method("compareTo", abstract_public, vec![TypeRef::java_object()], TypeRef::int())),
        TypeDescription::interface("java/lang/CharSequence")
            .with_method(method("length", abstract_public, vec![], TypeRef::int()))
            .with_method(method("charAt", abstract_public, vec![TypeRef::int()], TypeRef::primitive(PrimitiveType::Char)))
            .with_method(method("toString", abstract_public, vec![], TypeRef::object(STRING))),
        TypeDescription::new(STRING, Modifiers::PUBLIC | Modifiers::FINAL | Modifiers::SUPER, Some(OBJECT))
            .with_interface(SERIALIZABLE)
            .with_interface("java/lang/Comparable")
            .with_interface("java/lang/CharSequence")
            .with_method(public_constructor(vec![])),
        TypeDescription::new(CLASS, Modifiers::PUBLIC | Modifiers::FINAL | Modifiers::SUPER, Some(OBJECT)).with_interface(SERIALIZABLE),
        TypeDescription::interface(RUNNABLE).with_method(method("run", abstract_public, vec![], TypeRef::void())),
        TypeDescription::interface(CALLABLE)
            .with_signature("<V:Ljava/lang/Object;>Ljava/lang/Object;")
            .with_method(
                method("call", abstract_public, vec![], TypeRef::java_object())
                    .with_exceptions(vec![EXCEPTION.to_string()])
                    .with_signature("()TV;"),
            ),
        TypeDescription::new(NUMBER, abstract_public | Modifiers::SUPER, Some(OBJECT))
            .with_interface(SERIALIZABLE)
            .with_method(MethodToken::constructor(Modifiers::PUBLIC, vec![]))
            .with_method(method("intValue", abstract_public, vec![], TypeRef::int()))
            .with_method(method("longValue", abstract_public, vec![], TypeRef::long())),
        throwable_like(THROWABLE, OBJECT),
        throwable_like(EXCEPTION, THROWABLE),
        throwable_like(RUNTIME_EXCEPTION, EXCEPTION),
        throwable_like(UNSUPPORTED_OPERATION_EXCEPTION, RUNTIME_EXCEPTION),
        throwable_like("java/lang/IllegalStateException", RUNTIME_EXCEPTION),
        throwable_like("java/lang/IllegalArgumentException", RUNTIME_EXCEPTION),
    ];
    types.extend(PrimitiveType::ALL.iter().map(|primitive| wrapper(*primitive)));
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::SignatureToken;

    #[test]
    fn test_object_declares_default_finalizer() {
        let object = object();
        let finalize = object
            .find_method(&SignatureToken::new(FINALIZE_NAME, vec![], TypeRef::void()))
            .unwrap();
        assert!(finalize.is_default_finalizer());
        assert_eq!(object.declared_constructors().count(), 1);
    }

    #[test]
    fn test_wrappers_box_and_unbox() {
        let integer = wrapper(PrimitiveType::Int);
        assert_eq!(integer.super_class.as_deref(), Some(NUMBER));
        assert!(integer
            .find_method(&SignatureToken::new("valueOf", vec![TypeRef::int()], TypeRef::object("java/lang/Integer")))
            .is_some());
        assert!(integer.find_method(&SignatureToken::new("intValue", vec![], TypeRef::int())).is_some());
    }
}
