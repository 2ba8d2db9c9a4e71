// Common test utilities
#![allow(dead_code)]

use classweave::consts::{CALLABLE, OBJECT, STRING};
use classweave::description::{MethodToken, Modifiers, TypeDescription, TypeRef};
use classweave::pool::TypePool;

pub const BASE: &str = "demo/Base";
pub const FIRST: &str = "demo/First";
pub const SECOND: &str = "demo/Second";
pub const INTERCEPTOR: &str = "demo/Interceptor";
pub const GREETER: &str = "demo/Greeter";

/// Install a test logger; repeated calls are harmless
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A pool with an abstract base class, two unrelated interfaces declaring the same method, an
/// interface with a default method and a static interceptor
pub fn fixture_pool() -> TypePool {
    let pool = TypePool::new();
    pool.register(
        TypeDescription::new(BASE, Modifiers::PUBLIC | Modifiers::ABSTRACT, Some(OBJECT))
            .with_method(MethodToken::constructor(Modifiers::PUBLIC, vec![]))
            .with_method(
                MethodToken::constructor(Modifiers::PROTECTED, vec![TypeRef::object(STRING), TypeRef::long()])
                    .with_exceptions(vec!["java/io/IOException".to_string()]),
            )
            .with_method(MethodToken::new(
                "compute",
                Modifiers::PUBLIC | Modifiers::ABSTRACT,
                vec![TypeRef::int()],
                TypeRef::long(),
            ))
            .with_method(MethodToken::new("name", Modifiers::PUBLIC, vec![], TypeRef::object(STRING))),
    );
    for interface in [FIRST, SECOND] {
        pool.register(TypeDescription::interface(interface).with_method(MethodToken::new(
            "describe",
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
            vec![],
            TypeRef::object(STRING),
        )));
    }
    pool.register(TypeDescription::interface(GREETER).with_method(MethodToken::new(
        "greet",
        Modifiers::PUBLIC,
        vec![],
        TypeRef::object(STRING),
    )));
    pool.register(TypeDescription::class(INTERCEPTOR, OBJECT).with_method(MethodToken::new(
        "intercept",
        Modifiers::PUBLIC | Modifiers::STATIC,
        vec![TypeRef::object(CALLABLE)],
        TypeRef::java_object(),
    )));
    pool
}

/// Whether `needle` occurs in `bytes`
pub fn contains_bytes(bytes: &[u8], needle: &[u8]) -> bool {
    bytes.windows(needle.len()).any(|window| window == needle)
}
