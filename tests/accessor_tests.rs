//! Accessors and method call proxies created by super call delegation

mod common;

use std::sync::Arc;

use classweave::auxiliary::AuxiliaryNaming;
use classweave::classfile::ClassReader;
use classweave::consts::{CALLABLE, NO_SUPER_IMPLEMENTATION, OBJECT, RUNNABLE};
use classweave::dynamic::{DynamicType, InMemoryClassLoader};
use classweave::{ClassWeaver, Config, ElementMatcher, Implementation};
use common::*;

fn delegating(name: &str, method: &str, implementation: Implementation, config: Config) -> DynamicType {
    ClassWeaver::with_pool(config, Arc::new(fixture_pool()))
        .subclass(BASE)
        .unwrap()
        .name(name)
        .method(ElementMatcher::named(method))
        .intercept(implementation)
        .make()
        .unwrap()
}

fn accessors(dynamic: &DynamicType) -> Vec<String> {
    dynamic
        .description
        .methods
        .iter()
        .filter(|m| m.name.contains("$accessor$"))
        .map(|m| m.name.clone())
        .collect()
}

#[cfg(test)]
mod accessor_body_tests {
    use super::*;

    #[test]
    fn test_accessor_of_abstract_method_throws_with_signature() {
        init_logging();
        let dynamic = delegating(
            "demo/Computing",
            "compute",
            Implementation::delegate_to(INTERCEPTOR, "intercept"),
            Config::default(),
        );
        let names = accessors(&dynamic);
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("compute$accessor$"));

        let message = format!("{}public long demo.Computing.compute(int)", NO_SUPER_IMPLEMENTATION);
        assert!(contains_bytes(&dynamic.bytes, message.as_bytes()));
        let parsed = ClassReader::new(&dynamic.bytes).read().unwrap();
        let accessor = parsed.method(&names[0], "(I)J").unwrap();
        assert_eq!(accessor.code.as_ref().unwrap().code.last(), Some(&0xbf));
    }

    #[test]
    fn test_accessor_of_concrete_method_calls_super() {
        let dynamic = delegating(
            "demo/Naming",
            "name",
            Implementation::delegate_to(INTERCEPTOR, "intercept"),
            Config::default(),
        );
        let names = accessors(&dynamic);
        let parsed = ClassReader::new(&dynamic.bytes).read().unwrap();
        let accessor = parsed.method(&names[0], "()Ljava/lang/String;").unwrap();
        let code = &accessor.code.as_ref().unwrap().code;
        // aload_0, invokespecial demo/Base.name, areturn
        assert_eq!(code.len(), 5);
        assert_eq!(code[1], 0xb7);
        let index = u16::from_be_bytes([code[2], code[3]]);
        assert_eq!(parsed.constant_pool.member_ref(index).unwrap(), (BASE, "name", "()Ljava/lang/String;"));
        assert_eq!(code[4], 0xb0);
    }

    #[test]
    fn test_accessor_of_default_method_calls_interface() {
        let dynamic = ClassWeaver::with_pool(Config::default(), Arc::new(fixture_pool()))
            .subclass(OBJECT)
            .unwrap()
            .name("demo/Polite")
            .implement(GREETER)
            .method(ElementMatcher::named("greet"))
            .intercept(Implementation::delegate_to(INTERCEPTOR, "intercept"))
            .make()
            .unwrap();
        assert!(!contains_bytes(&dynamic.bytes, NO_SUPER_IMPLEMENTATION.as_bytes()));
        let names = accessors(&dynamic);
        assert_eq!(names.len(), 1);
        let parsed = ClassReader::new(&dynamic.bytes).read().unwrap();
        let code = &parsed.method(&names[0], "()Ljava/lang/String;").unwrap().code.as_ref().unwrap().code;
        // aload_0, invokespecial demo/Greeter.greet, areturn
        assert_eq!(code.len(), 5);
        assert_eq!(code[1], 0xb7);
        let index = u16::from_be_bytes([code[2], code[3]]);
        assert_eq!(parsed.constant_pool.member_ref(index).unwrap(), (GREETER, "greet", "()Ljava/lang/String;"));
    }

    #[test]
    fn test_repeated_delegation_shares_accessor_and_proxy() {
        let delegation = Implementation::delegate_to(INTERCEPTOR, "intercept");
        let dynamic = delegating(
            "demo/Twice",
            "name",
            delegation.clone().and_then(delegation),
            Config::default().with_auxiliary_naming(AuxiliaryNaming::Counter),
        );
        assert_eq!(accessors(&dynamic), vec!["name$accessor$1".to_string()]);
        assert_eq!(dynamic.auxiliary.len(), 1);
        assert_eq!(dynamic.auxiliary[0].name(), "demo/Twice$auxiliary$1");
    }
}

#[cfg(test)]
mod proxy_tests {
    use super::*;

    #[test]
    fn test_proxy_captures_receiver_and_arguments() {
        let dynamic = delegating(
            "demo/Proxied",
            "compute",
            Implementation::delegate_to(INTERCEPTOR, "intercept"),
            Config::default(),
        );
        assert_eq!(dynamic.auxiliary.len(), 1);
        let proxy = ClassReader::new(&dynamic.auxiliary[0].bytes).read().unwrap();
        assert_eq!(proxy.super_class.as_deref(), Some(OBJECT));
        assert_eq!(proxy.interfaces, vec![RUNNABLE, CALLABLE]);
        assert_eq!(proxy.fields.len(), 2);
        assert!(proxy.method("<init>", "(Ldemo/Proxied;I)V").is_some());
        assert!(proxy.method("call", "()Ljava/lang/Object;").is_some());
        assert!(proxy.method("run", "()V").is_some());
    }

    #[test]
    fn test_auxiliary_types_load_before_their_owner() {
        let dynamic = delegating(
            "demo/Loaded",
            "name",
            Implementation::delegate_to(INTERCEPTOR, "intercept"),
            Config::default(),
        );
        let loader = InMemoryClassLoader::new("test");
        let loaded = dynamic.load(&loader, None).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].name, "demo/Loaded");
        assert!(loaded[0].name.starts_with("demo/Loaded$auxiliary$"));
        assert_eq!(loader.loaded_names().len(), 2);
    }
}
