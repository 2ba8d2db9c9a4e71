//! Constructors written for generated subclasses

mod common;

use std::sync::Arc;

use classweave::classfile::ClassReader;
use classweave::consts::{CONSTRUCTOR_NAME, OBJECT};
use classweave::description::Modifiers;
use classweave::{ClassWeaver, Config, ConstructorStrategy, Error};
use common::*;

fn weaver() -> ClassWeaver {
    ClassWeaver::with_pool(Config::default(), Arc::new(fixture_pool()))
}

#[cfg(test)]
mod default_constructor_tests {
    use super::*;

    #[test]
    fn test_trivial_subclass_calls_super_constructor() {
        init_logging();
        let dynamic = weaver()
            .subclass(OBJECT)
            .unwrap()
            .name("demo/Trivial")
            .constructor_strategy(ConstructorStrategy::DefaultConstructor)
            .make()
            .unwrap();
        let parsed = ClassReader::new(&dynamic.bytes).read().unwrap();
        let constructors: Vec<_> = parsed.methods.iter().filter(|m| m.name == CONSTRUCTOR_NAME).collect();
        assert_eq!(constructors.len(), 1);
        assert_eq!(constructors[0].descriptor, "()V");
        assert_eq!(constructors[0].access_flags, Modifiers::PUBLIC.bits());

        let code = &constructors[0].code.as_ref().unwrap().code;
        assert_eq!(code.len(), 5);
        assert_eq!(code[0], 0x2a);
        assert_eq!(code[1], 0xb7);
        assert_eq!(code[4], 0xb1);
        let index = u16::from_be_bytes([code[2], code[3]]);
        assert_eq!(parsed.constant_pool.member_ref(index).unwrap(), (OBJECT, CONSTRUCTOR_NAME, "()V"));
    }

    #[test]
    fn test_default_constructor_needs_no_argument_super_constructor() {
        let pool = fixture_pool();
        pool.register(
            classweave::description::TypeDescription::class("demo/NeedsArgument", OBJECT).with_method(
                classweave::description::MethodToken::constructor(
                    Modifiers::PUBLIC,
                    vec![classweave::description::TypeRef::int()],
                ),
            ),
        );
        let result = ClassWeaver::with_pool(Config::default(), Arc::new(pool))
            .subclass("demo/NeedsArgument")
            .unwrap()
            .constructor_strategy(ConstructorStrategy::DefaultConstructor)
            .make();
        assert!(matches!(result, Err(Error::NoDefaultConstructor { found: 0, .. })));
    }

    #[test]
    fn test_no_constructors() {
        let dynamic = weaver()
            .subclass(OBJECT)
            .unwrap()
            .name("demo/Bare")
            .constructor_strategy(ConstructorStrategy::NoConstructors)
            .make()
            .unwrap();
        let parsed = ClassReader::new(&dynamic.bytes).read().unwrap();
        assert!(parsed.methods.iter().all(|m| m.name != CONSTRUCTOR_NAME));
    }
}

#[cfg(test)]
mod imitation_tests {
    use super::*;

    #[test]
    fn test_imitated_constructors_round_trip() {
        let pool = fixture_pool();
        let base = pool.describe(BASE).unwrap();
        let dynamic = ClassWeaver::with_pool(Config::default(), Arc::new(pool))
            .subclass(BASE)
            .unwrap()
            .name("demo/Imitation")
            .make()
            .unwrap();
        let description = ClassReader::new(&dynamic.bytes).read().unwrap().to_type_description().unwrap();
        let mut expected: Vec<_> = base.declared_constructors().map(|c| c.token()).collect();
        let mut actual: Vec<_> = description.declared_constructors().map(|c| c.token()).collect();
        expected.sort_by_key(|token| token.signature_token().descriptor());
        actual.sort_by_key(|token| token.signature_token().descriptor());
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_public_imitation_drops_protected_constructors() {
        let dynamic = weaver()
            .subclass(BASE)
            .unwrap()
            .name("demo/PublicImitation")
            .constructor_strategy(ConstructorStrategy::ImitateSuperTypePublic)
            .make()
            .unwrap();
        let parsed = ClassReader::new(&dynamic.bytes).read().unwrap();
        let constructors: Vec<_> = parsed.methods.iter().filter(|m| m.name == CONSTRUCTOR_NAME).collect();
        assert_eq!(constructors.len(), 1);
        assert_eq!(constructors[0].descriptor, "()V");
    }

    #[test]
    fn test_forwarding_constructor_loads_every_argument() {
        let dynamic = weaver().subclass(BASE).unwrap().name("demo/Forwarding").make().unwrap();
        let parsed = ClassReader::new(&dynamic.bytes).read().unwrap();
        let constructor = parsed.method(CONSTRUCTOR_NAME, "(Ljava/lang/String;J)V").unwrap();
        assert_eq!(constructor.exceptions, vec!["java/io/IOException"]);
        let code = constructor.code.as_ref().unwrap();
        // aload_0, aload_1, lload_2, invokespecial, return
        assert_eq!(&code.code[..3], &[0x2a, 0x2b, 0x20]);
        assert_eq!(code.max_locals, 4);
        assert_eq!(code.max_stack, 4);
    }
}
