//! Saving, loading and transforming generated types

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use classweave::consts::{OBJECT, STRING};
use classweave::description::{Modifiers, SignatureToken, TypeRef};
use classweave::dynamic::{ClassLoadingStrategy, InMemoryClassLoader};
use classweave::pool::TypePool;
use classweave::scaffold::MethodGraph;
use classweave::transformer::{ClassFileTransformer, TransformerRegistry};
use classweave::{ClassWeaver, Config, ElementMatcher, Error, Implementation, Result, Value};
use common::*;
use tempfile::TempDir;

fn greeter(weaver: &ClassWeaver, name: &str) -> classweave::DynamicType {
    weaver
        .subclass(OBJECT)
        .unwrap()
        .name(name)
        .method(ElementMatcher::named("toString"))
        .intercept(Implementation::FixedValue(Value::Text("hello".into())))
        .make()
        .unwrap()
}

#[cfg(test)]
mod persistence_tests {
    use super::*;

    #[test]
    fn test_save_in_writes_every_type() {
        init_logging();
        let weaver = ClassWeaver::with_pool(Config::default(), Arc::new(fixture_pool()));
        let dynamic = weaver
            .subclass(BASE)
            .unwrap()
            .name("demo/Saved")
            .method(ElementMatcher::named("name"))
            .intercept(Implementation::delegate_to(INTERCEPTOR, "intercept"))
            .make()
            .unwrap();
        let dir = TempDir::new().unwrap();
        let written = dynamic.save_in(dir.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0], dir.path().join("demo/Saved.class"));
        assert!(written.iter().all(|path| path.exists()));
    }

    #[test]
    fn test_loaded_types_are_visible_to_a_new_pool() {
        let weaver = ClassWeaver::default();
        let dynamic = greeter(&weaver, "demo/Greeter");
        let loader = InMemoryClassLoader::new("app");
        dynamic.load(&loader, Some("bootstrap")).unwrap();

        let pool = TypePool::new().with_locator(loader.locator());
        let description = pool.describe("demo/Greeter").unwrap();
        assert_eq!(description.super_class.as_deref(), Some(OBJECT));
        let graph = MethodGraph::compile(&description, &pool).unwrap();
        let to_string = graph.locate(&SignatureToken::new("toString", vec![], TypeRef::object(STRING))).unwrap();
        assert_eq!(to_string.representative().declaring_type, "demo/Greeter");
    }

    #[test]
    fn test_loading_twice_is_a_linkage_error() {
        let dynamic = greeter(&ClassWeaver::default(), "demo/Twice");
        let loader = InMemoryClassLoader::new("app");
        loader.load(dynamic.name(), &dynamic.bytes, None).unwrap();
        assert!(matches!(loader.load(dynamic.name(), &dynamic.bytes, None), Err(Error::Linkage { .. })));
        assert!(matches!(loader.load("demo/Other", &dynamic.bytes, None), Err(Error::Linkage { .. })));
    }

    #[test]
    fn test_type_validation_can_be_disabled() {
        let strict = ClassWeaver::default()
            .subclass(OBJECT)
            .unwrap()
            .name("demo/Weird")
            .define_field("value", TypeRef::int(), Modifiers::PUBLIC | Modifiers::PRIVATE)
            .make();
        assert!(matches!(strict, Err(Error::IllegalModifiers { .. })));

        let lenient = ClassWeaver::new(Config::default().with_type_validation(false))
            .subclass(OBJECT)
            .unwrap()
            .name("demo/Weird")
            .define_field("value", TypeRef::int(), Modifiers::PUBLIC | Modifiers::PRIVATE)
            .make();
        assert!(lenient.is_ok());
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::*;

    #[test]
    fn test_unnamed_types_get_unique_names_across_threads() {
        let weaver = ClassWeaver::default();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let weaver = weaver.clone();
                thread::spawn(move || {
                    (0..10)
                        .map(|_| weaver.subclass(OBJECT).unwrap().make().unwrap().name().to_string())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let names: HashSet<String> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        assert_eq!(names.len(), 40);
    }

    #[test]
    fn test_global_transformer_registry() {
        let registry = TransformerRegistry::global();
        let rename: Arc<dyn ClassFileTransformer> = Arc::new(|name: &str, bytes: &[u8]| -> Result<Option<Vec<u8>>> {
            Ok((name == "demo/Target").then(|| bytes.to_vec()))
        });
        let id = registry.register(rename);
        let bytes = greeter(&ClassWeaver::default(), "demo/Target").bytes;
        assert_eq!(registry.transform(id, "demo/Target", &bytes).unwrap(), Some(bytes.clone()));
        assert_eq!(registry.transform(id, "demo/Else", &bytes).unwrap(), None);

        let remover = thread::spawn(move || TransformerRegistry::global().unregister(id));
        assert!(remover.join().unwrap());
        assert_eq!(registry.transform(id, "demo/Target", &bytes).unwrap(), None);
    }
}
