//! Process-wide registry of class file transformers
//!
//! An agent registers a transformer once and refers to it by id from code that runs while
//! classes are being loaded. A transformer may be removed at any time; looking up a removed
//! id behaves as if no transformer had ever been registered.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, trace};
use once_cell::sync::Lazy;

use crate::common::{Error, Result};

static GLOBAL: Lazy<TransformerRegistry> = Lazy::new(TransformerRegistry::new);

/// Rewrites the bytes of a class while it is defined
pub trait ClassFileTransformer: Send + Sync {
    /// The replacement bytes, or `None` to keep the class unchanged
    fn transform(&self, class_name: &str, bytes: &[u8]) -> Result<Option<Vec<u8>>>;
}

impl<F> ClassFileTransformer for F
where
    F: Fn(&str, &[u8]) -> Result<Option<Vec<u8>>> + Send + Sync,
{
    fn transform(&self, class_name: &str, bytes: &[u8]) -> Result<Option<Vec<u8>>> {
        self(class_name, bytes)
    }
}

pub struct TransformerRegistry {
    next_id: AtomicU64,
    transformers: RwLock<HashMap<u64, Arc<dyn ClassFileTransformer>>>,
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerRegistry").field("registered", &self.len()).finish()
    }
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self { next_id: AtomicU64::new(1), transformers: RwLock::new(HashMap::new()) }
    }

    /// The registry shared by the whole process
    pub fn global() -> &'static TransformerRegistry {
        &GLOBAL
    }

    /// Register `transformer` under a fresh id
    pub fn register(&self, transformer: Arc<dyn ClassFileTransformer>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.transformers.write().unwrap_or_else(PoisonError::into_inner).insert(id, transformer);
        debug!("Registered class file transformer #{}", id);
        id
    }

    /// Whether a transformer was registered under `id`
    pub fn unregister(&self, id: u64) -> bool {
        let removed = self.transformers.write().unwrap_or_else(PoisonError::into_inner).remove(&id).is_some();
        if removed {
            debug!("Unregistered class file transformer #{}", id);
        }
        removed
    }

    pub fn get(&self, id: u64) -> Option<Arc<dyn ClassFileTransformer>> {
        self.transformers.read().unwrap_or_else(PoisonError::into_inner).get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.transformers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply the transformer registered under `id`
    ///
    /// The lock is released before the transformer runs, so a transformer may register or
    /// unregister others.
    pub fn transform(&self, id: u64, class_name: &str, bytes: &[u8]) -> Result<Option<Vec<u8>>> {
        let Some(transformer) = self.get(id) else {
            trace!("No class file transformer #{} for {}", id, class_name);
            return Ok(None);
        };
        transformer.transform(class_name, bytes).map_err(|error| match error {
            error @ Error::Transformation { .. } => error,
            other => Error::Transformation { class_name: class_name.to_string(), message: other.to_string() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn upper_case() -> Arc<dyn ClassFileTransformer> {
        Arc::new(|_: &str, bytes: &[u8]| -> Result<Option<Vec<u8>>> { Ok(Some(bytes.to_ascii_uppercase())) })
    }

    #[test]
    fn test_removed_transformer_is_absent() {
        let registry = TransformerRegistry::new();
        let id = registry.register(upper_case());
        assert_eq!(registry.transform(id, "demo/Foo", b"abc").unwrap(), Some(b"ABC".to_vec()));
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert_eq!(registry.transform(id, "demo/Foo", b"abc").unwrap(), None);
    }

    #[test]
    fn test_failures_name_the_class() {
        let registry = TransformerRegistry::new();
        let failing: Arc<dyn ClassFileTransformer> =
            Arc::new(|_: &str, _: &[u8]| -> Result<Option<Vec<u8>>> { Err(Error::internal("broken")) });
        let id = registry.register(failing);
        match registry.transform(id, "demo/Foo", b"") {
            Err(Error::Transformation { class_name, .. }) => assert_eq!(class_name, "demo/Foo"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(TransformerRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    (0..50)
                        .map(|_| {
                            let id = registry.register(upper_case());
                            let _ = registry.transform(id, "demo/Foo", b"x");
                            id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut ids: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        assert_eq!(registry.len(), 400);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 400);
        ids.iter().for_each(|id| assert!(registry.unregister(*id)));
        assert!(registry.is_empty());
    }
}
