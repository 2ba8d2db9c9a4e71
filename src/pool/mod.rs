//! Resolution of type names to descriptions
//!
//! A [`TypePool`] starts out with the built-in `java.lang` descriptions and falls back to
//! parsing class files from a [`ClassFileLocator`] for anything else. Pools are shared
//! between builds, so the cache is guarded by a lock.

pub mod builtin;
pub mod hierarchy;
pub mod locator;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::classfile::reader::ClassReader;
use crate::common::{Error, Result};
use crate::description::TypeDescription;

pub use hierarchy::TypeHierarchy;
pub use locator::ClassFileLocator;

#[derive(Debug)]
pub struct TypePool {
    cache: RwLock<HashMap<String, Arc<TypeDescription>>>,
    locator: Option<ClassFileLocator>,
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}

impl TypePool {
    /// A pool knowing the built-in `java.lang` types
    pub fn new() -> Self {
        let pool = Self::empty();
        for description in builtin::java_lang_types() {
            pool.register(description);
        }
        pool
    }

    /// A pool without any descriptions
    pub fn empty() -> Self {
        Self { cache: RwLock::new(HashMap::new()), locator: None }
    }

    pub fn with_locator(mut self, locator: ClassFileLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Add or replace a description
    pub fn register(&self, description: TypeDescription) -> Arc<TypeDescription> {
        let description = Arc::new(description);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(description.name.clone(), Arc::clone(&description));
        description
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).contains_key(name)
    }

    /// Describe a type by internal name, parsing its class file on first use
    pub fn describe(&self, name: &str) -> Result<Arc<TypeDescription>> {
        if let Some(description) = self.cache.read().unwrap_or_else(PoisonError::into_inner).get(name) {
            return Ok(Arc::clone(description));
        }
        let bytes = match &self.locator {
            Some(locator) => locator.locate(name)?,
            None => None,
        };
        let bytes = bytes.ok_or_else(|| Error::unknown_type(name))?;
        let description = ClassReader::new(&bytes).read()?.to_type_description()?;
        if description.name != name {
            return Err(Error::config(format!("class file for {} declares {}", name, description.name)));
        }
        log::trace!("described {} from its class file", name);
        Ok(self.register(description))
    }

    /// Resolve `root` and all of its supertypes
    pub fn hierarchy_of(&self, root: &TypeDescription) -> Result<TypeHierarchy> {
        TypeHierarchy::resolve(root, self)
    }
}
