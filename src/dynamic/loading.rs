//! Class loading strategies
//!
//! Loading a generated type is a collaborator's job. [`InMemoryClassLoader`] is the reference
//! strategy: it parses and keeps the bytes of every defined type, refuses to define a name
//! twice and can serve its classes back to a [`TypePool`](crate::pool::TypePool) through a
//! [`ClassFileLocator`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use log::debug;

use crate::classfile::reader::ClassReader;
use crate::common::{Error, Result};
use crate::description::TypeDescription;
use crate::pool::ClassFileLocator;

/// A type defined by a [`ClassLoadingStrategy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedType {
    pub name: String,
    pub description: TypeDescription,
    /// Name of the defining loader
    pub loader: String,
}

pub trait ClassLoadingStrategy {
    /// Define `name` from `bytes`; `parent` names the loader the new type delegates to
    fn load(&self, name: &str, bytes: &[u8], parent: Option<&str>) -> Result<LoadedType>;
}

/// Keeps defined classes in memory
#[derive(Debug)]
pub struct InMemoryClassLoader {
    name: String,
    classes: RwLock<HashMap<String, (Vec<u8>, LoadedType)>>,
}

impl InMemoryClassLoader {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), classes: RwLock::new(HashMap::new()) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find(&self, name: &str) -> Option<LoadedType> {
        let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
        classes.get(name).map(|(_, loaded)| loaded.clone())
    }

    pub fn bytes_of(&self, name: &str) -> Option<Vec<u8>> {
        let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
        classes.get(name).map(|(bytes, _)| bytes.clone())
    }

    pub fn loaded_names(&self) -> Vec<String> {
        let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = classes.keys().cloned().collect();
        names.sort();
        names
    }

    /// A locator serving every class defined so far
    pub fn locator(&self) -> ClassFileLocator {
        let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
        ClassFileLocator::for_map(classes.iter().map(|(name, (bytes, _))| (name.clone(), bytes.clone())).collect())
    }
}

impl ClassLoadingStrategy for InMemoryClassLoader {
    fn load(&self, name: &str, bytes: &[u8], parent: Option<&str>) -> Result<LoadedType> {
        let description = ClassReader::new(bytes).read()?.to_type_description()?;
        if description.name != name {
            return Err(Error::linkage(format!("{} was defined with the bytes of {}", name, description.name)));
        }
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        if classes.contains_key(name) {
            return Err(Error::linkage(format!("{} attempted duplicate class definition for {}", self.name, name)));
        }
        let loaded = LoadedType { name: name.to_string(), description, loader: self.name.clone() };
        classes.insert(name.to_string(), (bytes.to_vec(), loaded.clone()));
        debug!("{} defined {} (parent {})", self.name, name, parent.unwrap_or("<bootstrap>"));
        Ok(loaded)
    }
}
