//! Building, saving and loading generated types

pub mod builder;
pub mod loading;

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::classfile::ClassFileWriter;
use crate::common::{Config, Result};
use crate::description::TypeDescription;
use crate::scaffold::type_writer::{CompiledMethod, TypeHeader, TypeWriter};

pub use builder::{Builder, ClassWeaver, MethodDefinition, MethodInterception};
pub use loading::{ClassLoadingStrategy, InMemoryClassLoader, LoadedType};

/// A generated type with the auxiliary types it depends on
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicType {
    pub description: TypeDescription,
    pub bytes: Vec<u8>,
    pub auxiliary: Vec<DynamicType>,
}

impl DynamicType {
    pub fn new(description: TypeDescription, bytes: Vec<u8>, auxiliary: Vec<DynamicType>) -> Self {
        Self { description, bytes, auxiliary }
    }

    pub fn name(&self) -> &str {
        &self.description.name
    }

    /// Name and bytes of this type and, depth first, of every auxiliary type
    pub fn all_types(&self) -> Vec<(&str, &[u8])> {
        let mut types = vec![(self.name(), self.bytes.as_slice())];
        for auxiliary in &self.auxiliary {
            types.extend(auxiliary.all_types());
        }
        types
    }

    /// Write every type as `<dir>/<internal name>.class`
    pub fn save_in(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut written = Vec::new();
        for (name, bytes) in self.all_types() {
            let path = dir.join(format!("{}.class", name));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, bytes)?;
            debug!("Saved {} to {}", name, path.display());
            written.push(path);
        }
        Ok(written)
    }

    /// Define the auxiliary types, then this type; the first failure aborts
    pub fn load<S: ClassLoadingStrategy + ?Sized>(&self, strategy: &S, parent: Option<&str>) -> Result<Vec<LoadedType>> {
        let mut loaded = Vec::new();
        for auxiliary in &self.auxiliary {
            loaded.extend(auxiliary.load(strategy, parent)?);
        }
        loaded.push(strategy.load(self.name(), &self.bytes, parent)?);
        Ok(loaded)
    }
}

/// Serialize a compiled type with the default class file writer
pub(crate) fn write_type(
    description: &TypeDescription,
    methods: &[CompiledMethod],
    accessors: &[CompiledMethod],
    config: &Config,
) -> Result<Vec<u8>> {
    let header = TypeHeader::of(description, config.class_file_version);
    let mut visitor = ClassFileWriter::new(config.writes_frames());
    TypeWriter::new(header, &description.fields, methods, accessors).write(&mut visitor)
}
