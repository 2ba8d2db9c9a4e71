//! Sources of class file bytes for describing existing types

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::common::Result;

/// Locates the class file of a type by internal name
#[derive(Debug, Clone)]
pub enum ClassFileLocator {
    /// Class files held in memory
    ForMap(HashMap<String, Vec<u8>>),
    /// A directory of `.class` files laid out by package
    ForDirectory { root: PathBuf, index: HashMap<String, PathBuf> },
    /// Query each locator in order
    Compound(Vec<ClassFileLocator>),
}

impl ClassFileLocator {
    pub fn for_map(classes: HashMap<String, Vec<u8>>) -> Self {
        ClassFileLocator::ForMap(classes)
    }

    /// Index every class file below `root`
    pub fn for_directory(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut index = HashMap::new();
        for entry in WalkDir::new(&root).follow_links(true).into_iter().filter_map(|entry| entry.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map(|e| e != "class").unwrap_or(true) {
                continue;
            }
            let relative = match path.strip_prefix(&root) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            let name: Vec<String> = relative
                .with_extension("")
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect();
            index.insert(name.join("/"), path.to_path_buf());
        }
        log::debug!("indexed {} class files below {}", index.len(), root.display());
        Ok(ClassFileLocator::ForDirectory { root, index })
    }

    pub fn compound(locators: Vec<ClassFileLocator>) -> Self {
        ClassFileLocator::Compound(locators)
    }

    /// Bytes of the class file for `name`, if known
    pub fn locate(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match self {
            ClassFileLocator::ForMap(classes) => Ok(classes.get(name).cloned()),
            ClassFileLocator::ForDirectory { index, .. } => match index.get(name) {
                Some(path) => Ok(Some(fs::read(path)?)),
                None => Ok(None),
            },
            ClassFileLocator::Compound(locators) => {
                for locator in locators {
                    if let Some(bytes) = locator.locate(name)? {
                        return Ok(Some(bytes));
                    }
                }
                Ok(None)
            }
        }
    }

    /// Internal names of every type this locator knows, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self {
            ClassFileLocator::ForMap(classes) => classes.keys().cloned().collect(),
            ClassFileLocator::ForDirectory { index, .. } => index.keys().cloned().collect(),
            ClassFileLocator::Compound(locators) => locators.iter().flat_map(|l| l.names()).collect(),
        };
        names.sort();
        names.dedup();
        names
    }
}
