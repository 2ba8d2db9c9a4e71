//! A resolved snapshot of a type and all of its supertypes

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::common::{Error, Result};
use crate::consts::{MAX_HIERARCHY_DEPTH, OBJECT};
use crate::description::TypeDescription;

use super::TypePool;

/// A type together with every transitive supertype, resolved up front so that
/// assignability queries cannot fail
#[derive(Debug, Clone)]
pub struct TypeHierarchy {
    root: String,
    types: HashMap<String, Arc<TypeDescription>>,
}

impl TypeHierarchy {
    /// Resolve the ancestry of `root`; `root` itself need not be known to the pool
    pub fn resolve(root: &TypeDescription, pool: &TypePool) -> Result<Self> {
        let mut types = HashMap::new();
        types.insert(root.name.clone(), Arc::new(root.clone()));

        // superclass chain first, a repeated name is a cycle
        let mut chain = HashSet::new();
        chain.insert(root.name.clone());
        let mut next = root.super_class.clone();
        while let Some(name) = next {
            if !chain.insert(name.clone()) || chain.len() > MAX_HIERARCHY_DEPTH {
                return Err(Error::CircularHierarchy { name });
            }
            let description = pool.describe(&name)?;
            next = description.super_class.clone();
            types.insert(name, description);
        }

        // then every interface reachable from any collected type, each resolved once
        let mut done = HashSet::new();
        let starts: Vec<String> = types.values().flat_map(|t| t.interfaces.iter().cloned()).collect();
        for start in starts {
            collect_interfaces(&start, pool, &mut types, &mut done)?;
        }
        Ok(Self { root: root.name.clone(), types })
    }

    pub fn root(&self) -> &TypeDescription {
        // resolve() always inserts the root
        &self.types[&self.root]
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescription> {
        self.types.get(name).map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Superclasses of the root, nearest first
    pub fn superclasses(&self) -> Vec<&TypeDescription> {
        let mut chain = Vec::new();
        let mut next = self.root().super_class.as_deref();
        while let Some(name) = next {
            match self.get(name) {
                Some(description) => {
                    chain.push(description);
                    next = description.super_class.as_deref();
                }
                None => break,
            }
        }
        chain
    }

    /// Whether a value of type `source` may be assigned to `target`
    pub fn is_assignable_from(&self, target: &str, source: &str) -> bool {
        if target == source || target == OBJECT {
            return true;
        }
        let mut visited = HashSet::new();
        let mut pending = vec![source];
        while let Some(name) = pending.pop() {
            if !visited.insert(name) {
                continue;
            }
            if name == target {
                return true;
            }
            if let Some(description) = self.get(name) {
                pending.extend(description.direct_supertypes());
            }
        }
        false
    }
}

/// Depth-first walk over the interfaces extended by `start`; an interface met again on the
/// current path is a cycle
fn collect_interfaces(
    start: &str,
    pool: &TypePool,
    types: &mut HashMap<String, Arc<TypeDescription>>,
    done: &mut HashSet<String>,
) -> Result<()> {
    if done.contains(start) {
        return Ok(());
    }
    let mut on_path = HashSet::new();
    on_path.insert(start.to_string());
    let mut path = vec![(lookup(start, pool, types)?, 0usize)];
    while let Some((description, position)) = path.last_mut() {
        let next = description.interfaces.get(*position).cloned();
        *position += 1;
        let name = description.name.clone();
        let Some(interface) = next else {
            on_path.remove(&name);
            done.insert(name);
            path.pop();
            continue;
        };
        if done.contains(&interface) {
            continue;
        }
        if on_path.contains(&interface) || path.len() >= MAX_HIERARCHY_DEPTH {
            return Err(Error::CircularHierarchy { name: interface });
        }
        let description = lookup(&interface, pool, types)?;
        on_path.insert(interface);
        path.push((description, 0));
    }
    Ok(())
}

fn lookup(
    name: &str,
    pool: &TypePool,
    types: &mut HashMap<String, Arc<TypeDescription>>,
) -> Result<Arc<TypeDescription>> {
    if let Some(description) = types.get(name) {
        return Ok(Arc::clone(description));
    }
    let description = pool.describe(name)?;
    types.insert(name.to_string(), Arc::clone(&description));
    Ok(description)
}
