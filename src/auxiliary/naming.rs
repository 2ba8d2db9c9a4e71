//! Names of accessors and auxiliary types

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

static GLOBAL_SUFFIX: AtomicU64 = AtomicU64::new(1);

/// The next value of the process-wide suffix counter
pub fn next_suffix() -> u64 {
    GLOBAL_SUFFIX.fetch_add(1, Ordering::Relaxed)
}

/// How generated members and types are told apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuxiliaryNaming {
    /// Position of the name within one build, starting at 1
    Counter,
    /// Hash of the generated element's content; equal content yields equal names
    #[default]
    ContentHash,
    /// Process-wide counter, unique across builds
    Global,
}

impl AuxiliaryNaming {
    /// Suffix for the `index`th element of a build whose content is `content`
    pub fn suffix<T: Hash + ?Sized>(self, index: usize, content: &T) -> String {
        match self {
            AuxiliaryNaming::Counter => (index + 1).to_string(),
            AuxiliaryNaming::ContentHash => hash_of(content),
            AuxiliaryNaming::Global => next_suffix().to_string(),
        }
    }
}

/// Eight hex digits derived from `content`
pub fn hash_of<T: Hash + ?Sized>(content: &T) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:08x}", hasher.finish() as u32)
}

/// `{base}${infix}${suffix}`
pub fn compose(base: &str, infix: &str, suffix: &str) -> String {
    format!("{}${}${}", base, infix, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_content_hash_is_stable() {
        let first = AuxiliaryNaming::ContentHash.suffix(0, "toString()Ljava/lang/String;");
        let second = AuxiliaryNaming::ContentHash.suffix(7, "toString()Ljava/lang/String;");
        assert_eq!(first, second);
        assert_eq!(first.len(), 8);
        assert_ne!(first, AuxiliaryNaming::ContentHash.suffix(0, "hashCode()I"));
    }

    #[test]
    fn test_counter_suffix() {
        assert_eq!(AuxiliaryNaming::Counter.suffix(0, "a"), "1");
        assert_eq!(compose("demo/Foo", "auxiliary", "2"), "demo/Foo$auxiliary$2");
    }

    #[test]
    fn test_global_suffixes_are_unique_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(|| (0..100).map(|_| next_suffix()).collect::<Vec<_>>()))
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            for suffix in handle.join().unwrap() {
                assert!(seen.insert(suffix));
            }
        }
        assert_eq!(seen.len(), 800);
    }
}
