//! Case-insensitive symbol names.

use indexmap::{Equivalent, IndexMap};
use rustc_hash::FxBuildHasher;
use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A symbol name with ASCII case-insensitive identity.
///
/// Build-language names compare ignoring case: `$(Foo)` and `$(FOO)` are the
/// same property. The original spelling is kept for display, hashing and
/// equality fold ASCII case.
///
/// Backed by [`SmolStr`], so names up to 23 bytes never allocate.
#[derive(Clone, Default)]
pub struct SymbolName(SmolStr);

impl SymbolName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(SmolStr::new(name.as_ref()))
    }

    /// The name as originally spelled.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a plain string.
    #[inline]
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }

    /// Whether this name is private to the file that declares it.
    pub fn is_private(&self) -> bool {
        is_private_name(&self.0)
    }
}

/// Names starting with `_` are conventionally private to their defining file.
pub fn is_private_name(name: &str) -> bool {
    name.starts_with('_')
}

impl PartialEq for SymbolName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for SymbolName {}

impl Hash for SymbolName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl fmt::Debug for SymbolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SymbolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<SmolStr> for SymbolName {
    fn from(s: SmolStr) -> Self {
        Self(s)
    }
}

impl From<String> for SymbolName {
    fn from(s: String) -> Self {
        Self(SmolStr::from(s))
    }
}

impl AsRef<str> for SymbolName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Borrowed lookup key with the same case-folding identity as [`SymbolName`].
#[derive(Clone, Copy, Debug)]
pub struct NameRef<'a>(pub &'a str);

impl Hash for NameRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl Equivalent<SymbolName> for NameRef<'_> {
    fn equivalent(&self, key: &SymbolName) -> bool {
        key.0.eq_ignore_ascii_case(self.0)
    }
}

/// Insertion-ordered symbol table keyed by case-insensitive name.
pub type SymbolTable<T> = IndexMap<SymbolName, T, FxBuildHasher>;

/// Extension methods for looking up a [`SymbolTable`] by `&str`.
pub trait SymbolTableExt<T> {
    fn get_named(&self, name: &str) -> Option<&T>;
    fn get_named_mut(&mut self, name: &str) -> Option<&mut T>;
    fn contains_named(&self, name: &str) -> bool;
}

impl<T> SymbolTableExt<T> for SymbolTable<T> {
    fn get_named(&self, name: &str) -> Option<&T> {
        self.get(&NameRef(name))
    }

    fn get_named_mut(&mut self, name: &str) -> Option<&mut T> {
        self.get_mut(&NameRef(name))
    }

    fn contains_named(&self, name: &str) -> bool {
        self.contains_key(&NameRef(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_compare_ignoring_case() {
        assert_eq!(SymbolName::new("Foo"), SymbolName::new("FOO"));
        assert_ne!(SymbolName::new("Foo"), SymbolName::new("Food"));
        assert!(SymbolName::new("Configuration").matches("configuration"));
    }

    #[test]
    fn test_names_hash_ignoring_case() {
        let mut set = HashSet::new();
        set.insert(SymbolName::new("OutputPath"));
        set.insert(SymbolName::new("outputpath"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_table_lookup_by_str() {
        let mut table: SymbolTable<u32> = SymbolTable::default();
        table.insert(SymbolName::new("Compile"), 1);
        table.insert(SymbolName::new("None"), 2);

        assert_eq!(table.get_named("COMPILE"), Some(&1));
        assert!(table.contains_named("none"));
        assert!(table.get_named("Content").is_none());
        // first spelling is kept
        table.insert(SymbolName::new("COMPILE"), 3);
        assert_eq!(table.keys().next().map(|k| k.as_str()), Some("Compile"));
    }

    #[test]
    fn test_private_names() {
        assert!(SymbolName::new("_Foo").is_private());
        assert!(!SymbolName::new("Foo_").is_private());
    }
}
