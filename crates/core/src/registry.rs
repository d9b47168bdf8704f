//! Named registration store with duplicate rejection
//!
//! One registry instance backs one namespace (user-config options, CLI
//! options, methods). Entries keep insertion order so pipeline passes see
//! registrations in the order plugins declared them.

use indexmap::IndexMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Registry<T> {
    kind: &'static str,
    entries: IndexMap<String, T>,
}

impl<T> Registry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// Namespace label used in error messages
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Register a new entry. Registering a name that is already present is
    /// a fatal configuration error.
    pub fn register(&mut self, name: impl Into<String>, value: T) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(Error::DuplicateRegistration {
                kind: self.kind,
                name,
            });
        }
        self.entries.insert(name, value);
        Ok(())
    }

    /// Insert or replace, bypassing the duplicate check. Only the
    /// registration-modification pass uses this.
    pub fn set(&mut self, name: impl Into<String>, value: T) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order
    pub fn list(&self) -> impl Iterator<Item = (&String, &T)> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &IndexMap<String, T> {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new("userConfig");
        registry.register("entry", 1).unwrap();
        registry.register("outputDir", 2).unwrap();

        assert!(registry.has("entry"));
        assert_eq!(registry.get("outputDir"), Some(&2));
        assert_eq!(registry.get("missing"), None);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = Registry::new("cliOption");
        registry.register("port", ()).unwrap();

        let err = registry.register("port", ()).unwrap_err();
        match err {
            Error::DuplicateRegistration { kind, name } => {
                assert_eq!(kind, "cliOption");
                assert_eq!(name, "port");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_fails_regardless_of_prior_count() {
        let mut registry = Registry::new("task");
        for name in ["a", "b", "c", "d"] {
            registry.register(name, ()).unwrap();
        }
        assert!(registry.register("b", ()).is_err());
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut registry = Registry::new("userConfig");
        for name in ["zeta", "alpha", "mid"] {
            registry.register(name, ()).unwrap();
        }
        let names: Vec<&String> = registry.list().map(|(name, _)| name).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_set_replaces_without_error() {
        let mut registry = Registry::new("userConfig");
        registry.register("entry", 1).unwrap();
        registry.set("entry", 5);
        assert_eq!(registry.get("entry"), Some(&5));
    }
}
