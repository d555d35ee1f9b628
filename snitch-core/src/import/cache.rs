//! Process-lifetime module cache

use super::namespace::{ModuleRef, Namespace};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Identifier to namespace. Entries are never removed.
#[derive(Debug, Default)]
pub struct ModuleCache {
    modules: RefCell<HashMap<String, ModuleRef>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<ModuleRef> {
        self.modules.borrow().get(id).cloned()
    }

    /// The cached namespace for `id`, inserting a fresh one if absent.
    pub fn get_or_create(&self, id: &str) -> ModuleRef {
        self.modules
            .borrow_mut()
            .entry(id.to_string())
            .or_insert_with(|| Namespace::new(id))
            .clone()
    }

    /// Insert `module` unless `id` is already cached; returns the cached entry.
    pub fn insert(&self, id: &str, module: ModuleRef) -> ModuleRef {
        let mut modules = self.modules.borrow_mut();
        let entry = modules.entry(id.to_string()).or_insert(module);
        Rc::clone(entry)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.borrow().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.modules.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.borrow().is_empty()
    }

    /// Cached identifiers, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.modules.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_reuses() {
        let cache = ModuleCache::new();
        let first = cache.get_or_create("a.b");
        let second = cache.get_or_create("a.b");
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_keeps_existing() {
        let cache = ModuleCache::new();
        let original = cache.get_or_create("m");
        let kept = cache.insert("m", Namespace::new("m"));
        assert!(Rc::ptr_eq(&original, &kept));
    }

    #[test]
    fn test_ids_sorted() {
        let cache = ModuleCache::new();
        cache.get_or_create("b");
        cache.get_or_create("a");
        assert_eq!(cache.ids(), vec!["a".to_string(), "b".to_string()]);
        assert!(cache.contains("a"));
        assert!(cache.get("c").is_none());
    }
}
