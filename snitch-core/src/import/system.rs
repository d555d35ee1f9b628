use super::builtin::BuiltinFinder;
use super::cache::ModuleCache;
use super::error::ImportError;
use super::finder::{Finder, ModuleHandle};
use super::namespace::{ModuleRef, ModuleState};
use super::path_finder::PathFinder;
use crate::interpreter::Interpreter;
use crate::runtime::value::Value;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, trace};

/// The module cache plus the resolution chain.
pub struct ImportSystem {
    cache: ModuleCache,
    builtin: BuiltinFinder,
    /// Registered finders, consulted in registration order.
    meta_path: RefCell<Vec<Rc<dyn Finder>>>,
    path_finder: PathFinder,
}

impl ImportSystem {
    pub fn new() -> Self {
        Self {
            cache: ModuleCache::new(),
            builtin: BuiltinFinder,
            meta_path: RefCell::new(Vec::new()),
            path_finder: PathFinder,
        }
    }

    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Append `finder` after every finder registered so far.
    pub fn register(&self, finder: Rc<dyn Finder>) -> Result<(), ImportError> {
        let name = finder.name().to_string();
        if self.finder_names().contains(&name) {
            return Err(ImportError::DuplicateFinder(name));
        }
        debug!(target: "snitch::import", finder = %name, "finder registered");
        self.meta_path.borrow_mut().push(finder);
        Ok(())
    }

    /// Names of the whole chain, in consultation order.
    pub fn finder_names(&self) -> Vec<String> {
        let mut names = vec![self.builtin.name().to_string()];
        names.extend(self.meta_path.borrow().iter().map(|f| f.name().to_string()));
        names.push(self.path_finder.name().to_string());
        names
    }

    /// Resolve `id`, importing its parent packages first.
    pub fn import(&self, host: &Interpreter, id: &str) -> Result<ModuleRef, ImportError> {
        if let Some(cached) = self.cached(id)? {
            return Ok(cached);
        }

        let search_path = match id.rsplit_once('.') {
            Some((parent_id, _)) => {
                let parent = self.import(host, parent_id)?;
                // The parent's body may have imported this module already.
                if let Some(cached) = self.cached(id)? {
                    return Ok(cached);
                }
                match parent.search_path() {
                    Some(dirs) => Some(dirs),
                    None => {
                        return Err(ImportError::NotAPackage {
                            id: id.to_string(),
                            parent: parent_id.to_string(),
                        })
                    }
                }
            }
            None => None,
        };

        let Some(handle) = self.find(host, id, search_path.as_deref())? else {
            return Err(ImportError::NotFound(id.to_string()));
        };

        let module = handle.materialize();
        if module.state() == ModuleState::Initializing {
            module.set_state(ModuleState::Ready);
        }
        let module = self.cache.insert(id, module);
        if let Some((parent_id, leaf)) = id.rsplit_once('.') {
            if let Some(parent) = self.cache.get(parent_id) {
                parent.set(leaf, Value::Module(module.clone()));
            }
        }
        Ok(module)
    }

    /// A cache hit, unless the module failed to load.
    fn cached(&self, id: &str) -> Result<Option<ModuleRef>, ImportError> {
        match self.cache.get(id) {
            Some(module) if module.state() == ModuleState::Failed => {
                Err(ImportError::Failed(id.to_string()))
            }
            Some(module) => {
                trace!(target: "snitch::import", id, state = ?module.state(), "cache hit");
                Ok(Some(module))
            }
            None => Ok(None),
        }
    }

    fn find(
        &self,
        host: &Interpreter,
        id: &str,
        search_path: Option<&[PathBuf]>,
    ) -> Result<Option<ModuleHandle>, ImportError> {
        // Finders import recursively, so the chain is not borrowed while they run.
        let registered: Vec<Rc<dyn Finder>> = self.meta_path.borrow().clone();
        let mut chain: Vec<&dyn Finder> = Vec::with_capacity(registered.len() + 2);
        chain.push(&self.builtin);
        chain.extend(registered.iter().map(|f| f.as_ref() as &dyn Finder));
        chain.push(&self.path_finder);

        for finder in chain {
            if let Some(handle) = finder.find_module(host, id, search_path)? {
                debug!(target: "snitch::import", id, finder = finder.name(), "module resolved");
                return Ok(Some(handle));
            }
        }
        Ok(None)
    }
}

impl Default for ImportSystem {
    fn default() -> Self {
        Self::new()
    }
}
