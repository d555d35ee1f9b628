//! Module namespaces

use crate::runtime::value::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub type ModuleRef = Rc<Namespace>;

/// Lifecycle of a cached namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Created; top-level code has not finished.
    Initializing,
    Ready,
    /// The default load raised.
    Failed,
}

/// The executed contents of a module plus where it came from.
pub struct Namespace {
    name: String,
    parent: Option<String>,
    file: RefCell<Option<PathBuf>>,
    /// Set for packages: where their submodules are searched.
    search_path: RefCell<Option<Vec<PathBuf>>>,
    values: RefCell<HashMap<String, Value>>,
    state: Cell<ModuleState>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> ModuleRef {
        let name = name.into();
        let parent = name.rsplit_once('.').map(|(parent, _)| parent.to_string());
        let namespace = Self {
            parent,
            file: RefCell::new(None),
            search_path: RefCell::new(None),
            values: RefCell::new(HashMap::new()),
            state: Cell::new(ModuleState::Initializing),
            name,
        };
        namespace.set("__name__", Value::str(&namespace.name));
        Rc::new(namespace)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the enclosing package, if any.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Final component of the identifier.
    pub fn leaf(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Value) {
        self.values.borrow_mut().insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
    }

    pub fn file(&self) -> Option<PathBuf> {
        self.file.borrow().clone()
    }

    pub fn set_file(&self, path: &Path) {
        *self.file.borrow_mut() = Some(path.to_path_buf());
        self.set("__file__", Value::str(&path.to_string_lossy()));
    }

    pub fn search_path(&self) -> Option<Vec<PathBuf>> {
        self.search_path.borrow().clone()
    }

    pub fn set_search_path(&self, dirs: Vec<PathBuf>) {
        *self.search_path.borrow_mut() = Some(dirs);
    }

    pub fn is_package(&self) -> bool {
        self.search_path.borrow().is_some()
    }

    pub fn state(&self) -> ModuleState {
        self.state.get()
    }

    pub fn set_state(&self, state: ModuleState) {
        self.state.set(state);
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("file", &self.file.borrow())
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}
