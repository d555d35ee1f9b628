//! Heap objects referenced by `Value`

use super::bytecode::Code;
use super::value::Value;
use super::vm::{Unwind, Vm};
use crate::import::ModuleRef;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

/// A script function closed over the globals of its defining module.
#[derive(Debug)]
pub struct Function {
    pub code: Rc<Code>,
    pub globals: ModuleRef,
}

pub type NativeFn = fn(&mut Vm<'_>, Vec<Value>) -> Result<Value, Unwind>;
pub type MethodFn = fn(&mut Vm<'_>, &Value, Vec<Value>) -> Result<Value, Unwind>;

/// Accepted argument counts, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exact(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub const fn variadic() -> Self {
        Self { min: 0, max: None }
    }

    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min && self.max.map_or(true, |max| n <= max)
    }
}

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: Arity,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

/// A builtin method already bound to its receiver.
pub struct BoundMethod {
    pub receiver: Value,
    pub name: &'static str,
    pub arity: Arity,
    pub func: MethodFn,
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<method {} of {}>", self.name, self.receiver.type_name())
    }
}

/// An exception type. Classes form a single-inheritance chain.
#[derive(Debug)]
pub struct ErrorClass {
    pub name: Rc<str>,
    pub parent: Option<Rc<ErrorClass>>,
}

impl ErrorClass {
    pub fn new(name: &str, parent: Option<Rc<ErrorClass>>) -> Rc<Self> {
        Rc::new(Self {
            name: Rc::from(name),
            parent,
        })
    }

    /// True if `self` is `other` or inherits from it.
    pub fn is_subclass_of(&self, other: &ErrorClass) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if std::ptr::eq(class, other) {
                return true;
            }
            current = class.parent.as_deref();
        }
        false
    }
}

/// One frame of a traceback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub file: Rc<str>,
    pub line: usize,
    pub function: Rc<str>,
}

pub type ExceptionRef = Rc<Exception>;

#[derive(Debug)]
pub struct Exception {
    pub class: Rc<ErrorClass>,
    pub message: String,
    /// Innermost frame first.
    traceback: RefCell<Vec<TraceEntry>>,
}

impl Exception {
    pub fn new(class: Rc<ErrorClass>, message: impl Into<String>) -> ExceptionRef {
        Rc::new(Self {
            class,
            message: message.into(),
            traceback: RefCell::new(Vec::new()),
        })
    }

    pub fn kind(&self) -> &str {
        &self.class.name
    }

    pub fn push_trace(&self, entry: TraceEntry) {
        self.traceback.borrow_mut().push(entry);
    }

    pub fn traceback(&self) -> Vec<TraceEntry> {
        self.traceback.borrow().clone()
    }

    /// `Kind: message`, or just `Kind` when the message is empty.
    pub fn summary(&self) -> String {
        if self.message.is_empty() {
            self.kind().to_string()
        } else {
            format!("{}: {}", self.kind(), self.message)
        }
    }

    /// Full report, outermost frame first.
    pub fn format_traceback(&self) -> String {
        let mut out = String::from("Traceback (most recent call last):\n");
        for entry in self.traceback.borrow().iter().rev() {
            out.push_str(&format!(
                "  File \"{}\", line {}, in {}\n",
                entry.file, entry.line, entry.function
            ));
        }
        out.push_str(&self.summary());
        out.push('\n');
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Read,
    Write,
    Append,
}

impl FileMode {
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "r" => Some(FileMode::Read),
            "w" => Some(FileMode::Write),
            "a" => Some(FileMode::Append),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::Read => "r",
            FileMode::Write => "w",
            FileMode::Append => "a",
        }
    }
}

/// A file opened by a script.
///
/// Holds no OS handle: every write is a complete append through the VFS, so
/// nothing leaks if the script never closes it.
#[derive(Debug)]
pub struct FileObject {
    pub path: PathBuf,
    pub mode: FileMode,
    closed: Cell<bool>,
}

impl FileObject {
    pub fn new(path: PathBuf, mode: FileMode) -> Self {
        Self {
            path,
            mode,
            closed: Cell::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    pub fn close(&self) {
        self.closed.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subclass_chain() {
        let base = ErrorClass::new("Error", None);
        let lookup = ErrorClass::new("LookupError", Some(base.clone()));
        let key = ErrorClass::new("KeyError", Some(lookup.clone()));

        assert!(key.is_subclass_of(&key));
        assert!(key.is_subclass_of(&lookup));
        assert!(key.is_subclass_of(&base));
        assert!(!base.is_subclass_of(&key));
    }

    #[test]
    fn test_format_traceback_outermost_first() {
        let class = ErrorClass::new("ValueError", None);
        let exc = Exception::new(class, "bad input");
        exc.push_trace(TraceEntry {
            file: Rc::from("/app/api.sn"),
            line: 4,
            function: Rc::from("parse"),
        });
        exc.push_trace(TraceEntry {
            file: Rc::from("/app/main.sn"),
            line: 9,
            function: Rc::from("<module>"),
        });

        assert_eq!(
            exc.format_traceback(),
            "Traceback (most recent call last):\n\
             \x20 File \"/app/main.sn\", line 9, in <module>\n\
             \x20 File \"/app/api.sn\", line 4, in parse\n\
             ValueError: bad input\n"
        );
    }

    #[test]
    fn test_summary_without_message() {
        let exc = Exception::new(ErrorClass::new("KeyError", None), "");
        assert_eq!(exc.summary(), "KeyError");
    }

    #[test]
    fn test_file_mode() {
        assert_eq!(FileMode::parse("a"), Some(FileMode::Append));
        assert_eq!(FileMode::parse("rw"), None);
        assert_eq!(FileMode::Write.as_str(), "w");
    }
}
