//! Runtime values

use super::object::{BoundMethod, ErrorClass, ExceptionRef, FileObject, Function, NativeFunction};
use crate::compiler::lexer::escape_string;
use crate::import::ModuleRef;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// How deep nested lists are compared or rendered.
pub const MAX_VALUE_DEPTH: usize = 200;

/// List comparison nested past `MAX_VALUE_DEPTH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("maximum recursion depth exceeded in comparison")]
pub struct NestingTooDeep;

thread_local! {
    /// Lists whose rendering is in progress on this thread.
    static RENDERING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks a list as being rendered until dropped.
struct RenderGuard;

impl RenderGuard {
    /// `None` when the list is already on the stack or nesting is too deep.
    fn enter(list: &Rc<RefCell<Vec<Value>>>) -> Option<Self> {
        let addr = Rc::as_ptr(list) as usize;
        RENDERING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.len() >= MAX_VALUE_DEPTH || stack.contains(&addr) {
                return None;
            }
            stack.push(addr);
            Some(RenderGuard)
        })
    }
}

impl Drop for RenderGuard {
    fn drop(&mut self) {
        RENDERING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Function>),
    Native(Rc<NativeFunction>),
    Method(Rc<BoundMethod>),
    Module(ModuleRef),
    Class(Rc<ErrorClass>),
    Exception(ExceptionRef),
    File(Rc<FileObject>),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::Native(_) | Value::Method(_) => "builtin",
            Value::Module(_) => "module",
            Value::Class(_) => "class",
            Value::Exception(_) => "exception",
            Value::File(_) => "file",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            _ => true,
        }
    }

    /// Structural equality for plain data, identity for objects.
    pub fn equals(&self, other: &Value) -> Result<bool, NestingTooDeep> {
        self.equals_within(other, MAX_VALUE_DEPTH)
    }

    fn equals_within(&self, other: &Value, depth: usize) -> Result<bool, NestingTooDeep> {
        let equal = match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return Ok(true);
                }
                let depth = depth.checked_sub(1).ok_or(NestingTooDeep)?;
                let (a, b) = (a.borrow(), b.borrow());
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    if !x.equals_within(y, depth)? {
                        return Ok(false);
                    }
                }
                true
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Exception(a), Value::Exception(b)) => Rc::ptr_eq(a, b),
            (Value::File(a), Value::File(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        Ok(equal)
    }

    /// Debug-style rendering: strings are quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("\"{}\"", escape_string(s)),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                let Some(_guard) = RenderGuard::enter(items) else {
                    return f.write_str("[...]");
                };
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&item.repr())?;
                }
                f.write_str("]")
            }
            Value::Function(func) => write!(f, "<fn {}>", func.code.name),
            Value::Native(native) => write!(f, "<builtin {}>", native.name),
            Value::Method(method) => write!(f, "<method {}>", method.name),
            Value::Module(module) => write!(f, "<module '{}'>", module.name()),
            Value::Class(class) => write!(f, "<class '{}'>", class.name),
            Value::Exception(exc) => f.write_str(&exc.message),
            Value::File(file) => {
                let mode = file.mode.as_str();
                write!(f, "<file '{}' mode '{mode}'>", file.path.display())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::str("x").is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
    }

    fn cyclic() -> Value {
        let list = Value::list(vec![Value::Int(1)]);
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        list
    }

    #[test]
    fn test_equality() {
        assert_eq!(Value::Int(2).equals(&Value::Float(2.0)), Ok(true));
        assert_eq!(
            Value::list(vec![Value::str("a")]).equals(&Value::list(vec![Value::str("a")])),
            Ok(true)
        );
        assert_eq!(Value::Null.equals(&Value::Bool(false)), Ok(false));
    }

    #[test]
    fn test_cyclic_equality() {
        let a = cyclic();
        assert_eq!(a.equals(&a), Ok(true));
        assert_eq!(a.equals(&cyclic()), Err(NestingTooDeep));
        assert_eq!(a.equals(&Value::list(vec![Value::Int(1)])), Ok(false));
    }

    #[test]
    fn test_cyclic_display() {
        assert_eq!(cyclic().to_string(), "[1, [...]]");

        let mut deep = Value::list(vec![]);
        for _ in 0..MAX_VALUE_DEPTH + 10 {
            deep = Value::list(vec![deep]);
        }
        let text = deep.to_string();
        assert!(text.starts_with("[[[["));
        assert!(text.contains("[...]"));
        assert_eq!(Value::list(vec![Value::Int(2)]).to_string(), "[2]");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(
            Value::list(vec![Value::Int(1), Value::str("a\"b")]).to_string(),
            "[1, \"a\\\"b\"]"
        );
    }
}
