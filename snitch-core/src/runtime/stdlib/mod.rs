//! Builtin functions, error classes and attribute lookup

mod file;
mod methods;
pub mod traceback;

use super::object::{Arity, ErrorClass, NativeFunction};
use super::value::Value;
use super::vm::{Unwind, Vm};
use std::collections::HashMap;
use std::rc::Rc;

/// Builtin error classes.
///
/// Declaration order is also the construction order, so a parent always
/// precedes its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Base,
    Value,
    Type,
    Name,
    Attribute,
    Lookup,
    Index,
    Key,
    ZeroDivision,
    Import,
    Syntax,
    Io,
    Runtime,
    Recursion,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 14] = [
        ErrorKind::Base,
        ErrorKind::Value,
        ErrorKind::Type,
        ErrorKind::Name,
        ErrorKind::Attribute,
        ErrorKind::Lookup,
        ErrorKind::Index,
        ErrorKind::Key,
        ErrorKind::ZeroDivision,
        ErrorKind::Import,
        ErrorKind::Syntax,
        ErrorKind::Io,
        ErrorKind::Runtime,
        ErrorKind::Recursion,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Base => "Error",
            ErrorKind::Value => "ValueError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Name => "NameError",
            ErrorKind::Attribute => "AttributeError",
            ErrorKind::Lookup => "LookupError",
            ErrorKind::Index => "IndexError",
            ErrorKind::Key => "KeyError",
            ErrorKind::ZeroDivision => "ZeroDivisionError",
            ErrorKind::Import => "ImportError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Io => "IOError",
            ErrorKind::Runtime => "RuntimeError",
            ErrorKind::Recursion => "RecursionError",
        }
    }

    pub fn parent(&self) -> Option<ErrorKind> {
        match self {
            ErrorKind::Base => None,
            ErrorKind::Index | ErrorKind::Key => Some(ErrorKind::Lookup),
            ErrorKind::Recursion => Some(ErrorKind::Runtime),
            _ => Some(ErrorKind::Base),
        }
    }
}

/// Global names every module sees after its own globals.
pub struct Builtins {
    classes: HashMap<ErrorKind, Rc<ErrorClass>>,
    globals: HashMap<&'static str, Value>,
}

impl Builtins {
    pub fn new() -> Self {
        let mut classes: HashMap<ErrorKind, Rc<ErrorClass>> = HashMap::new();
        for kind in ErrorKind::ALL {
            let parent = kind.parent().and_then(|p| classes.get(&p).cloned());
            classes.insert(kind, ErrorClass::new(kind.name(), parent));
        }

        let mut globals = HashMap::new();
        for (kind, class) in &classes {
            globals.insert(kind.name(), Value::Class(class.clone()));
        }
        let natives: [(&'static str, Arity, super::object::NativeFn); 6] = [
            ("print", Arity::variadic(), builtin_print),
            ("len", Arity::exact(1), builtin_len),
            ("str", Arity::exact(1), builtin_str),
            ("int", Arity::exact(1), builtin_int),
            ("type", Arity::exact(1), builtin_type),
            ("open", Arity::range(1, 2), file::open),
        ];
        for (name, arity, func) in natives {
            globals.insert(name, native(name, arity, func));
        }

        Self { classes, globals }
    }

    pub fn class(&self, kind: ErrorKind) -> Rc<ErrorClass> {
        match self.classes.get(&kind) {
            Some(class) => class.clone(),
            // Every kind is inserted by `new`.
            None => ErrorClass::new(kind.name(), None),
        }
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).cloned()
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn native(name: &'static str, arity: Arity, func: super::object::NativeFn) -> Value {
    Value::Native(Rc::new(NativeFunction { name, arity, func }))
}

/// Resolve `object.name`.
pub fn get_attribute(vm: &mut Vm<'_>, object: &Value, name: &str) -> Result<Value, Unwind> {
    let found = match object {
        Value::Module(module) => module.get(name),
        Value::Exception(exc) => match name {
            "message" => Some(Value::str(&exc.message)),
            "kind" => Some(Value::Str(exc.class.name.clone())),
            _ => None,
        },
        Value::Class(class) if name == "name" => Some(Value::Str(class.name.clone())),
        Value::Str(_) => methods::string_method(object, name),
        Value::List(_) => methods::list_method(object, name),
        Value::File(file) => file::attribute(object, file, name),
        _ => None,
    };

    found.ok_or_else(|| match object {
        Value::Module(module) => vm.error(
            ErrorKind::Attribute,
            format!("module '{}' has no attribute '{name}'", module.name()),
        ),
        other => vm.error(
            ErrorKind::Attribute,
            format!("'{}' object has no attribute '{name}'", other.type_name()),
        ),
    })
}

fn builtin_print(vm: &mut Vm<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let mut line = args
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    line.push('\n');
    vm.host()
        .write_stdout(&line)
        .map_err(|err| vm.error(ErrorKind::Io, err.to_string()))?;
    Ok(Value::Null)
}

fn builtin_len(vm: &mut Vm<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let len = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        other => {
            return Err(vm.error(
                ErrorKind::Type,
                format!("object of type '{}' has no len()", other.type_name()),
            ))
        }
    };
    Ok(Value::Int(len as i64))
}

fn builtin_str(_vm: &mut Vm<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(Value::str(&args[0].to_string()))
}

fn builtin_int(vm: &mut Vm<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    match &args[0] {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            vm.error(
                ErrorKind::Value,
                format!("invalid literal for int(): '{s}'"),
            )
        }),
        other => Err(vm.error(
            ErrorKind::Type,
            format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ),
        )),
    }
}

fn builtin_type(_vm: &mut Vm<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(match &args[0] {
        Value::Exception(exc) => Value::Class(exc.class.clone()),
        other => Value::str(other.type_name()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy() {
        let builtins = Builtins::new();
        let key = builtins.class(ErrorKind::Key);
        assert!(key.is_subclass_of(&builtins.class(ErrorKind::Lookup)));
        assert!(key.is_subclass_of(&builtins.class(ErrorKind::Base)));
        assert!(!key.is_subclass_of(&builtins.class(ErrorKind::Index)));

        let recursion = builtins.class(ErrorKind::Recursion);
        assert!(recursion.is_subclass_of(&builtins.class(ErrorKind::Runtime)));
    }

    #[test]
    fn test_parents_declared_first() {
        for (i, kind) in ErrorKind::ALL.iter().enumerate() {
            if let Some(parent) = kind.parent() {
                let pos = ErrorKind::ALL.iter().position(|k| *k == parent);
                assert!(pos.is_some_and(|p| p < i), "{kind:?}");
            }
        }
    }

    #[test]
    fn test_globals() {
        let builtins = Builtins::new();
        assert!(matches!(builtins.global("ValueError"), Some(Value::Class(_))));
        assert!(matches!(builtins.global("open"), Some(Value::Native(_))));
        assert!(builtins.global("traceback").is_none());
    }
}
