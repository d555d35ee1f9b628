//! String and list methods

use super::ErrorKind;
use crate::runtime::object::{Arity, BoundMethod, MethodFn};
use crate::runtime::value::Value;
use crate::runtime::vm::{Unwind, Vm};
use std::rc::Rc;

pub(super) fn bind(receiver: &Value, name: &'static str, arity: Arity, func: MethodFn) -> Value {
    Value::Method(Rc::new(BoundMethod {
        receiver: receiver.clone(),
        name,
        arity,
        func,
    }))
}

pub(super) fn string_method(receiver: &Value, name: &str) -> Option<Value> {
    let (name, arity, func): (&'static str, Arity, MethodFn) = match name {
        "upper" => ("upper", Arity::exact(0), str_upper),
        "lower" => ("lower", Arity::exact(0), str_lower),
        "strip" => ("strip", Arity::exact(0), str_strip),
        "split" => ("split", Arity::range(0, 1), str_split),
        "startswith" => ("startswith", Arity::exact(1), str_startswith),
        "format" => ("format", Arity::variadic(), str_format),
        _ => return None,
    };
    Some(bind(receiver, name, arity, func))
}

pub(super) fn list_method(receiver: &Value, name: &str) -> Option<Value> {
    let (name, arity, func): (&'static str, Arity, MethodFn) = match name {
        "append" => ("append", Arity::exact(1), list_append),
        "pop" => ("pop", Arity::range(0, 1), list_pop),
        _ => return None,
    };
    Some(bind(receiver, name, arity, func))
}

fn receiver_str(vm: &Vm<'_>, receiver: &Value) -> Result<Rc<str>, Unwind> {
    match receiver {
        Value::Str(s) => Ok(s.clone()),
        other => Err(vm.error(
            ErrorKind::Type,
            format!("expected str receiver, got '{}'", other.type_name()),
        )),
    }
}

fn str_arg(vm: &Vm<'_>, method: &str, arg: &Value) -> Result<Rc<str>, Unwind> {
    match arg {
        Value::Str(s) => Ok(s.clone()),
        other => Err(vm.error(
            ErrorKind::Type,
            format!(
                "{method}() argument must be str, not '{}'",
                other.type_name()
            ),
        )),
    }
}

fn str_upper(vm: &mut Vm<'_>, receiver: &Value, _args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(Value::str(&receiver_str(vm, receiver)?.to_uppercase()))
}

fn str_lower(vm: &mut Vm<'_>, receiver: &Value, _args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(Value::str(&receiver_str(vm, receiver)?.to_lowercase()))
}

fn str_strip(vm: &mut Vm<'_>, receiver: &Value, _args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(Value::str(receiver_str(vm, receiver)?.trim()))
}

fn str_split(vm: &mut Vm<'_>, receiver: &Value, args: Vec<Value>) -> Result<Value, Unwind> {
    let s = receiver_str(vm, receiver)?;
    let parts: Vec<Value> = match args.first() {
        None => s.split_whitespace().map(Value::str).collect(),
        Some(sep) => {
            let sep = str_arg(vm, "split", sep)?;
            if sep.is_empty() {
                return Err(vm.error(ErrorKind::Value, "empty separator"));
            }
            s.split(&*sep).map(Value::str).collect()
        }
    };
    Ok(Value::list(parts))
}

fn str_startswith(vm: &mut Vm<'_>, receiver: &Value, args: Vec<Value>) -> Result<Value, Unwind> {
    let s = receiver_str(vm, receiver)?;
    let prefix = str_arg(vm, "startswith", &args[0])?;
    Ok(Value::Bool(s.starts_with(&*prefix)))
}

/// Positional `{}` substitution; `{{` and `}}` are literal braces.
fn str_format(vm: &mut Vm<'_>, receiver: &Value, args: Vec<Value>) -> Result<Value, Unwind> {
    let template = receiver_str(vm, receiver)?;
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
            }
            ('{', Some('}')) => {
                chars.next();
                match args.next() {
                    Some(arg) => out.push_str(&arg.to_string()),
                    None => {
                        return Err(vm.error(ErrorKind::Index, "format index out of range"))
                    }
                }
            }
            ('{', _) | ('}', _) => {
                return Err(vm.error(ErrorKind::Value, "single brace in format string"))
            }
            _ => out.push(c),
        }
    }
    Ok(Value::str(&out))
}

fn list_append(vm: &mut Vm<'_>, receiver: &Value, args: Vec<Value>) -> Result<Value, Unwind> {
    let Value::List(items) = receiver else {
        return Err(vm.error(ErrorKind::Type, "expected list receiver"));
    };
    items.borrow_mut().extend(args);
    Ok(Value::Null)
}

fn list_pop(vm: &mut Vm<'_>, receiver: &Value, args: Vec<Value>) -> Result<Value, Unwind> {
    let Value::List(items) = receiver else {
        return Err(vm.error(ErrorKind::Type, "expected list receiver"));
    };
    let mut items = items.borrow_mut();
    if items.is_empty() {
        return Err(vm.error(ErrorKind::Index, "pop from empty list"));
    }
    let len = items.len() as i64;
    let index = match args.first() {
        None => len - 1,
        Some(Value::Int(i)) if *i < 0 => i + len,
        Some(Value::Int(i)) => *i,
        Some(other) => {
            return Err(vm.error(
                ErrorKind::Type,
                format!("pop() index must be int, not '{}'", other.type_name()),
            ))
        }
    };
    if !(0..len).contains(&index) {
        return Err(vm.error(ErrorKind::Index, "pop index out of range"));
    }
    Ok(items.remove(index as usize))
}
