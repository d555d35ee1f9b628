//! `open()` and file objects
//!
//! File objects keep no OS handle. `write` appends through the VFS, which
//! opens and closes the underlying file on every call.

use super::methods::bind;
use super::ErrorKind;
use crate::runtime::object::{Arity, FileMode, FileObject, MethodFn};
use crate::runtime::value::Value;
use crate::runtime::vm::{Unwind, Vm};
use std::path::PathBuf;
use std::rc::Rc;

pub(super) fn open(vm: &mut Vm<'_>, args: Vec<Value>) -> Result<Value, Unwind> {
    let path = match &args[0] {
        Value::Str(s) => PathBuf::from(&**s),
        other => {
            return Err(vm.error(
                ErrorKind::Type,
                format!("open() path must be str, not '{}'", other.type_name()),
            ))
        }
    };
    let mode = match args.get(1) {
        None => FileMode::Read,
        Some(Value::Str(m)) => FileMode::parse(m)
            .ok_or_else(|| vm.error(ErrorKind::Value, format!("invalid mode: '{m}'")))?,
        Some(other) => {
            return Err(vm.error(
                ErrorKind::Type,
                format!("open() mode must be str, not '{}'", other.type_name()),
            ))
        }
    };

    let vfs = vm.host().vfs();
    let result = match mode {
        FileMode::Read if vfs.is_file(&path) => Ok(()),
        FileMode::Read => {
            return Err(vm.error(
                ErrorKind::Io,
                format!("No such file or directory: '{}'", path.display()),
            ))
        }
        FileMode::Write => vfs.write_file(&path, b""),
        FileMode::Append => vfs.append_file(&path, b""),
    };
    result.map_err(|err| vm.error(ErrorKind::Io, err.to_string()))?;

    Ok(Value::File(Rc::new(FileObject::new(path, mode))))
}

pub(super) fn attribute(receiver: &Value, file: &FileObject, name: &str) -> Option<Value> {
    let (name, arity, func): (&'static str, Arity, MethodFn) = match name {
        "write" => ("write", Arity::exact(1), file_write),
        "read" => ("read", Arity::exact(0), file_read),
        "close" => ("close", Arity::exact(0), file_close),
        "closed" => return Some(Value::Bool(file.is_closed())),
        "path" => return Some(Value::str(&file.path.to_string_lossy())),
        "mode" => return Some(Value::str(file.mode.as_str())),
        _ => return None,
    };
    Some(bind(receiver, name, arity, func))
}

fn open_file<'a>(vm: &Vm<'_>, receiver: &'a Value) -> Result<&'a FileObject, Unwind> {
    match receiver {
        Value::File(file) if file.is_closed() => {
            Err(vm.error(ErrorKind::Value, "I/O operation on closed file"))
        }
        Value::File(file) => Ok(file),
        other => Err(vm.error(
            ErrorKind::Type,
            format!("expected file receiver, got '{}'", other.type_name()),
        )),
    }
}

fn file_write(vm: &mut Vm<'_>, receiver: &Value, args: Vec<Value>) -> Result<Value, Unwind> {
    let file = open_file(vm, receiver)?;
    if file.mode == FileMode::Read {
        return Err(vm.error(ErrorKind::Io, "file not open for writing"));
    }
    let Value::Str(data) = &args[0] else {
        return Err(vm.error(
            ErrorKind::Type,
            format!(
                "write() argument must be str, not '{}'",
                args[0].type_name()
            ),
        ));
    };
    vm.host()
        .vfs()
        .append_file(&file.path, data.as_bytes())
        .map_err(|err| vm.error(ErrorKind::Io, err.to_string()))?;
    Ok(Value::Int(data.chars().count() as i64))
}

fn file_read(vm: &mut Vm<'_>, receiver: &Value, _args: Vec<Value>) -> Result<Value, Unwind> {
    let file = open_file(vm, receiver)?;
    if file.mode != FileMode::Read {
        return Err(vm.error(ErrorKind::Io, "file not open for reading"));
    }
    let bytes = vm
        .host()
        .vfs()
        .read_file(&file.path)
        .map_err(|err| vm.error(ErrorKind::Io, err.to_string()))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| vm.error(ErrorKind::Io, "file is not valid UTF-8"))?;
    Ok(Value::str(&text))
}

fn file_close(_vm: &mut Vm<'_>, receiver: &Value, _args: Vec<Value>) -> Result<Value, Unwind> {
    if let Value::File(file) = receiver {
        file.close();
    }
    Ok(Value::Null)
}
