//! The builtin `traceback` module

use super::{native, ErrorKind};
use crate::import::Namespace;
use crate::runtime::object::Arity;
use crate::runtime::value::Value;
use crate::runtime::vm::{Unwind, Vm};

pub const MODULE_NAME: &str = "traceback";

/// Returned by `format_exc()` outside an `except` clause.
const NO_EXCEPTION: &str = "NoneType: None\n";

pub fn populate(module: &Namespace) {
    module.set(
        "format_exc",
        native("format_exc", Arity::exact(0), format_exc),
    );
    module.set("print_exc", native("print_exc", Arity::exact(0), print_exc));
}

fn render(vm: &Vm<'_>) -> String {
    vm.current_exception()
        .map(|exc| exc.format_traceback())
        .unwrap_or_else(|| NO_EXCEPTION.to_string())
}

fn format_exc(vm: &mut Vm<'_>, _args: Vec<Value>) -> Result<Value, Unwind> {
    Ok(Value::str(&render(vm)))
}

fn print_exc(vm: &mut Vm<'_>, _args: Vec<Value>) -> Result<Value, Unwind> {
    let text = render(vm);
    vm.host()
        .write_stdout(&text)
        .map_err(|err| vm.error(ErrorKind::Io, err.to_string()))?;
    Ok(Value::Null)
}
