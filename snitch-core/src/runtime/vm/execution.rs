//! Instruction dispatch

use super::{Block, Frame, Unwind, Vm};
use crate::import::{ImportError, ModuleRef};
use crate::runtime::bytecode::{Constant, OpCode};
use crate::runtime::object::{Exception, Function};
use crate::runtime::stdlib::{self, ErrorKind};
use crate::runtime::value::Value;
use std::rc::Rc;

enum Flow {
    Next,
    /// The outermost frame returned.
    Done(Value),
    /// Re-raise without adding a traceback entry for the current frame.
    Rethrow(Rc<Exception>),
}

impl<'h> Vm<'h> {
    pub(super) fn run(&mut self) -> Result<Value, Unwind> {
        loop {
            let Some(frame) = self.frames.last_mut() else {
                return Ok(Value::Null);
            };
            let Some(op) = frame.code.chunk.code.get(frame.ip).copied() else {
                return Ok(Value::Null);
            };
            frame.ip += 1;

            #[cfg(feature = "trace_execution")]
            tracing::trace!(target: "snitch::vm", ip = frame.ip - 1, ?op, stack = self.stack.len());

            match self.step(op) {
                Ok(Flow::Next) => {}
                Ok(Flow::Done(value)) => return Ok(value),
                Ok(Flow::Rethrow(exc)) => self.throw(exc, false)?,
                Err(Unwind::Raised(exc)) => self.throw(exc, true)?,
                Err(fatal) => return Err(fatal),
            }
        }
    }

    fn frame(&self) -> &Frame {
        // `run` only dispatches while a frame is active.
        &self.frames[self.frames.len() - 1]
    }

    fn frame_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().unwrap_or(Value::Null)
    }

    fn peek(&self) -> Value {
        self.stack.last().cloned().unwrap_or(Value::Null)
    }

    fn name(&self, idx: u16) -> Rc<str> {
        self.frame().code.chunk.names[idx as usize].clone()
    }

    fn step(&mut self, op: OpCode) -> Result<Flow, Unwind> {
        match op {
            OpCode::LoadConst(idx) => {
                let value = match &self.frame().code.chunk.constants[idx as usize] {
                    Constant::Int(i) => Value::Int(*i),
                    Constant::Float(f) => Value::Float(*f),
                    Constant::Str(s) => Value::Str(s.clone()),
                    Constant::Code(code) => {
                        return Err(self.error(
                            ErrorKind::Runtime,
                            format!("code object '{}' loaded as a value", code.name),
                        ))
                    }
                };
                self.stack.push(value);
            }
            OpCode::LoadNull => self.stack.push(Value::Null),
            OpCode::LoadTrue => self.stack.push(Value::Bool(true)),
            OpCode::LoadFalse => self.stack.push(Value::Bool(false)),
            OpCode::Pop => {
                self.pop();
            }

            OpCode::LoadLocal(slot) => {
                let value = self.frame().locals[slot as usize].clone();
                match value {
                    Some(value) => self.stack.push(value),
                    None => {
                        let name = self.frame().code.local_names[slot as usize].clone();
                        return Err(self.error(
                            ErrorKind::Name,
                            format!("local variable '{name}' referenced before assignment"),
                        ));
                    }
                }
            }
            OpCode::StoreLocal(slot) => {
                let value = self.pop();
                self.frame_mut().locals[slot as usize] = Some(value);
            }
            OpCode::LoadGlobal(idx) => {
                let name = self.name(idx);
                let value = self
                    .frame()
                    .globals
                    .get(&name)
                    .or_else(|| self.host.builtins().global(&name));
                match value {
                    Some(value) => self.stack.push(value),
                    None => {
                        return Err(self.error(
                            ErrorKind::Name,
                            format!("name '{name}' is not defined"),
                        ))
                    }
                }
            }
            OpCode::StoreGlobal(idx) => {
                let name = self.name(idx);
                let value = self.pop();
                self.frame().globals.set(&name, value);
            }
            OpCode::LoadAttr(idx) => {
                let name = self.name(idx);
                let object = self.pop();
                let value = stdlib::get_attribute(self, &object, &name)?;
                self.stack.push(value);
            }
            OpCode::StoreAttr(idx) => {
                let name = self.name(idx);
                let value = self.pop();
                let object = self.pop();
                match object {
                    Value::Module(module) => module.set(&name, value),
                    other => {
                        return Err(self.error(
                            ErrorKind::Attribute,
                            format!("cannot set attribute '{name}' on '{}'", other.type_name()),
                        ))
                    }
                }
            }
            OpCode::LoadIndex => {
                let index = self.pop();
                let object = self.pop();
                let value = self.load_index(&object, &index)?;
                self.stack.push(value);
            }
            OpCode::StoreIndex => {
                let value = self.pop();
                let index = self.pop();
                let object = self.pop();
                self.store_index(&object, &index, value)?;
            }
            OpCode::BuildList(count) => {
                let items = self.stack.split_off(self.stack.len() - count as usize);
                self.stack.push(Value::list(items));
            }

            OpCode::Negate => {
                let value = self.pop();
                let result = self.negate(value)?;
                self.stack.push(result);
            }
            OpCode::Not => {
                let value = self.pop();
                self.stack.push(Value::Bool(!value.is_truthy()));
            }
            OpCode::Binary(op) => {
                let right = self.pop();
                let left = self.pop();
                let result = self.binary(op, left, right)?;
                self.stack.push(result);
            }

            OpCode::Jump(target) => self.frame_mut().ip = target,
            OpCode::JumpIfFalse(target) => {
                if !self.pop().is_truthy() {
                    self.frame_mut().ip = target;
                }
            }
            OpCode::JumpIfFalseOrPop(target) => {
                if self.peek().is_truthy() {
                    self.pop();
                } else {
                    self.frame_mut().ip = target;
                }
            }
            OpCode::JumpIfTrueOrPop(target) => {
                if self.peek().is_truthy() {
                    self.frame_mut().ip = target;
                } else {
                    self.pop();
                }
            }

            OpCode::Call(argc) => {
                let args = self.stack.split_off(self.stack.len() - argc as usize);
                let callee = self.pop();
                return self.call(callee, args);
            }
            OpCode::Return => {
                let value = self.pop();
                let Some(frame) = self.frames.pop() else {
                    return Ok(Flow::Done(value));
                };
                let base = frame.stack_base;
                self.unwind_blocks(frame.blocks);
                self.stack.truncate(base);
                if self.frames.is_empty() {
                    return Ok(Flow::Done(value));
                }
                self.stack.push(value);
            }
            OpCode::MakeFunction(idx) => {
                let frame = self.frame();
                let Constant::Code(code) = &frame.code.chunk.constants[idx as usize] else {
                    return Err(self.error(ErrorKind::Runtime, "function constant is not code"));
                };
                let function = Function {
                    code: code.clone(),
                    globals: frame.globals.clone(),
                };
                self.stack.push(Value::Function(Rc::new(function)));
            }

            OpCode::ImportName { name, leaf } => {
                let path = self.name(name);
                let module = self.import(&path)?;
                let value = if leaf {
                    module
                } else {
                    let top = path.split('.').next().unwrap_or(&path);
                    self.host.modules().get(top).unwrap_or(module)
                };
                self.stack.push(Value::Module(value));
            }
            OpCode::ImportFrom(idx) => {
                let name = self.name(idx);
                let Value::Module(module) = self.peek() else {
                    return Err(self.error(ErrorKind::Import, "import source is not a module"));
                };
                let value = match module.get(&name) {
                    Some(value) => value,
                    None => {
                        // `from pkg import submodule`; only a missing child means a missing name
                        let child_id = format!("{}.{}", module.name(), name);
                        match self.try_import(&child_id) {
                            Ok(child) => Value::Module(child),
                            Err(ImportError::NotFound(id) | ImportError::NotAPackage { id, .. })
                                if id == child_id =>
                            {
                                return Err(self.error(
                                    ErrorKind::Import,
                                    format!("cannot import name '{name}' from '{}'", module.name()),
                                ));
                            }
                            Err(err) => return Err(self.import_failure(err)),
                        }
                    }
                };
                self.stack.push(value);
            }

            OpCode::SetupTry(handler) => {
                let depth = self.stack.len();
                self.frame_mut().blocks.push(Block::Try { handler, depth });
            }
            OpCode::PopBlock => {
                self.frame_mut().blocks.pop();
            }
            OpCode::ExceptMatch => {
                let kind = self.pop();
                let Value::Exception(exc) = self.peek() else {
                    return Err(self.error(ErrorKind::Runtime, "no exception to match"));
                };
                let matched = self.exception_matches(&exc, &kind)?;
                self.stack.push(Value::Bool(matched));
            }
            OpCode::EndHandler => {
                if let Some(Block::Handler { handling }) = self.frame_mut().blocks.pop() {
                    self.handling.truncate(handling);
                }
            }
            OpCode::Reraise => {
                let Value::Exception(exc) = self.pop() else {
                    return Err(self.error(ErrorKind::Runtime, "no exception to re-raise"));
                };
                if let Some(Block::Handler { handling }) = self.frame_mut().blocks.pop() {
                    self.handling.truncate(handling);
                }
                return Ok(Flow::Rethrow(exc));
            }
            OpCode::Raise => {
                let value = self.pop();
                let exc = self.to_exception(value)?;
                return Err(Unwind::Raised(exc));
            }
            OpCode::RaiseCurrent => match self.current_exception() {
                Some(exc) => return Ok(Flow::Rethrow(exc)),
                None => {
                    return Err(self.error(ErrorKind::Runtime, "no active exception to re-raise"))
                }
            },
            OpCode::EnterWith => {
                let resource = self.peek();
                if !matches!(resource, Value::File(_)) {
                    return Err(self.error(
                        ErrorKind::Type,
                        format!(
                            "'{}' object does not support the context manager protocol",
                            resource.type_name()
                        ),
                    ));
                }
                let depth = self.stack.len() - 1;
                self.frame_mut().blocks.push(Block::With { depth });
                self.stack.push(resource);
            }
            OpCode::ExitWith => {
                if let Some(Block::With { depth }) = self.frame_mut().blocks.pop() {
                    if let Some(resource) = self.stack.get(depth) {
                        super::close_resource(resource);
                    }
                    self.stack.truncate(depth);
                }
            }
        }
        Ok(Flow::Next)
    }

    fn call(&mut self, callee: Value, args: Vec<Value>) -> Result<Flow, Unwind> {
        match callee {
            Value::Function(function) => {
                if function.code.arity != args.len() {
                    return Err(self.error(
                        ErrorKind::Type,
                        format!(
                            "{}() takes {} arguments but {} were given",
                            function.code.name,
                            function.code.arity,
                            args.len()
                        ),
                    ));
                }
                self.push_frame(function.code.clone(), function.globals.clone(), args)?;
            }
            Value::Native(native) => {
                if !native.arity.accepts(args.len()) {
                    return Err(self.arity_error(native.name, args.len()));
                }
                let result = (native.func)(self, args)?;
                self.stack.push(result);
            }
            Value::Method(method) => {
                if !method.arity.accepts(args.len()) {
                    return Err(self.arity_error(method.name, args.len()));
                }
                let result = (method.func)(self, &method.receiver, args)?;
                self.stack.push(result);
            }
            Value::Class(class) => {
                if args.len() > 1 {
                    return Err(self.arity_error(&class.name, args.len()));
                }
                let message = args.first().map(|v| v.to_string()).unwrap_or_default();
                self.stack.push(Value::Exception(Exception::new(class, message)));
            }
            other => {
                return Err(self.error(
                    ErrorKind::Type,
                    format!("'{}' object is not callable", other.type_name()),
                ))
            }
        }
        Ok(Flow::Next)
    }

    fn arity_error(&self, name: &str, given: usize) -> Unwind {
        self.error(
            ErrorKind::Type,
            format!("{name}() got an unexpected number of arguments ({given})"),
        )
    }

    /// `raise` accepts an exception or an exception class.
    fn to_exception(&self, value: Value) -> Result<Rc<Exception>, Unwind> {
        match value {
            Value::Exception(exc) => Ok(exc),
            Value::Class(class) => Ok(Exception::new(class, "")),
            other => Err(self.error(
                ErrorKind::Type,
                format!(
                    "exceptions must derive from Error, not '{}'",
                    other.type_name()
                ),
            )),
        }
    }

    fn exception_matches(&self, exc: &Exception, kind: &Value) -> Result<bool, Unwind> {
        match kind {
            Value::Class(class) => Ok(exc.class.is_subclass_of(class)),
            Value::List(items) => {
                for item in items.borrow().iter() {
                    if self.exception_matches(exc, item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            other => Err(self.error(
                ErrorKind::Type,
                format!(
                    "catching '{}' that is not an error class",
                    other.type_name()
                ),
            )),
        }
    }

    /// Import through the interpreter, translating host failures.
    pub(crate) fn import(&mut self, id: &str) -> Result<ModuleRef, Unwind> {
        self.try_import(id).map_err(|err| self.import_failure(err))
    }

    /// Import with the VM's call depth as the base for the module body.
    fn try_import(&self, id: &str) -> Result<ModuleRef, ImportError> {
        let _depth = self.host.enter_call_depth(self.depth());
        self.host.import_module(id)
    }

    fn import_failure(&self, err: ImportError) -> Unwind {
        if err.is_fatal() {
            return Unwind::Fatal(Box::new(err));
        }
        match err {
            ImportError::Raised { exception, .. } => Unwind::Raised(exception),
            ImportError::Syntax { .. } => self.error(ErrorKind::Syntax, err.to_string()),
            other => self.error(ErrorKind::Import, other.to_string()),
        }
    }
}
