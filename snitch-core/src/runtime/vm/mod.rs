//! Stack virtual machine
//!
//! One `Vm` runs one module body plus every script function it calls. Imports
//! performed by that code go back through the interpreter, which runs the
//! imported module on a fresh `Vm`; call depth is shared across them.
//!
//! Exceptions unwind per frame through a block stack:
//! - `Try` jumps to the handler entry with the exception on the stack,
//! - `With` closes its resource,
//! - `Handler` drops the exception being handled.

mod execution;
mod operators;

use super::bytecode::Code;
use super::object::{Exception, ExceptionRef, TraceEntry};
use super::stdlib::ErrorKind;
use super::value::Value;
use crate::import::{ImportError, ModuleRef};
use crate::interpreter::Interpreter;
use std::rc::Rc;
use tracing::trace;

/// Why execution stopped before completing normally.
#[derive(Debug)]
pub enum Unwind {
    /// A script exception; catchable by `except`.
    Raised(ExceptionRef),
    /// A host failure that scripts cannot observe or catch.
    Fatal(Box<ImportError>),
}

#[derive(Debug, Clone, Copy)]
enum Block {
    Try { handler: usize, depth: usize },
    Handler { handling: usize },
    With { depth: usize },
}

struct Frame {
    code: Rc<Code>,
    globals: ModuleRef,
    ip: usize,
    locals: Vec<Option<Value>>,
    blocks: Vec<Block>,
    stack_base: usize,
}

impl Frame {
    fn current_line(&self) -> usize {
        self.code.chunk.line_at(self.ip.saturating_sub(1))
    }
}

pub struct Vm<'h> {
    host: &'h Interpreter,
    stack: Vec<Value>,
    frames: Vec<Frame>,
    /// Exceptions currently being handled, innermost last.
    handling: Vec<ExceptionRef>,
    /// Call depth of the VMs below this one.
    base_depth: usize,
}

impl<'h> Vm<'h> {
    pub fn new(host: &'h Interpreter) -> Self {
        Self {
            host,
            stack: Vec::new(),
            frames: Vec::new(),
            handling: Vec::new(),
            base_depth: host.call_depth(),
        }
    }

    pub fn host(&self) -> &'h Interpreter {
        self.host
    }

    /// Run a module body with `module` as its globals.
    pub fn run_module(&mut self, code: Rc<Code>, module: ModuleRef) -> Result<(), Unwind> {
        self.push_frame(code, module, Vec::new())?;
        self.run().map(|_| ())
    }

    /// The exception handled by the innermost active `except` clause.
    pub fn current_exception(&self) -> Option<ExceptionRef> {
        self.handling.last().cloned()
    }

    /// Build a catchable builtin exception.
    pub fn error(&self, kind: ErrorKind, message: impl Into<String>) -> Unwind {
        Unwind::Raised(Exception::new(self.host.builtins().class(kind), message))
    }

    fn depth(&self) -> usize {
        self.base_depth + self.frames.len()
    }

    fn push_frame(
        &mut self,
        code: Rc<Code>,
        globals: ModuleRef,
        args: Vec<Value>,
    ) -> Result<(), Unwind> {
        let limits = self.host.limits();
        if self.depth() >= limits.max_recursion_depth {
            return Err(self.error(ErrorKind::Recursion, "maximum recursion depth exceeded"));
        }
        if self.stack.len() >= limits.max_stack_size {
            return Err(self.error(ErrorKind::Recursion, "operand stack overflow"));
        }

        let mut locals = vec![None; code.local_names.len()];
        for (slot, arg) in locals.iter_mut().zip(args) {
            *slot = Some(arg);
        }
        trace!(target: "snitch::vm", function = %code.name, depth = self.depth() + 1, "push frame");
        self.frames.push(Frame {
            code,
            globals,
            ip: 0,
            locals,
            blocks: Vec::new(),
            stack_base: self.stack.len(),
        });
        Ok(())
    }

    /// Propagate `exc` outward until a `Try` block takes it.
    ///
    /// `record` is false when re-raising from the frame that already recorded
    /// itself in the traceback.
    fn throw(&mut self, exc: ExceptionRef, mut record: bool) -> Result<(), Unwind> {
        while let Some(frame) = self.frames.last_mut() {
            if record {
                exc.push_trace(TraceEntry {
                    file: frame.code.filename.clone(),
                    line: frame.current_line(),
                    function: frame.code.name.clone(),
                });
            }
            record = true;

            while let Some(block) = frame.blocks.pop() {
                match block {
                    Block::Try { handler, depth } => {
                        self.stack.truncate(depth);
                        frame.blocks.push(Block::Handler {
                            handling: self.handling.len(),
                        });
                        self.handling.push(exc.clone());
                        self.stack.push(Value::Exception(exc));
                        frame.ip = handler;
                        return Ok(());
                    }
                    Block::With { depth } => {
                        if let Some(resource) = self.stack.get(depth) {
                            close_resource(resource);
                        }
                        self.stack.truncate(depth);
                    }
                    Block::Handler { handling } => self.handling.truncate(handling),
                }
            }

            let base = frame.stack_base;
            self.frames.pop();
            self.stack.truncate(base);
        }
        trace!(target: "snitch::vm", kind = exc.kind(), "exception escaped module");
        Err(Unwind::Raised(exc))
    }

    /// Leave every block of a returning frame.
    fn unwind_blocks(&mut self, blocks: Vec<Block>) {
        for block in blocks.into_iter().rev() {
            match block {
                Block::With { depth } => {
                    if let Some(resource) = self.stack.get(depth) {
                        close_resource(resource);
                    }
                }
                Block::Handler { handling } => self.handling.truncate(handling),
                Block::Try { .. } => {}
            }
        }
    }
}

/// Exit action of a `with` block.
fn close_resource(resource: &Value) {
    if let Value::File(file) = resource {
        file.close();
    }
}
