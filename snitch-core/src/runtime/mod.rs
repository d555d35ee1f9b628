//! Snitch 运行时
//!
//! 字节码、编译器、虚拟机与标准库。

pub mod bytecode;
pub mod compiler;
pub mod object;
pub mod stdlib;
pub mod value;
pub mod vm;

pub use bytecode::{Chunk, Code, Constant, OpCode};
pub use compiler::{compile_module, CompileError};
pub use object::{ErrorClass, Exception, ExceptionRef, TraceEntry};
pub use stdlib::{Builtins, ErrorKind};
pub use value::Value;
pub use vm::{Unwind, Vm};
