//! Snitch Core - the scripting host
//!
//! Contains the lexer, parser, syntax-tree transform, bytecode compiler,
//! virtual machine and import system. File access goes through
//! `snitch_vfs`; configuration is passed explicitly, never via global state.

pub mod compiler;
pub mod import;
pub mod interpreter;
pub mod runtime;

// Re-export common types
pub use compiler::parser::{parse, ExceptHandler, Expr, ExprKind, Module, Stmt, StmtKind};
pub use compiler::span::{Coordinate, Span};
pub use compiler::template::{CodeTemplate, TemplateError};
pub use compiler::transform::{LogExceptions, TransformStats};
pub use import::{Finder, ImportError, ModuleHandle, ModuleRef, ModuleState, Namespace};
pub use interpreter::{ExecError, Interpreter, InterpreterBuilder};
pub use runtime::value::Value;

// Re-export config types from snitch-config
pub use snitch_config::{LimitConfig, Phase};
