//! 语法树 → 字节码编译器
//!
//! 每个节点都必须带有源码位置：行号写入行号表，最终出现在 traceback 中。
//! 没有位置的节点（例如未经修补的模板展开结果）直接拒绝编译。

mod error;
mod scope;

pub use error::CompileError;

use super::bytecode::{Chunk, Code, Constant, OpCode};
use crate::compiler::parser::{
    BinaryOp, ExceptHandler, Expr, ExprKind, Module, Stmt, StmtKind, TryStmt, UnaryOp, WithStmt,
};
use crate::compiler::span::Span;
use scope::collect_bindings;
use std::rc::Rc;
use tracing::{debug, trace};

/// 模块顶层代码单元的名字
pub const MODULE_CODE_NAME: &str = "<module>";

/// 编译整个模块，`filename` 写入 traceback
pub fn compile_module(module: &Module, filename: &str) -> Result<Rc<Code>, CompileError> {
    let filename: Rc<str> = Rc::from(filename);
    let mut compiler = Compiler::new(filename.clone(), None);
    compiler.compile_body(&module.body)?;
    let end_line = module.body.last().map(|s| s.span.end.line).unwrap_or(1);
    compiler.emit(OpCode::LoadNull, end_line);
    compiler.emit(OpCode::Return, end_line);

    let code = compiler.finish(MODULE_CODE_NAME, 0);
    debug!(
        target: "snitch::compiler",
        file = %filename,
        ops = code.chunk.code.len(),
        "compiled module"
    );
    trace!(target: "snitch::compiler", "\n{}", code.chunk);
    Ok(Rc::new(code))
}

/// 编译期块结构，用于 break/continue 时生成清理指令
#[derive(Debug)]
enum BlockScope {
    Loop {
        start: usize,
        breaks: Vec<usize>,
    },
    Try,
    Handler,
    With,
}

struct Compiler {
    filename: Rc<str>,
    chunk: Chunk,
    /// 函数内的局部变量；模块顶层为 `None`
    locals: Option<Vec<String>>,
    blocks: Vec<BlockScope>,
}

impl Compiler {
    fn new(filename: Rc<str>, locals: Option<Vec<String>>) -> Self {
        Self {
            filename,
            chunk: Chunk::new(),
            locals,
            blocks: Vec::new(),
        }
    }

    fn finish(self, name: &str, arity: usize) -> Code {
        Code {
            name: Rc::from(name),
            filename: self.filename,
            arity,
            local_names: self.locals.unwrap_or_default(),
            chunk: self.chunk,
        }
    }

    fn emit(&mut self, op: OpCode, line: usize) -> usize {
        self.chunk.write_op(op, line)
    }

    /// 取节点行号；没有位置信息的节点是编译错误
    fn line_of(&self, span: Span, node: &'static str) -> Result<usize, CompileError> {
        if span.is_unknown() {
            return Err(CompileError::MissingPosition {
                file: self.filename.to_string(),
                node,
            });
        }
        Ok(span.line())
    }

    fn name_index(&mut self, name: &str) -> Result<u16, CompileError> {
        self.chunk.add_name(name).ok_or(CompileError::TooManyNames)
    }

    fn constant(&mut self, value: Constant, line: usize) -> Result<(), CompileError> {
        let idx = self
            .chunk
            .add_constant(value)
            .ok_or(CompileError::TooManyConstants)?;
        self.emit(OpCode::LoadConst(idx), line);
        Ok(())
    }

    fn local_slot(&self, name: &str) -> Option<u16> {
        self.locals
            .as_ref()?
            .iter()
            .position(|local| local == name)
            .and_then(|idx| u16::try_from(idx).ok())
    }

    fn emit_load(&mut self, name: &str, line: usize) -> Result<(), CompileError> {
        let op = match self.local_slot(name) {
            Some(slot) => OpCode::LoadLocal(slot),
            None => OpCode::LoadGlobal(self.name_index(name)?),
        };
        self.emit(op, line);
        Ok(())
    }

    fn emit_store(&mut self, name: &str, line: usize) -> Result<(), CompileError> {
        let op = match self.local_slot(name) {
            Some(slot) => OpCode::StoreLocal(slot),
            None => OpCode::StoreGlobal(self.name_index(name)?),
        };
        self.emit(op, line);
        Ok(())
    }

    fn compile_body(&mut self, body: &[Stmt]) -> Result<(), CompileError> {
        for stmt in body {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        let line = self.line_of(stmt.span, "statement")?;
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.compile_expr(expr)?;
                self.emit(OpCode::Pop, line);
            }
            StmtKind::Var(decl) => {
                self.compile_expr(&decl.value)?;
                self.emit_store(&decl.name, line)?;
            }
            StmtKind::Assign(assign) => match &assign.target.kind {
                ExprKind::Name(name) => {
                    self.compile_expr(&assign.value)?;
                    self.emit_store(name, line)?;
                }
                ExprKind::Member(member) => {
                    self.compile_expr(&member.object)?;
                    self.compile_expr(&assign.value)?;
                    let idx = self.name_index(&member.name)?;
                    self.emit(OpCode::StoreAttr(idx), line);
                }
                ExprKind::Index(index) => {
                    self.compile_expr(&index.object)?;
                    self.compile_expr(&index.index)?;
                    self.compile_expr(&assign.value)?;
                    self.emit(OpCode::StoreIndex, line);
                }
                _ => return Err(CompileError::InvalidAssignmentTarget { line }),
            },
            StmtKind::Fn(decl) => {
                let mut locals = decl.params.clone();
                collect_bindings(&decl.body, &mut locals);
                let mut inner = Compiler::new(self.filename.clone(), Some(locals));
                inner.compile_body(&decl.body)?;
                let end_line = stmt.span.end.line;
                inner.emit(OpCode::LoadNull, end_line);
                inner.emit(OpCode::Return, end_line);
                let code = inner.finish(&decl.name, decl.params.len());
                trace!(target: "snitch::compiler", function = %decl.name, "\n{}", code.chunk);

                let idx = self
                    .chunk
                    .add_constant(Constant::Code(Rc::new(code)))
                    .ok_or(CompileError::TooManyConstants)?;
                self.emit(OpCode::MakeFunction(idx), line);
                self.emit_store(&decl.name, line)?;
            }
            StmtKind::Return(value) => {
                if self.locals.is_none() {
                    return Err(CompileError::ReturnOutsideFunction { line });
                }
                match value {
                    Some(expr) => self.compile_expr(expr)?,
                    None => {
                        self.emit(OpCode::LoadNull, line);
                    }
                }
                self.emit(OpCode::Return, line);
            }
            StmtKind::If(if_stmt) => {
                let mut exits = Vec::new();
                for branch in &if_stmt.branches {
                    self.compile_expr(&branch.condition)?;
                    let next = self.chunk.write_jump(OpCode::JumpIfFalse, line);
                    self.compile_body(&branch.body)?;
                    exits.push(self.chunk.write_jump(OpCode::Jump, line));
                    self.chunk.patch_jump(next);
                }
                if let Some(body) = &if_stmt.else_body {
                    self.compile_body(body)?;
                }
                for exit in exits {
                    self.chunk.patch_jump(exit);
                }
            }
            StmtKind::While(while_stmt) => {
                let start = self.chunk.code.len();
                self.compile_expr(&while_stmt.condition)?;
                let exit = self.chunk.write_jump(OpCode::JumpIfFalse, line);
                self.blocks.push(BlockScope::Loop {
                    start,
                    breaks: Vec::new(),
                });
                self.compile_body(&while_stmt.body)?;
                self.chunk.write_loop(start, line);
                self.chunk.patch_jump(exit);
                if let Some(BlockScope::Loop { breaks, .. }) = self.blocks.pop() {
                    for jump in breaks {
                        self.chunk.patch_jump(jump);
                    }
                }
            }
            StmtKind::Break => self.compile_loop_exit(true, line)?,
            StmtKind::Continue => self.compile_loop_exit(false, line)?,
            StmtKind::Pass => {}
            StmtKind::Try(try_stmt) => self.compile_try(try_stmt, line)?,
            StmtKind::Raise(Some(value)) => {
                self.compile_expr(value)?;
                self.emit(OpCode::Raise, line);
            }
            StmtKind::Raise(None) => {
                self.emit(OpCode::RaiseCurrent, line);
            }
            StmtKind::With(with_stmt) => self.compile_with(with_stmt, line)?,
            StmtKind::Import(import) => {
                let name = self.name_index(&import.path)?;
                self.emit(
                    OpCode::ImportName {
                        name,
                        leaf: import.alias.is_some(),
                    },
                    line,
                );
                let binding = match &import.alias {
                    Some(alias) => alias.as_str(),
                    None => import.path.split('.').next().unwrap_or(&import.path),
                };
                self.emit_store(binding, line)?;
            }
            StmtKind::FromImport(import) => {
                let name = self.name_index(&import.path)?;
                self.emit(OpCode::ImportName { name, leaf: true }, line);
                for item in &import.names {
                    let idx = self.name_index(item)?;
                    self.emit(OpCode::ImportFrom(idx), line);
                    self.emit_store(item, line)?;
                }
                self.emit(OpCode::Pop, line);
            }
        }
        Ok(())
    }

    /// break / continue：先按嵌套顺序撤销块，再跳转
    fn compile_loop_exit(&mut self, is_break: bool, line: usize) -> Result<(), CompileError> {
        let keyword = if is_break { "break" } else { "continue" };
        let mut cleanup = Vec::new();
        let mut loop_index = None;
        for (i, block) in self.blocks.iter().enumerate().rev() {
            match block {
                BlockScope::Loop { .. } => {
                    loop_index = Some(i);
                    break;
                }
                BlockScope::Try => cleanup.push(OpCode::PopBlock),
                BlockScope::Handler => cleanup.push(OpCode::EndHandler),
                BlockScope::With => cleanup.push(OpCode::ExitWith),
            }
        }
        let Some(loop_index) = loop_index else {
            return Err(CompileError::OutsideLoop { keyword, line });
        };
        for op in cleanup {
            self.emit(op, line);
        }

        if is_break {
            let jump = self.chunk.write_jump(OpCode::Jump, line);
            if let BlockScope::Loop { breaks, .. } = &mut self.blocks[loop_index] {
                breaks.push(jump);
            }
        } else if let BlockScope::Loop { start, .. } = self.blocks[loop_index] {
            self.chunk.write_loop(start, line);
        }
        Ok(())
    }

    /// try/except 的指令布局：
    ///
    /// ```text
    ///     SetupTry handlers
    ///     <body>
    ///     PopBlock
    ///     Jump end
    /// handlers:            ; 栈顶为异常，VM 已登记 Handler 块
    ///     [kind; ExceptMatch; JumpIfFalse next]
    ///     Store name | Pop
    ///     <handler body>
    ///     EndHandler
    ///     Jump end
    /// next:
    ///     ...
    ///     Reraise
    /// end:
    /// ```
    fn compile_try(&mut self, try_stmt: &TryStmt, line: usize) -> Result<(), CompileError> {
        let setup = self.chunk.write_jump(OpCode::SetupTry, line);
        self.blocks.push(BlockScope::Try);
        self.compile_body(&try_stmt.body)?;
        self.blocks.pop();
        self.emit(OpCode::PopBlock, line);
        let mut exits = vec![self.chunk.write_jump(OpCode::Jump, line)];

        self.chunk.patch_jump(setup);
        for handler in &try_stmt.handlers {
            exits.push(self.compile_handler(handler)?);
        }
        self.emit(OpCode::Reraise, line);

        for exit in exits {
            self.chunk.patch_jump(exit);
        }
        Ok(())
    }

    /// 返回该分支末尾跳向 try 结束处的跳转指令
    fn compile_handler(&mut self, handler: &ExceptHandler) -> Result<usize, CompileError> {
        let line = self.line_of(handler.span, "except clause")?;
        let next = match &handler.kind {
            Some(kind) => {
                self.compile_expr(kind)?;
                self.emit(OpCode::ExceptMatch, line);
                Some(self.chunk.write_jump(OpCode::JumpIfFalse, line))
            }
            None => None,
        };

        match &handler.name {
            Some(name) => self.emit_store(name, line)?,
            None => {
                self.emit(OpCode::Pop, line);
            }
        }

        self.blocks.push(BlockScope::Handler);
        self.compile_body(&handler.body)?;
        self.blocks.pop();
        self.emit(OpCode::EndHandler, line);
        let exit = self.chunk.write_jump(OpCode::Jump, line);

        if let Some(next) = next {
            self.chunk.patch_jump(next);
        }
        Ok(exit)
    }

    fn compile_with(&mut self, with_stmt: &WithStmt, line: usize) -> Result<(), CompileError> {
        self.compile_expr(&with_stmt.context)?;
        self.emit(OpCode::EnterWith, line);
        self.emit_store(&with_stmt.name, line)?;
        self.blocks.push(BlockScope::With);
        self.compile_body(&with_stmt.body)?;
        self.blocks.pop();
        self.emit(OpCode::ExitWith, line);
        Ok(())
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        let line = self.line_of(expr.span, "expression")?;
        match &expr.kind {
            ExprKind::Int(value) => self.constant(Constant::Int(*value), line)?,
            ExprKind::Float(value) => self.constant(Constant::Float(*value), line)?,
            ExprKind::Str(value) => self.constant(Constant::Str(Rc::from(value.as_str())), line)?,
            ExprKind::Bool(true) => {
                self.emit(OpCode::LoadTrue, line);
            }
            ExprKind::Bool(false) => {
                self.emit(OpCode::LoadFalse, line);
            }
            ExprKind::Null => {
                self.emit(OpCode::LoadNull, line);
            }
            ExprKind::List(items) => {
                for item in items {
                    self.compile_expr(item)?;
                }
                let count = u16::try_from(items.len()).map_err(|_| CompileError::TooManyConstants)?;
                self.emit(OpCode::BuildList(count), line);
            }
            ExprKind::Name(name) => self.emit_load(name, line)?,
            ExprKind::Unary(unary) => {
                self.compile_expr(&unary.operand)?;
                let op = match unary.op {
                    UnaryOp::Neg => OpCode::Negate,
                    UnaryOp::Not => OpCode::Not,
                };
                self.emit(op, line);
            }
            ExprKind::Binary(binary) => match binary.op {
                BinaryOp::And | BinaryOp::Or => {
                    self.compile_expr(&binary.left)?;
                    let jump: fn(usize) -> OpCode = if binary.op == BinaryOp::And {
                        OpCode::JumpIfFalseOrPop
                    } else {
                        OpCode::JumpIfTrueOrPop
                    };
                    let end = self.chunk.write_jump(jump, line);
                    self.compile_expr(&binary.right)?;
                    self.chunk.patch_jump(end);
                }
                op => {
                    self.compile_expr(&binary.left)?;
                    self.compile_expr(&binary.right)?;
                    self.emit(OpCode::Binary(op), line);
                }
            },
            ExprKind::Call(call) => {
                self.compile_expr(&call.callee)?;
                for arg in &call.args {
                    self.compile_expr(arg)?;
                }
                let argc = u8::try_from(call.args.len())
                    .map_err(|_| CompileError::TooManyArguments { line })?;
                self.emit(OpCode::Call(argc), line);
            }
            ExprKind::Member(member) => {
                self.compile_expr(&member.object)?;
                let idx = self.name_index(&member.name)?;
                self.emit(OpCode::LoadAttr(idx), line);
            }
            ExprKind::Index(index) => {
                self.compile_expr(&index.object)?;
                self.compile_expr(&index.index)?;
                self.emit(OpCode::LoadIndex, line);
            }
        }
        Ok(())
    }
}
