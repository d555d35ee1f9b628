//! 语法树反解析为源码文本，用于调试日志与测试断言

use super::expr::{Expr, ExprKind, UnaryOp};
use super::module::Module;
use super::stmt::{ExceptHandler, Stmt, StmtKind};
use crate::compiler::lexer::escape_string;
use std::fmt::{self, Display, Formatter, Write};

const INDENT: &str = "    ";

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for stmt in &self.body {
            write_stmt(f, stmt, 0)?;
        }
        Ok(())
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_stmt(f, self, 0)
    }
}

fn pad(f: &mut Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str(INDENT)?;
    }
    Ok(())
}

fn write_block(f: &mut Formatter<'_>, body: &[Stmt], depth: usize) -> fmt::Result {
    f.write_str("{\n")?;
    for stmt in body {
        write_stmt(f, stmt, depth + 1)?;
    }
    pad(f, depth)?;
    f.write_char('}')
}

fn write_handler(f: &mut Formatter<'_>, handler: &ExceptHandler, depth: usize) -> fmt::Result {
    f.write_str(" except ")?;
    if let Some(kind) = &handler.kind {
        write!(f, "{kind} ")?;
    }
    if let Some(name) = &handler.name {
        write!(f, "as {name} ")?;
    }
    write_block(f, &handler.body, depth)
}

fn write_stmt(f: &mut Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
    pad(f, depth)?;
    match &stmt.kind {
        StmtKind::Expr(expr) => write!(f, "{expr};")?,
        StmtKind::Var(decl) => write!(f, "var {} = {};", decl.name, decl.value)?,
        StmtKind::Assign(assign) => write!(f, "{} = {};", assign.target, assign.value)?,
        StmtKind::Fn(decl) => {
            write!(f, "fn {}({}) ", decl.name, decl.params.join(", "))?;
            write_block(f, &decl.body, depth)?;
        }
        StmtKind::Return(None) => f.write_str("return;")?,
        StmtKind::Return(Some(value)) => write!(f, "return {value};")?,
        StmtKind::If(stmt) => {
            for (i, branch) in stmt.branches.iter().enumerate() {
                let keyword = if i == 0 { "if" } else { " elif" };
                write!(f, "{keyword} {} ", branch.condition)?;
                write_block(f, &branch.body, depth)?;
            }
            if let Some(body) = &stmt.else_body {
                f.write_str(" else ")?;
                write_block(f, body, depth)?;
            }
        }
        StmtKind::While(stmt) => {
            write!(f, "while {} ", stmt.condition)?;
            write_block(f, &stmt.body, depth)?;
        }
        StmtKind::Break => f.write_str("break;")?,
        StmtKind::Continue => f.write_str("continue;")?,
        StmtKind::Pass => f.write_str("pass;")?,
        StmtKind::Try(stmt) => {
            f.write_str("try ")?;
            write_block(f, &stmt.body, depth)?;
            for handler in &stmt.handlers {
                write_handler(f, handler, depth)?;
            }
        }
        StmtKind::Raise(None) => f.write_str("raise;")?,
        StmtKind::Raise(Some(value)) => write!(f, "raise {value};")?,
        StmtKind::With(stmt) => {
            write!(f, "with {} as {} ", stmt.context, stmt.name)?;
            write_block(f, &stmt.body, depth)?;
        }
        StmtKind::Import(stmt) => match &stmt.alias {
            Some(alias) => write!(f, "import {} as {alias};", stmt.path)?,
            None => write!(f, "import {};", stmt.path)?,
        },
        StmtKind::FromImport(stmt) => {
            write!(f, "from {} import {};", stmt.path, stmt.names.join(", "))?
        }
    }
    f.write_char('\n')
}

/// 复合子表达式加括号，避免依赖优先级
fn write_operand(f: &mut Formatter<'_>, expr: &Expr) -> fmt::Result {
    match expr.kind {
        ExprKind::Binary(_) | ExprKind::Unary(_) => write!(f, "({expr})"),
        _ => write!(f, "{expr}"),
    }
}

fn write_list(f: &mut Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Int(v) => write!(f, "{v}"),
            ExprKind::Float(v) => write!(f, "{v:?}"),
            ExprKind::Str(s) => write!(f, "\"{}\"", escape_string(s)),
            ExprKind::Bool(b) => write!(f, "{b}"),
            ExprKind::Null => f.write_str("null"),
            ExprKind::List(items) => {
                f.write_char('[')?;
                write_list(f, items)?;
                f.write_char(']')
            }
            ExprKind::Name(name) => f.write_str(name),
            ExprKind::Unary(unary) => {
                f.write_str(match unary.op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "not ",
                })?;
                write_operand(f, &unary.operand)
            }
            ExprKind::Binary(binary) => {
                write_operand(f, &binary.left)?;
                write!(f, " {} ", binary.op.symbol())?;
                write_operand(f, &binary.right)
            }
            ExprKind::Call(call) => {
                write_operand(f, &call.callee)?;
                f.write_char('(')?;
                write_list(f, &call.args)?;
                f.write_char(')')
            }
            ExprKind::Member(member) => {
                write_operand(f, &member.object)?;
                write!(f, ".{}", member.name)
            }
            ExprKind::Index(index) => {
                write_operand(f, &index.object)?;
                write!(f, "[{}]", index.index)
            }
        }
    }
}
