//! 语法树位置遍历
//!
//! 模板展开后需要先清空位置，变换后再统一补齐；两者都要覆盖树中每一个节点。

use super::parser::{Expr, ExprKind, Stmt, StmtKind};
use super::span::Span;

/// 对 `body` 中所有语句、处理分支与表达式的位置调用 `f`
pub fn spans_mut(body: &mut [Stmt], f: &mut impl FnMut(&mut Span)) {
    for stmt in body {
        stmt_spans_mut(stmt, f);
    }
}

fn stmt_spans_mut(stmt: &mut Stmt, f: &mut impl FnMut(&mut Span)) {
    f(&mut stmt.span);
    match &mut stmt.kind {
        StmtKind::Expr(expr) => expr_spans_mut(expr, f),
        StmtKind::Var(decl) => expr_spans_mut(&mut decl.value, f),
        StmtKind::Assign(assign) => {
            expr_spans_mut(&mut assign.target, f);
            expr_spans_mut(&mut assign.value, f);
        }
        StmtKind::Fn(decl) => spans_mut(&mut decl.body, f),
        StmtKind::Return(value) | StmtKind::Raise(value) => {
            if let Some(expr) = value {
                expr_spans_mut(expr, f);
            }
        }
        StmtKind::If(stmt) => {
            for branch in &mut stmt.branches {
                expr_spans_mut(&mut branch.condition, f);
                spans_mut(&mut branch.body, f);
            }
            if let Some(body) = &mut stmt.else_body {
                spans_mut(body, f);
            }
        }
        StmtKind::While(stmt) => {
            expr_spans_mut(&mut stmt.condition, f);
            spans_mut(&mut stmt.body, f);
        }
        StmtKind::Try(stmt) => {
            spans_mut(&mut stmt.body, f);
            for handler in &mut stmt.handlers {
                f(&mut handler.span);
                if let Some(kind) = &mut handler.kind {
                    expr_spans_mut(kind, f);
                }
                spans_mut(&mut handler.body, f);
            }
        }
        StmtKind::With(stmt) => {
            expr_spans_mut(&mut stmt.context, f);
            spans_mut(&mut stmt.body, f);
        }
        StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Pass
        | StmtKind::Import(_)
        | StmtKind::FromImport(_) => {}
    }
}

fn expr_spans_mut(expr: &mut Expr, f: &mut impl FnMut(&mut Span)) {
    f(&mut expr.span);
    match &mut expr.kind {
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Null
        | ExprKind::Name(_) => {}
        ExprKind::List(items) => {
            for item in items {
                expr_spans_mut(item, f);
            }
        }
        ExprKind::Unary(unary) => expr_spans_mut(&mut unary.operand, f),
        ExprKind::Binary(binary) => {
            expr_spans_mut(&mut binary.left, f);
            expr_spans_mut(&mut binary.right, f);
        }
        ExprKind::Call(call) => {
            expr_spans_mut(&mut call.callee, f);
            for arg in &mut call.args {
                expr_spans_mut(arg, f);
            }
        }
        ExprKind::Member(member) => expr_spans_mut(&mut member.object, f),
        ExprKind::Index(index) => {
            expr_spans_mut(&mut index.object, f);
            expr_spans_mut(&mut index.index, f);
        }
    }
}

/// 收集所有位置，测试用
#[cfg(test)]
pub fn collect_spans(body: &mut [Stmt]) -> Vec<Span> {
    let mut spans = Vec::new();
    spans_mut(body, &mut |span| spans.push(*span));
    spans
}
