//! 函数作用域分析：函数体内被绑定的名字都是局部变量

use crate::compiler::parser::{ExprKind, Stmt, StmtKind};

/// 收集 `body` 中绑定的名字（不进入嵌套函数体），追加到 `names`
pub fn collect_bindings(body: &[Stmt], names: &mut Vec<String>) {
    for stmt in body {
        match &stmt.kind {
            StmtKind::Var(decl) => bind(names, &decl.name),
            StmtKind::Assign(assign) => {
                if let ExprKind::Name(name) = &assign.target.kind {
                    bind(names, name);
                }
            }
            StmtKind::Fn(decl) => bind(names, &decl.name),
            StmtKind::If(if_stmt) => {
                for branch in &if_stmt.branches {
                    collect_bindings(&branch.body, names);
                }
                if let Some(body) = &if_stmt.else_body {
                    collect_bindings(body, names);
                }
            }
            StmtKind::While(while_stmt) => collect_bindings(&while_stmt.body, names),
            StmtKind::Try(try_stmt) => {
                collect_bindings(&try_stmt.body, names);
                for handler in &try_stmt.handlers {
                    if let Some(name) = &handler.name {
                        bind(names, name);
                    }
                    collect_bindings(&handler.body, names);
                }
            }
            StmtKind::With(with_stmt) => {
                bind(names, &with_stmt.name);
                collect_bindings(&with_stmt.body, names);
            }
            StmtKind::Import(import) => match &import.alias {
                Some(alias) => bind(names, alias),
                None => bind(names, import.path.split('.').next().unwrap_or(&import.path)),
            },
            StmtKind::FromImport(import) => {
                for name in &import.names {
                    bind(names, name);
                }
            }
            StmtKind::Expr(_)
            | StmtKind::Return(_)
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Pass
            | StmtKind::Raise(_) => {}
        }
    }
}

fn bind(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parser::parse;

    #[test]
    fn test_collects_every_binding_form() {
        let module = parse(
            "var a = 1;\nb = 2;\nx.y = 3;\nimport pkg.mod;\nfrom lib import c, d;\n\
             with open(\"f\") as e { fn g() { var hidden = 1; } }\n\
             try { pass; } except as h { a = 2; }",
        )
        .unwrap();
        let mut names = Vec::new();
        collect_bindings(&module.body, &mut names);
        assert_eq!(names, vec!["a", "b", "pkg", "c", "d", "e", "g", "h"]);
    }
}
