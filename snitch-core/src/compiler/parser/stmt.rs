use super::expr::Expr;
use crate::compiler::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    Var(VarDecl),
    Assign(Assign),
    Fn(FnDecl),
    Return(Option<Expr>),
    If(IfStmt),
    While(WhileStmt),
    Break,
    Continue,
    Pass,
    Try(TryStmt),
    Raise(Option<Expr>),
    With(WithStmt),
    Import(ImportStmt),
    FromImport(FromImportStmt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub value: Expr,
}

/// 赋值目标只能是变量、成员或下标
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CondBranch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

/// `if` 与后续 `elif` 依次排列在 `branches` 中
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub branches: Vec<CondBranch>,
    pub else_body: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub body: Vec<Stmt>,
    pub handlers: Vec<ExceptHandler>,
}

/// 异常处理分支：`except [kind] [as name] { body }`
///
/// `kind` 为空时捕获所有异常；`name` 为空时异常不绑定到任何变量。
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub kind: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithStmt {
    pub context: Expr,
    pub name: String,
    pub body: Vec<Stmt>,
}

/// `import a.b.c [as x];`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportStmt {
    pub path: String,
    pub alias: Option<String>,
}

/// `from a.b import x, y;`
#[derive(Debug, Clone, PartialEq)]
pub struct FromImportStmt {
    pub path: String,
    pub names: Vec<String>,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}
