mod display;
pub mod error;
pub mod expr;
mod module;
pub mod parser;
pub mod stmt;
mod utils;

// 重新导出常用类型
pub use error::{ErrorLocation, ParseResult, ParserError, ParserErrorKind};
pub use expr::{Binary, BinaryOp, Call, Expr, ExprKind, Index, Member, Unary, UnaryOp};
pub use module::Module;
pub use parser::{parse, Parser};
pub use stmt::{
    Assign, CondBranch, ExceptHandler, FnDecl, FromImportStmt, IfStmt, ImportStmt, Stmt,
    StmtKind, TryStmt, VarDecl, WhileStmt, WithStmt,
};
