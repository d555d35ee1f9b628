//! 编译前端：词法、语法、模板与语法树变换

pub mod lexer;
pub mod parser;
pub mod span;
pub mod template;
pub mod transform;
pub mod walk;
