use super::stmt::Stmt;

/// 一个源文件解析后的语法树
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub body: Vec<Stmt>,
}
