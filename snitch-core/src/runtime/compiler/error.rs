use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// 节点缺少源码位置（模板展开后未修补）
    #[error("{node} without source position in {file}")]
    MissingPosition { file: String, node: &'static str },
    #[error("line {line}: '{keyword}' outside loop")]
    OutsideLoop { keyword: &'static str, line: usize },
    #[error("line {line}: 'return' outside function")]
    ReturnOutsideFunction { line: usize },
    #[error("line {line}: invalid assignment target")]
    InvalidAssignmentTarget { line: usize },
    #[error("line {line}: too many call arguments")]
    TooManyArguments { line: usize },
    #[error("too many constants in one code unit")]
    TooManyConstants,
    #[error("too many names in one code unit")]
    TooManyNames,
}
