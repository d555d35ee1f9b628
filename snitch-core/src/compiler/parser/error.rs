use crate::compiler::lexer::{LexError, LexErrorKind};
use crate::compiler::span::Coordinate;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParserError>;

/// 语法错误，包含位置信息
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{location}: {kind}")]
pub struct ParserError {
    /// 错误类型
    pub kind: ParserErrorKind,
    /// 错误发生的位置
    pub location: ErrorLocation,
}

/// 错误位置信息
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorLocation {
    /// 特定位置
    At(Coordinate),
    /// 文件末尾
    Eof,
}

/// 语法错误类型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParserErrorKind {
    #[error("{0}")]
    Lex(LexErrorKind),
    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken { found: String, expected: String },
    #[error("expected identifier, found {found}")]
    ExpectedIdentifier { found: String },
    #[error("expected expression, found {found}")]
    ExpectedExpression { found: String },
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
    #[error("'{0}' outside loop")]
    OutsideLoop(&'static str),
    #[error("'return' outside function")]
    ReturnOutsideFunction,
    #[error("try statement needs at least one except clause")]
    MissingExceptClause,
    #[error("integer literal '{0}' out of range")]
    IntegerOverflow(String),
    #[error("too many nested levels (limit {0})")]
    TooDeeplyNested(usize),
}

impl ParserError {
    pub fn at(kind: ParserErrorKind, coordinate: Coordinate) -> Self {
        Self {
            kind,
            location: ErrorLocation::At(coordinate),
        }
    }

    /// 获取行号（如果可用）
    pub fn line(&self) -> Option<usize> {
        match self.location {
            ErrorLocation::At(coord) => Some(coord.line),
            ErrorLocation::Eof => None,
        }
    }

    /// 获取列号（如果可用）
    pub fn column(&self) -> Option<usize> {
        match self.location {
            ErrorLocation::At(coord) => Some(coord.column),
            ErrorLocation::Eof => None,
        }
    }
}

impl std::fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorLocation::At(coord) => write!(f, "{coord}"),
            ErrorLocation::Eof => write!(f, "EOF"),
        }
    }
}

impl From<LexError> for ParserError {
    fn from(err: LexError) -> Self {
        ParserError::at(ParserErrorKind::Lex(err.kind), err.at)
    }
}
