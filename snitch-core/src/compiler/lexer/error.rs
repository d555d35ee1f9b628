use crate::compiler::span::Coordinate;
use thiserror::Error;

/// 词法错误
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{at}: {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub at: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unknown escape sequence '\\{0}'")]
    UnknownEscape(char),
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
}
