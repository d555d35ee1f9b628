//! 词法分析

mod error;
mod lexer;
pub mod token_kind;

pub use error::{LexError, LexErrorKind};
pub use lexer::{escape_string, tokenize, Lexer, Token};
pub use token_kind::TokenKind;
