//! Snitch Token 类型定义

use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // 关键字
    Var,
    Fn,
    Return,
    If,
    Elif,
    Else,
    While,
    Break,
    Continue,
    Pass,
    Try,
    Except,
    Raise,
    With,
    As,
    Import,
    From,
    True,
    False,
    Null,
    And,
    Or,
    Not,

    // 字面量
    LiteralInteger,
    LiteralFloat,
    LiteralString,

    // 标识符
    Identifier,

    // 双字符符号
    DoubleEqual,
    ExclamationEqual,
    GreaterThanEqual,
    LessThanEqual,

    // 单字符符号
    GreaterThan,
    LessThan,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Equal,
    Comma,
    Semicolon,
    LeftParenthesis,
    RightParenthesis,
    LeftCurlyBrace,
    RightCurlyBrace,
    LeftSquareBracket,
    RightSquareBracket,
    Dot,

    Eof,
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    HashMap::from([
        ("var", Var),
        ("fn", Fn),
        ("return", Return),
        ("if", If),
        ("elif", Elif),
        ("else", Else),
        ("while", While),
        ("break", Break),
        ("continue", Continue),
        ("pass", Pass),
        ("try", Try),
        ("except", Except),
        ("raise", Raise),
        ("with", With),
        ("as", As),
        ("import", Import),
        ("from", From),
        ("true", True),
        ("false", False),
        ("null", Null),
        ("and", And),
        ("or", Or),
        ("not", Not),
    ])
});

impl TokenKind {
    /// 关键字查表
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        KEYWORDS.get(ident).copied()
    }

    /// 用于错误信息的文本
    pub fn describe(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Var => "'var'",
            Fn => "'fn'",
            Return => "'return'",
            If => "'if'",
            Elif => "'elif'",
            Else => "'else'",
            While => "'while'",
            Break => "'break'",
            Continue => "'continue'",
            Pass => "'pass'",
            Try => "'try'",
            Except => "'except'",
            Raise => "'raise'",
            With => "'with'",
            As => "'as'",
            Import => "'import'",
            From => "'from'",
            True => "'true'",
            False => "'false'",
            Null => "'null'",
            And => "'and'",
            Or => "'or'",
            Not => "'not'",
            LiteralInteger => "integer",
            LiteralFloat => "float",
            LiteralString => "string",
            Identifier => "identifier",
            DoubleEqual => "'=='",
            ExclamationEqual => "'!='",
            GreaterThanEqual => "'>='",
            LessThanEqual => "'<='",
            GreaterThan => "'>'",
            LessThan => "'<'",
            Plus => "'+'",
            Minus => "'-'",
            Asterisk => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            Equal => "'='",
            Comma => "','",
            Semicolon => "';'",
            LeftParenthesis => "'('",
            RightParenthesis => "')'",
            LeftCurlyBrace => "'{'",
            RightCurlyBrace => "'}'",
            LeftSquareBracket => "'['",
            RightSquareBracket => "']'",
            Dot => "'.'",
            Eof => "end of input",
        }
    }
}
