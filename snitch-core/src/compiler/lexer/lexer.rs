use super::error::{LexError, LexErrorKind};
use super::token_kind::TokenKind;
use crate::compiler::span::{Coordinate, Span};
use tracing::trace;

/// 词法单元
///
/// `text` 对标识符是名字，对字符串字面量是转义处理后的内容，对数字是原文。
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

/// 逐字符扫描的词法分析器
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: Coordinate,
}

/// 将整个源码切分为 token 序列，末尾总是 `Eof`
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    trace!(target: "snitch::lexer", count = tokens.len(), "tokenized");
    Ok(tokens)
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            position: Coordinate::new(1, 1),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        Some(c)
    }

    fn error(&self, kind: LexErrorKind, at: Coordinate) -> LexError {
        LexError { kind, at }
    }

    /// 跳过空白与 `//` 注释
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();
        let start = self.position;

        let Some(c) = self.bump() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                span: Span::new(start, start),
            });
        };

        let (kind, text) = match c {
            '"' => (TokenKind::LiteralString, self.string_body(start)?),
            c if c.is_ascii_digit() => self.number(c, start)?,
            c if c == '_' || c.is_alphabetic() => {
                let mut ident = String::from(c);
                while let Some(next) = self.peek() {
                    if next == '_' || next.is_alphanumeric() {
                        ident.push(next);
                        self.bump();
                    } else {
                        break;
                    }
                }
                let kind = TokenKind::keyword(&ident).unwrap_or(TokenKind::Identifier);
                (kind, ident)
            }
            _ => {
                let kind = self.symbol(c, start)?;
                (kind, String::new())
            }
        };

        Ok(Token {
            kind,
            text,
            span: Span::new(start, self.position),
        })
    }

    fn symbol(&mut self, c: char, start: Coordinate) -> Result<TokenKind, LexError> {
        use TokenKind::*;
        let followed_by_equal = self.peek() == Some('=');
        let kind = match c {
            '=' if followed_by_equal => DoubleEqual,
            '!' if followed_by_equal => ExclamationEqual,
            '>' if followed_by_equal => GreaterThanEqual,
            '<' if followed_by_equal => LessThanEqual,
            '=' => Equal,
            '>' => GreaterThan,
            '<' => LessThan,
            '+' => Plus,
            '-' => Minus,
            '*' => Asterisk,
            '/' => Slash,
            '%' => Percent,
            ',' => Comma,
            ';' => Semicolon,
            '(' => LeftParenthesis,
            ')' => RightParenthesis,
            '{' => LeftCurlyBrace,
            '}' => RightCurlyBrace,
            '[' => LeftSquareBracket,
            ']' => RightSquareBracket,
            '.' => Dot,
            other => return Err(self.error(LexErrorKind::UnexpectedCharacter(other), start)),
        };
        if matches!(
            kind,
            DoubleEqual | ExclamationEqual | GreaterThanEqual | LessThanEqual
        ) {
            self.bump();
        }
        Ok(kind)
    }

    fn number(&mut self, first: char, start: Coordinate) -> Result<(TokenKind, String), LexError> {
        let mut text = String::from(first);
        let mut kind = TokenKind::LiteralInteger;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else if c == '.'
                && kind == TokenKind::LiteralInteger
                && self.peek_second().is_some_and(|d| d.is_ascii_digit())
            {
                kind = TokenKind::LiteralFloat;
                text.push(c);
                self.bump();
            } else if c == '_' || c.is_alphabetic() {
                text.push(c);
                self.bump();
                return Err(self.error(LexErrorKind::InvalidNumber(text), start));
            } else {
                break;
            }
        }
        Ok((kind, text))
    }

    /// 读取字符串剩余部分（开头的引号已消费）
    fn string_body(&mut self, start: Coordinate) -> Result<String, LexError> {
        let mut value = String::new();
        loop {
            let escape_at = self.position;
            match self.bump() {
                None => return Err(self.error(LexErrorKind::UnterminatedString, start)),
                Some('"') => return Ok(value),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some(other) => {
                            return Err(self.error(LexErrorKind::UnknownEscape(other), escape_at))
                        }
                        None => return Err(self.error(LexErrorKind::UnterminatedString, start)),
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }
    }
}

/// 把任意文本转写为字符串字面量的内容部分
pub fn escape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("try except as raise with foo"),
            vec![Try, Except, As, Raise, With, Identifier, Eof]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("42 3.5 x.y").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LiteralInteger);
        assert_eq!(tokens[1].kind, TokenKind::LiteralFloat);
        assert_eq!(tokens[1].text, "3.5");
        assert_eq!(tokens[3].kind, TokenKind::Dot);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#""a\n\"b\"\\""#).unwrap();
        assert_eq!(tokens[0].text, "a\n\"b\"\\");
    }

    #[test]
    fn test_comments_and_positions() {
        let tokens = tokenize("// header\n  var x = 1;").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Var);
        assert_eq!(tokens[0].span.start, Coordinate::new(2, 3));
        assert_eq!(tokens[0].span.end, Coordinate::new(2, 6));
    }

    #[test]
    fn test_two_char_symbols() {
        use TokenKind::*;
        assert_eq!(
            kinds("== != >= <= = < >"),
            vec![
                DoubleEqual,
                ExclamationEqual,
                GreaterThanEqual,
                LessThanEqual,
                Equal,
                LessThan,
                GreaterThan,
                Eof,
            ]
        );
    }

    #[test]
    fn test_errors() {
        let err = tokenize("\"open").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);

        let err = tokenize("var a = @;").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('@'));
        assert_eq!(err.at, Coordinate::new(1, 9));

        let err = tokenize("\"\\q\"").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnknownEscape('q'));

        assert!(tokenize("12ab").is_err());
    }

    #[test]
    fn test_escape_round_trips_through_lexer() {
        let raw = "C:\\logs\\\"x\"\n";
        let literal = format!("\"{}\"", escape_string(raw));
        let tokens = tokenize(&literal).unwrap();
        assert_eq!(tokens[0].text, raw);
    }
}
