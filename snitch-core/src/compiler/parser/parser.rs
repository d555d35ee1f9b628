use super::error::{ErrorLocation, ParseResult, ParserError, ParserErrorKind};
use super::expr::{Binary, Call, Expr, ExprKind, Index, Member, Unary, UnaryOp};
use super::module::Module;
use super::stmt::{
    Assign, CondBranch, ExceptHandler, FnDecl, FromImportStmt, IfStmt, ImportStmt, Stmt,
    StmtKind, TryStmt, VarDecl, WhileStmt, WithStmt,
};
use super::utils::{binary_operator, MAX_NESTING_DEPTH, NOT_PRECEDENCE, UNARY_PRECEDENCE};
use crate::compiler::lexer::{tokenize, Token, TokenKind};
use crate::compiler::span::{Coordinate, Span};
use tracing::debug;

/// 词法 + 语法分析的便捷入口
pub fn parse(source: &str) -> ParseResult<Module> {
    let tokens = tokenize(source)?;
    let module = Parser::new(tokens).parse()?;
    debug!(target: "snitch::parser", statements = module.body.len(), "parsed module");
    Ok(module)
}

/// 递归下降 + Pratt 表达式解析器
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// 上一个被消费 token 的结束位置
    previous_end: Coordinate,
    /// 当前所在循环层数（函数体内重新计数）
    loop_depth: usize,
    function_depth: usize,
    /// 当前表达式与代码块的嵌套层数
    nesting: usize,
}

impl Parser {
    /// `tokens` 必须以 `Eof` 结尾（`tokenize` 保证这一点）
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            previous_end: Coordinate::new(1, 1),
            loop_depth: 0,
            function_depth: 0,
            nesting: 0,
        }
    }

    /// 解析整个模块
    pub fn parse(mut self) -> ParseResult<Module> {
        let mut body = Vec::new();
        while !self.check(TokenKind::Eof) {
            body.push(self.parse_statement()?);
        }
        Ok(Module { body })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    /// 消费当前token并返回它
    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned()?;
        if token.kind != TokenKind::Eof {
            self.current += 1;
            self.previous_end = token.span.end;
        }
        Some(token)
    }

    /// 检查当前token是否为指定类型
    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// 匹配并消费指定类型的token
    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.consume();
            true
        } else {
            false
        }
    }

    fn current_start(&self) -> Coordinate {
        self.peek()
            .map(|t| t.span.start)
            .unwrap_or(self.previous_end)
    }

    fn span_from(&self, start: Coordinate) -> Span {
        Span::new(start, self.previous_end)
    }

    fn current_location(&self) -> ErrorLocation {
        match self.peek() {
            Some(token) if token.kind != TokenKind::Eof => ErrorLocation::At(token.span.start),
            _ => ErrorLocation::Eof,
        }
    }

    fn current_token_text(&self) -> String {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => format!("'{}'", token.text),
            Some(token) => token.kind.describe().to_string(),
            None => TokenKind::Eof.describe().to_string(),
        }
    }

    fn error_here(&self, kind: ParserErrorKind) -> ParserError {
        ParserError {
            kind,
            location: self.current_location(),
        }
    }

    /// 期望并消费指定类型的token，否则返回错误
    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            self.consume()
                .ok_or_else(|| self.error_here(ParserErrorKind::ExpectedExpression {
                    found: self.current_token_text(),
                }))
        } else {
            Err(self.error_here(ParserErrorKind::UnexpectedToken {
                found: self.current_token_text(),
                expected: kind.describe().to_string(),
            }))
        }
    }

    /// 期望一个标识符，返回其名称
    fn expect_identifier(&mut self) -> ParseResult<String> {
        if self.check(TokenKind::Identifier) {
            Ok(self.consume().map(|t| t.text).unwrap_or_default())
        } else {
            Err(self.error_here(ParserErrorKind::ExpectedIdentifier {
                found: self.current_token_text(),
            }))
        }
    }

    /// 解析模块路径（如 backend.api）
    fn parse_module_path(&mut self) -> ParseResult<String> {
        let mut path = self.expect_identifier()?;
        while self.match_token(TokenKind::Dot) {
            path.push('.');
            path.push_str(&self.expect_identifier()?);
        }
        Ok(path)
    }

    /// 进入一层嵌套；超过 `MAX_NESTING_DEPTH` 时报错
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.nesting >= MAX_NESTING_DEPTH {
            return Err(self.error_here(ParserErrorKind::TooDeeplyNested(MAX_NESTING_DEPTH)));
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    /// 解析 `{ stmt* }`
    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(TokenKind::LeftCurlyBrace)?;
        let mut body = Vec::new();
        while !self.check(TokenKind::RightCurlyBrace) {
            if self.check(TokenKind::Eof) {
                return Err(self.error_here(ParserErrorKind::UnexpectedToken {
                    found: self.current_token_text(),
                    expected: TokenKind::RightCurlyBrace.describe().to_string(),
                }));
            }
            body.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RightCurlyBrace)?;
        Ok(body)
    }

    /// 解析单个语句
    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.current_start();
        let kind = match self.peek_kind() {
            TokenKind::Var => self.parse_var_declaration()?,
            TokenKind::Fn => self.parse_function()?,
            TokenKind::Return => {
                if self.function_depth == 0 {
                    return Err(self.error_here(ParserErrorKind::ReturnOutsideFunction));
                }
                self.consume();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression(0)?)
                };
                self.expect(TokenKind::Semicolon)?;
                StmtKind::Return(value)
            }
            TokenKind::If => self.parse_if_statement()?,
            TokenKind::While => {
                self.consume();
                let condition = self.parse_expression(0)?;
                self.loop_depth += 1;
                let body = self.parse_block();
                self.loop_depth -= 1;
                StmtKind::While(WhileStmt {
                    condition,
                    body: body?,
                })
            }
            TokenKind::Break | TokenKind::Continue if self.loop_depth == 0 => {
                let keyword = if self.check(TokenKind::Break) {
                    "break"
                } else {
                    "continue"
                };
                return Err(self.error_here(ParserErrorKind::OutsideLoop(keyword)));
            }
            TokenKind::Break => self.parse_keyword_statement(StmtKind::Break)?,
            TokenKind::Continue => self.parse_keyword_statement(StmtKind::Continue)?,
            TokenKind::Pass => self.parse_keyword_statement(StmtKind::Pass)?,
            TokenKind::Try => self.parse_try_statement()?,
            TokenKind::Raise => {
                self.consume();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression(0)?)
                };
                self.expect(TokenKind::Semicolon)?;
                StmtKind::Raise(value)
            }
            TokenKind::With => {
                self.consume();
                let context = self.parse_expression(0)?;
                self.expect(TokenKind::As)?;
                let name = self.expect_identifier()?;
                let body = self.parse_block()?;
                StmtKind::With(WithStmt {
                    context,
                    name,
                    body,
                })
            }
            TokenKind::Import => {
                self.consume();
                let path = self.parse_module_path()?;
                let alias = if self.match_token(TokenKind::As) {
                    Some(self.expect_identifier()?)
                } else {
                    None
                };
                self.expect(TokenKind::Semicolon)?;
                StmtKind::Import(ImportStmt { path, alias })
            }
            TokenKind::From => {
                self.consume();
                let path = self.parse_module_path()?;
                self.expect(TokenKind::Import)?;
                let mut names = vec![self.expect_identifier()?];
                while self.match_token(TokenKind::Comma) {
                    names.push(self.expect_identifier()?);
                }
                self.expect(TokenKind::Semicolon)?;
                StmtKind::FromImport(FromImportStmt { path, names })
            }
            _ => self.parse_expression_statement()?,
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    fn parse_keyword_statement(&mut self, kind: StmtKind) -> ParseResult<StmtKind> {
        self.consume();
        self.expect(TokenKind::Semicolon)?;
        Ok(kind)
    }

    fn parse_var_declaration(&mut self) -> ParseResult<StmtKind> {
        self.expect(TokenKind::Var)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Equal)?;
        let value = self.parse_expression(0)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(StmtKind::Var(VarDecl { name, value }))
    }

    fn parse_function(&mut self) -> ParseResult<StmtKind> {
        self.expect(TokenKind::Fn)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LeftParenthesis)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParenthesis) {
            params.push(self.expect_identifier()?);
            while self.match_token(TokenKind::Comma) {
                params.push(self.expect_identifier()?);
            }
        }
        self.expect(TokenKind::RightParenthesis)?;

        let enclosing_loops = std::mem::take(&mut self.loop_depth);
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        self.loop_depth = enclosing_loops;

        Ok(StmtKind::Fn(FnDecl {
            name,
            params,
            body: body?,
        }))
    }

    fn parse_if_statement(&mut self) -> ParseResult<StmtKind> {
        self.expect(TokenKind::If)?;
        let mut branches = vec![self.parse_cond_branch()?];
        let mut else_body = None;
        loop {
            if self.match_token(TokenKind::Elif) {
                branches.push(self.parse_cond_branch()?);
            } else if self.match_token(TokenKind::Else) {
                else_body = Some(self.parse_block()?);
                break;
            } else {
                break;
            }
        }
        Ok(StmtKind::If(IfStmt {
            branches,
            else_body,
        }))
    }

    fn parse_cond_branch(&mut self) -> ParseResult<CondBranch> {
        let condition = self.parse_expression(0)?;
        let body = self.parse_block()?;
        Ok(CondBranch { condition, body })
    }

    fn parse_try_statement(&mut self) -> ParseResult<StmtKind> {
        self.expect(TokenKind::Try)?;
        let body = self.parse_block()?;
        let mut handlers = Vec::new();
        while self.check(TokenKind::Except) {
            handlers.push(self.parse_except_handler()?);
        }
        if handlers.is_empty() {
            return Err(self.error_here(ParserErrorKind::MissingExceptClause));
        }
        Ok(StmtKind::Try(TryStmt { body, handlers }))
    }

    /// `except [kind] [as name] { body }`
    fn parse_except_handler(&mut self) -> ParseResult<ExceptHandler> {
        let start = self.current_start();
        self.expect(TokenKind::Except)?;
        let kind = if self.check(TokenKind::As) || self.check(TokenKind::LeftCurlyBrace) {
            None
        } else {
            Some(self.parse_expression(0)?)
        };
        let name = if self.match_token(TokenKind::As) {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(ExceptHandler {
            kind,
            name,
            body,
            span: self.span_from(start),
        })
    }

    /// 表达式语句或赋值语句
    fn parse_expression_statement(&mut self) -> ParseResult<StmtKind> {
        let target_start = self.current_start();
        let expr = self.parse_expression(0)?;
        if self.match_token(TokenKind::Equal) {
            if !matches!(
                expr.kind,
                ExprKind::Name(_) | ExprKind::Member(_) | ExprKind::Index(_)
            ) {
                return Err(ParserError::at(
                    ParserErrorKind::InvalidAssignmentTarget,
                    target_start,
                ));
            }
            let value = self.parse_expression(0)?;
            self.expect(TokenKind::Semicolon)?;
            return Ok(StmtKind::Assign(Assign {
                target: expr,
                value,
            }));
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(StmtKind::Expr(expr))
    }

    /// Pratt 表达式解析
    pub fn parse_expression(&mut self, min_precedence: i32) -> ParseResult<Expr> {
        self.nested(|parser| parser.parse_binary(min_precedence))
    }

    fn parse_binary(&mut self, min_precedence: i32) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        while let Some((precedence, op)) = binary_operator(self.peek_kind()) {
            if precedence <= min_precedence {
                break;
            }
            self.consume();
            let right = self.parse_expression(precedence)?;
            let span = left.span.to(right.span);
            left = Expr::new(
                ExprKind::Binary(Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }),
                span,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.current_start();
        let (op, precedence) = match self.peek_kind() {
            TokenKind::Minus => (UnaryOp::Neg, UNARY_PRECEDENCE),
            TokenKind::Not => (UnaryOp::Not, NOT_PRECEDENCE),
            _ => return self.parse_postfix(),
        };
        self.consume();
        let operand = self.parse_expression(precedence)?;
        Ok(Expr::new(
            ExprKind::Unary(Unary {
                op,
                operand: Box::new(operand),
            }),
            self.span_from(start),
        ))
    }

    /// 调用、成员访问与下标
    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let start = self.current_start();
        let mut expr = self.parse_primary()?;
        loop {
            if self.match_token(TokenKind::LeftParenthesis) {
                let args = self.parse_arguments(TokenKind::RightParenthesis)?;
                expr = Expr::new(
                    ExprKind::Call(Call {
                        callee: Box::new(expr),
                        args,
                    }),
                    self.span_from(start),
                );
            } else if self.match_token(TokenKind::Dot) {
                let name = self.expect_identifier()?;
                expr = Expr::new(
                    ExprKind::Member(Member {
                        object: Box::new(expr),
                        name,
                    }),
                    self.span_from(start),
                );
            } else if self.match_token(TokenKind::LeftSquareBracket) {
                let index = self.parse_expression(0)?;
                self.expect(TokenKind::RightSquareBracket)?;
                expr = Expr::new(
                    ExprKind::Index(Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    }),
                    self.span_from(start),
                );
            } else {
                return Ok(expr);
            }
        }
    }

    /// 解析逗号分隔的参数，直到 `close`
    fn parse_arguments(&mut self, close: TokenKind) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(close) {
            args.push(self.parse_expression(0)?);
            while self.match_token(TokenKind::Comma) {
                if self.check(close) {
                    break;
                }
                args.push(self.parse_expression(0)?);
            }
        }
        self.expect(close)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.current_start();
        let kind = match self.peek_kind() {
            TokenKind::LiteralInteger => {
                let text = self.consume().map(|t| t.text).unwrap_or_default();
                let value = text.parse::<i64>().map_err(|_| {
                    ParserError::at(ParserErrorKind::IntegerOverflow(text.clone()), start)
                })?;
                ExprKind::Int(value)
            }
            TokenKind::LiteralFloat => {
                let text = self.consume().map(|t| t.text).unwrap_or_default();
                ExprKind::Float(text.parse::<f64>().unwrap_or(f64::NAN))
            }
            TokenKind::LiteralString => {
                ExprKind::Str(self.consume().map(|t| t.text).unwrap_or_default())
            }
            TokenKind::True => {
                self.consume();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.consume();
                ExprKind::Bool(false)
            }
            TokenKind::Null => {
                self.consume();
                ExprKind::Null
            }
            TokenKind::Identifier => ExprKind::Name(self.expect_identifier()?),
            TokenKind::LeftSquareBracket => {
                self.consume();
                ExprKind::List(self.parse_arguments(TokenKind::RightSquareBracket)?)
            }
            TokenKind::LeftParenthesis => {
                self.consume();
                let inner = self.parse_expression(0)?;
                self.expect(TokenKind::RightParenthesis)?;
                return Ok(Expr::new(inner.kind, self.span_from(start)));
            }
            _ => {
                return Err(self.error_here(ParserErrorKind::ExpectedExpression {
                    found: self.current_token_text(),
                }))
            }
        };
        Ok(Expr::new(kind, self.span_from(start)))
    }
}
