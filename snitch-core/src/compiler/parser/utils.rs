use super::super::lexer::TokenKind;
use super::expr::BinaryOp;

/// `not` 的操作数优先级
pub const NOT_PRECEDENCE: i32 = 30;
/// 一元负号的操作数优先级
pub const UNARY_PRECEDENCE: i32 = 70;

/// 表达式与代码块的最大嵌套层数
pub const MAX_NESTING_DEPTH: usize = 64;

/// 二元运算符的优先级与对应运算；非二元运算符返回 `None`
pub fn binary_operator(kind: TokenKind) -> Option<(i32, BinaryOp)> {
    let entry = match kind {
        TokenKind::Or => (10, BinaryOp::Or),
        TokenKind::And => (20, BinaryOp::And),
        TokenKind::DoubleEqual => (40, BinaryOp::Eq),
        TokenKind::ExclamationEqual => (40, BinaryOp::Ne),
        TokenKind::LessThan => (40, BinaryOp::Lt),
        TokenKind::LessThanEqual => (40, BinaryOp::Le),
        TokenKind::GreaterThan => (40, BinaryOp::Gt),
        TokenKind::GreaterThanEqual => (40, BinaryOp::Ge),
        TokenKind::Plus => (50, BinaryOp::Add),
        TokenKind::Minus => (50, BinaryOp::Sub),
        TokenKind::Asterisk => (60, BinaryOp::Mul),
        TokenKind::Slash => (60, BinaryOp::Div),
        TokenKind::Percent => (60, BinaryOp::Mod),
        _ => return None,
    };
    Some(entry)
}
