//! 源代码位置

use std::fmt;

/// 源代码坐标（1-based）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Coordinate {
    pub line: usize,
    pub column: usize,
}

impl Coordinate {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// 源代码区间
///
/// `Span::UNKNOWN`（行号为 0）表示节点没有位置，编译器会拒绝这类节点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Coordinate,
    pub end: Coordinate,
}

impl Span {
    pub const UNKNOWN: Span = Span {
        start: Coordinate::new(0, 0),
        end: Coordinate::new(0, 0),
    };

    pub const fn new(start: Coordinate, end: Coordinate) -> Self {
        Self { start, end }
    }

    /// 覆盖两个区间的最小区间
    pub fn to(self, other: Span) -> Span {
        if self.is_unknown() {
            return other;
        }
        if other.is_unknown() {
            return self;
        }
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.start.line == 0
    }

    pub fn line(&self) -> usize {
        self.start.line
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_span() {
        assert!(Span::UNKNOWN.is_unknown());
        assert!(Span::default().is_unknown());
        let known = Span::new(Coordinate::new(1, 1), Coordinate::new(1, 4));
        assert!(!known.is_unknown());
    }

    #[test]
    fn test_span_merge() {
        let a = Span::new(Coordinate::new(1, 5), Coordinate::new(1, 8));
        let b = Span::new(Coordinate::new(3, 1), Coordinate::new(3, 2));
        let merged = a.to(b);
        assert_eq!(merged.start, Coordinate::new(1, 5));
        assert_eq!(merged.end, Coordinate::new(3, 2));
        assert_eq!(Span::UNKNOWN.to(a), a);
    }
}
