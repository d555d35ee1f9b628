//! Arithmetic, comparison and indexing

use super::{Unwind, Vm};
use crate::compiler::parser::BinaryOp;
use crate::runtime::stdlib::ErrorKind;
use crate::runtime::value::Value;
use std::cmp::Ordering;
use std::rc::Rc;

impl<'h> Vm<'h> {
    pub(super) fn negate(&self, value: Value) -> Result<Value, Unwind> {
        match value {
            Value::Int(i) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| self.error(ErrorKind::Runtime, "integer overflow")),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(self.error(
                ErrorKind::Type,
                format!("bad operand type for unary -: '{}'", other.type_name()),
            )),
        }
    }

    pub(super) fn binary(&self, op: BinaryOp, left: Value, right: Value) -> Result<Value, Unwind> {
        match op {
            BinaryOp::Eq | BinaryOp::Ne => {
                let equal = left
                    .equals(&right)
                    .map_err(|err| self.error(ErrorKind::Recursion, err.to_string()))?;
                Ok(Value::Bool(equal == (op == BinaryOp::Eq)))
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ordering = self.compare(op, &left, &right)?;
                let result = match op {
                    BinaryOp::Lt => ordering == Ordering::Less,
                    BinaryOp::Le => ordering != Ordering::Greater,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                Ok(Value::Bool(result))
            }
            BinaryOp::Add => self.add(left, right),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                self.arithmetic(op, left, right)
            }
            // Short-circuit operators compile to jumps.
            BinaryOp::And | BinaryOp::Or => Err(self.error(
                ErrorKind::Runtime,
                format!("'{}' is not a binary instruction", op.symbol()),
            )),
        }
    }

    fn unsupported(&self, op: BinaryOp, left: &Value, right: &Value) -> Unwind {
        self.error(
            ErrorKind::Type,
            format!(
                "unsupported operand types for {}: '{}' and '{}'",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ),
        )
    }

    fn compare(&self, op: BinaryOp, left: &Value, right: &Value) -> Result<Ordering, Unwind> {
        let ordering = match (left, right) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => match (as_float(left), as_float(right)) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        };
        ordering.ok_or_else(|| self.unsupported(op, left, right))
    }

    fn add(&self, left: Value, right: Value) -> Result<Value, Unwind> {
        match (&left, &right) {
            (Value::Str(a), Value::Str(b)) => {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(a);
                joined.push_str(b);
                Ok(Value::Str(Rc::from(joined)))
            }
            (Value::List(a), Value::List(b)) => {
                let mut items = a.borrow().clone();
                items.extend(b.borrow().iter().cloned());
                Ok(Value::list(items))
            }
            _ => self.arithmetic(BinaryOp::Add, left, right),
        }
    }

    fn arithmetic(&self, op: BinaryOp, left: Value, right: Value) -> Result<Value, Unwind> {
        if let (Value::Int(a), Value::Int(b)) = (&left, &right) {
            let (a, b) = (*a, *b);
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => {
                    if b == 0 {
                        return Err(self.error(ErrorKind::ZeroDivision, "division by zero"));
                    }
                    return Ok(Value::Float(a as f64 / b as f64));
                }
                _ => {
                    if b == 0 {
                        return Err(self.error(ErrorKind::ZeroDivision, "modulo by zero"));
                    }
                    // Result takes the sign of the divisor.
                    a.checked_rem(b).map(|r| {
                        if r != 0 && (r < 0) != (b < 0) {
                            r + b
                        } else {
                            r
                        }
                    })
                }
            };
            return result
                .map(Value::Int)
                .ok_or_else(|| self.error(ErrorKind::Runtime, "integer overflow"));
        }

        if let (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) = (&left, &right) {
            if op == BinaryOp::Mul {
                let count = usize::try_from(*n).unwrap_or(0);
                let limit = self.host.limits().max_string_length;
                return match s.len().checked_mul(count) {
                    Some(len) if len <= limit => Ok(Value::Str(Rc::from(s.repeat(count)))),
                    _ => Err(self.error(
                        ErrorKind::Runtime,
                        format!("repeated string longer than {limit} bytes"),
                    )),
                };
            }
        }

        let (Some(a), Some(b)) = (as_float(&left), as_float(&right)) else {
            return Err(self.unsupported(op, &left, &right));
        };
        let result = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div | BinaryOp::Mod if b == 0.0 => {
                return Err(self.error(ErrorKind::ZeroDivision, "float division by zero"))
            }
            BinaryOp::Div => a / b,
            _ => a - b * (a / b).floor(),
        };
        Ok(Value::Float(result))
    }

    pub(super) fn load_index(&self, object: &Value, index: &Value) -> Result<Value, Unwind> {
        match (object, index) {
            (Value::List(items), Value::Int(i)) => {
                let items = items.borrow();
                normalize_index(*i, items.len())
                    .map(|idx| items[idx].clone())
                    .ok_or_else(|| self.error(ErrorKind::Index, "list index out of range"))
            }
            (Value::Str(s), Value::Int(i)) => {
                let chars: Vec<char> = s.chars().collect();
                normalize_index(*i, chars.len())
                    .map(|idx| Value::str(&chars[idx].to_string()))
                    .ok_or_else(|| self.error(ErrorKind::Index, "string index out of range"))
            }
            (Value::List(_) | Value::Str(_), other) => Err(self.error(
                ErrorKind::Type,
                format!("indices must be integers, not '{}'", other.type_name()),
            )),
            (other, _) => Err(self.error(
                ErrorKind::Type,
                format!("'{}' object is not subscriptable", other.type_name()),
            )),
        }
    }

    pub(super) fn store_index(
        &self,
        object: &Value,
        index: &Value,
        value: Value,
    ) -> Result<(), Unwind> {
        match (object, index) {
            (Value::List(items), Value::Int(i)) => {
                let mut items = items.borrow_mut();
                let len = items.len();
                match normalize_index(*i, len) {
                    Some(idx) => {
                        items[idx] = value;
                        Ok(())
                    }
                    None => Err(self.error(ErrorKind::Index, "list assignment index out of range")),
                }
            }
            (other, _) => Err(self.error(
                ErrorKind::Type,
                format!(
                    "'{}' object does not support item assignment",
                    other.type_name()
                ),
            )),
        }
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Negative indices count from the end.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let idx = if index < 0 { index + len } else { index };
    if (0..len).contains(&idx) {
        usize::try_from(idx).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_index;

    #[test]
    fn test_normalize_index() {
        assert_eq!(normalize_index(0, 3), Some(0));
        assert_eq!(normalize_index(-1, 3), Some(2));
        assert_eq!(normalize_index(3, 3), None);
        assert_eq!(normalize_index(-4, 3), None);
        assert_eq!(normalize_index(0, 0), None);
    }
}
