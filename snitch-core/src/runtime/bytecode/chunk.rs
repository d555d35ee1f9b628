//! 字节码块实现

use super::OpCode;
use std::fmt;
use std::rc::Rc;

/// 常量池条目
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Code(Rc<Code>),
}

/// 字节码块
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    /// 指令
    pub code: Vec<OpCode>,
    /// 常量池
    pub constants: Vec<Constant>,
    /// 名字表（全局变量、属性、模块名）
    pub names: Vec<Rc<str>>,
    /// 行号信息 (与 code 一一对应)
    pub lines: Vec<usize>,
}

/// 一个可执行单元：模块顶层或函数体
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    /// 函数名；模块顶层为 `<module>`
    pub name: Rc<str>,
    /// 源文件路径，写入 traceback
    pub filename: Rc<str>,
    /// 参数个数，占据前 `arity` 个局部变量槽
    pub arity: usize,
    /// 局部变量名；模块顶层为空，全部走全局命名空间
    pub local_names: Vec<String>,
    pub chunk: Chunk,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入指令，返回其下标
    pub fn write_op(&mut self, op: OpCode, line: usize) -> usize {
        self.code.push(op);
        self.lines.push(line);
        self.code.len() - 1
    }

    /// 写入跳转指令 (占位，稍后 patch)
    pub fn write_jump(&mut self, jump: fn(usize) -> OpCode, line: usize) -> usize {
        self.write_op(jump(usize::MAX), line)
    }

    /// 把 `at` 处跳转指令的目标修补为当前位置
    pub fn patch_jump(&mut self, at: usize) {
        let target = self.code.len();
        self.code[at] = match self.code[at] {
            OpCode::Jump(_) => OpCode::Jump(target),
            OpCode::JumpIfFalse(_) => OpCode::JumpIfFalse(target),
            OpCode::JumpIfFalseOrPop(_) => OpCode::JumpIfFalseOrPop(target),
            OpCode::JumpIfTrueOrPop(_) => OpCode::JumpIfTrueOrPop(target),
            OpCode::SetupTry(_) => OpCode::SetupTry(target),
            other => other,
        };
    }

    /// 写入循环回跳
    pub fn write_loop(&mut self, loop_start: usize, line: usize) {
        self.write_op(OpCode::Jump(loop_start), line);
    }

    /// 添加常量，返回索引；常量池满时返回 `None`
    pub fn add_constant(&mut self, value: Constant) -> Option<u16> {
        let idx = u16::try_from(self.constants.len()).ok()?;
        self.constants.push(value);
        Some(idx)
    }

    /// 登记名字（去重），返回索引
    pub fn add_name(&mut self, name: &str) -> Option<u16> {
        if let Some(idx) = self.names.iter().position(|n| &**n == name) {
            return u16::try_from(idx).ok();
        }
        let idx = u16::try_from(self.names.len()).ok()?;
        self.names.push(Rc::from(name));
        Some(idx)
    }

    pub fn line_at(&self, ip: usize) -> usize {
        self.lines.get(ip).copied().unwrap_or(0)
    }
}

impl fmt::Display for Chunk {
    /// 反汇编输出
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.code.iter().enumerate() {
            writeln!(f, "{:04} {:>4} {:?}", i, self.line_at(i), op)?;
        }
        Ok(())
    }
}
