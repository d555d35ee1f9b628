//! 字节码定义

mod chunk;

pub use chunk::{Chunk, Code, Constant};

use crate::compiler::parser::BinaryOp;

/// 虚拟机指令
///
/// 跳转目标是指令下标（绝对地址），名字操作数是 `Chunk::names` 的下标。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    LoadConst(u16),
    LoadNull,
    LoadTrue,
    LoadFalse,
    Pop,

    LoadLocal(u16),
    StoreLocal(u16),
    LoadGlobal(u16),
    StoreGlobal(u16),
    /// [obj] -> [obj.name]
    LoadAttr(u16),
    /// [obj, value] -> []
    StoreAttr(u16),
    /// [obj, index] -> [obj[index]]
    LoadIndex,
    /// [obj, index, value] -> []
    StoreIndex,
    BuildList(u16),

    Negate,
    Not,
    Binary(BinaryOp),

    Jump(usize),
    /// 弹出条件
    JumpIfFalse(usize),
    /// 短路 `and`：为假时保留栈顶并跳转，否则弹出
    JumpIfFalseOrPop(usize),
    /// 短路 `or`
    JumpIfTrueOrPop(usize),

    /// [callee, args...] -> [result]
    Call(u8),
    Return,
    /// 常量池中的 `Constant::Code`
    MakeFunction(u16),

    /// 导入模块；`leaf` 为真时压入叶子模块，否则压入顶层包
    ImportName { name: u16, leaf: bool },
    /// [module] -> [module, module.name]
    ImportFrom(u16),

    /// 注册异常处理入口
    SetupTry(usize),
    /// 正常离开 try 体
    PopBlock,
    /// [exc, kind] -> [exc, matched]
    ExceptMatch,
    /// 正常离开 except 体
    EndHandler,
    /// [exc] -> 无匹配分支，原样继续传播
    Reraise,
    /// [exc] -> 抛出
    Raise,
    /// 裸 `raise;`
    RaiseCurrent,
    /// [ctx] -> [ctx, ctx]，登记 with 块
    EnterWith,
    /// [ctx] -> []，关闭资源
    ExitWith,
}
