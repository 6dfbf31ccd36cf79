//! 过滤器与校验器共用的参数模型
//!
//! 每个过滤器/校验器的参数列表中恰好包含一个值占位符 `@V`，
//! 调用时占位符被替换为当前字段值。

use crate::types::DataValue;
use std::fmt;

/// 规格种类（过滤器或校验器），用于引用缓存键与错误消息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecKind {
    Filter,
    Check,
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecKind::Filter => write!(f, "Filter"),
            SpecKind::Check => write!(f, "Check"),
        }
    }
}

/// 调用参数：值占位符或字面量
#[derive(Debug, Clone, PartialEq)]
pub enum SpecArg {
    /// 值占位符
    Value,
    /// 字面量参数
    Literal(DataValue),
}

/// 在字面量参数中插入值占位符
///
/// 位置按列表拼接的规则截断：非负位置最多为 `len`，
/// 负数位置从末尾倒数，最小为 0。
pub fn place_marker(args: Vec<DataValue>, value_pos: i64) -> Vec<SpecArg> {
    let len = args.len() as i64;
    let pos = if value_pos >= 0 {
        value_pos.min(len)
    } else {
        (len + value_pos).max(0)
    } as usize;

    let mut out: Vec<SpecArg> = args.into_iter().map(SpecArg::Literal).collect();
    out.insert(pos, SpecArg::Value);
    out
}

/// 用实际值替换占位符，得到调用参数
pub fn apply_value(args: &[SpecArg], value: &DataValue) -> Vec<DataValue> {
    args.iter()
        .map(|arg| match arg {
            SpecArg::Value => value.clone(),
            SpecArg::Literal(v) => v.clone(),
        })
        .collect()
}

/// 渲染参数列表（占位符显示为 `@V`）
pub fn describe_args(args: &[SpecArg]) -> String {
    args.iter()
        .map(|arg| match arg {
            SpecArg::Value => "@V".to_string(),
            SpecArg::Literal(v) => v.to_literal(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
