//! 类型名规范化
//!
//! 将声明中出现的类型别名统一为运行时类型名，保证声明类型与
//! [`DataValue::type_name`](crate::types::DataValue::type_name) 可直接比较。

use crate::types::DataValue;

/// 任意类型的标记
pub const ANY_TYPE: &str = "any";

/// 规范化单个类型名
///
/// 已知别名映射到规范名，其余名称原样返回（去除首尾空白），
/// 因此模型类型名不受影响。
pub fn type_name(name: &str) -> String {
    let trimmed = name.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "int" | "integer" => "integer".to_string(),
        "bool" | "boolean" => "boolean".to_string(),
        "double" | "float" => "float".to_string(),
        "str" | "string" => "string".to_string(),
        "list" | "array" => "array".to_string(),
        "map" | "dict" | "object" => "object".to_string(),
        "null" => "null".to_string(),
        "mixed" | "any" => ANY_TYPE.to_string(),
        _ => trimmed.to_string(),
    }
}

/// 规范化一组类型名
pub fn type_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(|n| type_name(n.as_ref())).collect()
}

/// 解析 `|` 分隔的类型表达式，丢弃空片段
pub fn types_from_str(types: &str) -> Vec<String> {
    types
        .split('|')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(type_name)
        .collect()
}

/// 类型列表是否表示任意类型
pub fn is_any(types: &[String]) -> bool {
    types.is_empty() || types.iter().any(|t| t == ANY_TYPE)
}

/// 值是否满足单个声明类型
///
/// `array` 同时接受列表和映射，`object` 只接受映射
pub fn value_matches(declared: &str, value: &DataValue) -> bool {
    if declared == ANY_TYPE {
        return true;
    }
    let actual = value.type_name();
    declared == actual || (declared == "array" && actual == "object")
}

/// 值是否满足类型列表中的任一类型
pub fn value_matches_any(types: &[String], value: &DataValue) -> bool {
    is_any(types) || types.iter().any(|t| value_matches(t, value))
}
