//! 可调用函数表
//!
//! 过滤器和校验器按名称引用函数，名称在注册表构建时解析为可调用对象。
//! 全局函数表预置了常用的字符串/数值转换函数。

use crate::types::DataValue;
use anyhow::{anyhow, bail};
use dashmap::DashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// 可调用对象：接收参数列表，返回新值或错误
pub type Callable = Arc<dyn Fn(&[DataValue]) -> anyhow::Result<DataValue> + Send + Sync>;

/// 将闭包包装为 [`Callable`]
pub fn callable<F>(f: F) -> Callable
where
    F: Fn(&[DataValue]) -> anyhow::Result<DataValue> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 调用并捕获 panic
///
/// # 返回值
/// 调用失败或 panic 时返回错误描述
pub(crate) fn invoke(f: &Callable, args: &[DataValue]) -> Result<DataValue, String> {
    match catch_unwind(AssertUnwindSafe(|| f(args))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            Err(detail)
        }
    }
}

/// 全局命名函数表
pub struct FunctionTable {
    functions: DashMap<String, Callable>,
}

impl FunctionTable {
    /// 创建空函数表
    pub fn empty() -> Self {
        Self {
            functions: DashMap::new(),
        }
    }

    /// 创建带内置函数的函数表
    pub fn new() -> Self {
        let table = Self::empty();
        table.register("trim", callable(|args| trim_with(args, TrimSide::Both)));
        table.register("ltrim", callable(|args| trim_with(args, TrimSide::Left)));
        table.register("rtrim", callable(|args| trim_with(args, TrimSide::Right)));
        table.register(
            "strtolower",
            callable(|args| Ok(DataValue::String(string_arg(args, 0)?.to_lowercase()))),
        );
        table.register(
            "strtoupper",
            callable(|args| Ok(DataValue::String(string_arg(args, 0)?.to_uppercase()))),
        );
        table.register(
            "ucfirst",
            callable(|args| Ok(DataValue::String(map_first_char(&string_arg(args, 0)?, true)))),
        );
        table.register(
            "lcfirst",
            callable(|args| Ok(DataValue::String(map_first_char(&string_arg(args, 0)?, false)))),
        );
        table.register("ucwords", callable(ucwords));
        table.register("intval", callable(|args| Ok(DataValue::Int(intval(arg(args, 0))))));
        table.register(
            "floatval",
            callable(|args| Ok(DataValue::Float(floatval(arg(args, 0))))),
        );
        table.register(
            "strval",
            callable(|args| Ok(DataValue::String(string_arg(args, 0)?))),
        );
        table.register(
            "boolval",
            callable(|args| Ok(DataValue::Bool(arg(args, 0).is_truthy()))),
        );
        table.register("abs", callable(abs));
        table.register("round", callable(round));
        table.register("json_decode", callable(json_decode));
        table.register("json_encode", callable(json_encode));
        table.register(
            "default",
            callable(|args| {
                let value = arg(args, 0);
                if value.is_null() {
                    Ok(arg(args, 1).clone())
                } else {
                    Ok(value.clone())
                }
            }),
        );
        table
    }

    /// 注册（或替换）函数
    pub fn register(&self, name: impl Into<String>, f: Callable) {
        self.functions.insert(name.into(), f);
    }

    /// 查找函数
    pub fn get(&self, name: &str) -> Option<Callable> {
        self.functions.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// 已注册的函数名（排序）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::new()
    }
}

static NULL: DataValue = DataValue::Null;

fn arg(args: &[DataValue], index: usize) -> &DataValue {
    args.get(index).unwrap_or(&NULL)
}

fn string_arg(args: &[DataValue], index: usize) -> anyhow::Result<String> {
    let value = arg(args, index);
    value
        .coerce_string()
        .ok_or_else(|| anyhow!("argument #{} must be a string, {} given", index + 1, value.type_name()))
}

enum TrimSide {
    Left,
    Right,
    Both,
}

const DEFAULT_TRIM: &str = " \t\n\r\0\x0B";

fn trim_with(args: &[DataValue], side: TrimSide) -> anyhow::Result<DataValue> {
    let subject = string_arg(args, 0)?;
    let chars = match args.get(1) {
        Some(v) if !v.is_null() => string_arg(args, 1)?,
        _ => DEFAULT_TRIM.to_string(),
    };
    let is_trim = |c: char| chars.contains(c);
    let trimmed = match side {
        TrimSide::Left => subject.trim_start_matches(is_trim),
        TrimSide::Right => subject.trim_end_matches(is_trim),
        TrimSide::Both => subject.trim_matches(is_trim),
    };
    Ok(DataValue::String(trimmed.to_string()))
}

fn map_first_char(s: &str, upper: bool) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let head: String = if upper {
                first.to_uppercase().collect()
            } else {
                first.to_lowercase().collect()
            };
            head + chars.as_str()
        }
        None => String::new(),
    }
}

/// 单词首字母大写；第二个参数可指定分隔符集合
fn ucwords(args: &[DataValue]) -> anyhow::Result<DataValue> {
    let subject = string_arg(args, 0)?;
    let delimiters = match args.get(1) {
        Some(v) if !v.is_null() => string_arg(args, 1)?,
        _ => " \t\r\n\x0C\x0B".to_string(),
    };

    let mut out = String::with_capacity(subject.len());
    let mut boundary = true;
    for c in subject.chars() {
        if boundary {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        boundary = delimiters.contains(c);
    }
    Ok(DataValue::String(out))
}

/// 字符串前缀数字解析（忽略前导空白，遇到非数字停止）
fn leading_number(s: &str, allow_fraction: bool) -> &str {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if allow_fraction {
        if end < bytes.len() && bytes[end] == b'.' {
            end += 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
        if end > digits_start && end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
            let mut exp_end = end + 1;
            if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
                exp_end += 1;
            }
            if exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                    exp_end += 1;
                }
                end = exp_end;
            }
        }
    }
    &s[..end]
}

fn intval(value: &DataValue) -> i64 {
    match value {
        DataValue::Null => 0,
        DataValue::Bool(b) => *b as i64,
        DataValue::Int(i) => *i,
        DataValue::Float(f) => {
            if f.is_finite() {
                f.trunc() as i64
            } else {
                0
            }
        }
        DataValue::String(s) => {
            let number = leading_number(s, true);
            match number.parse::<i64>() {
                Ok(i) => i,
                Err(_) => number.parse::<f64>().map(|f| f.trunc() as i64).unwrap_or(0),
            }
        }
        DataValue::Array(items) => (!items.is_empty()) as i64,
        DataValue::Object(map) => (!map.is_empty()) as i64,
    }
}

fn floatval(value: &DataValue) -> f64 {
    match value {
        DataValue::Int(i) => *i as f64,
        DataValue::Float(f) => *f,
        DataValue::String(s) => leading_number(s, true).parse::<f64>().unwrap_or(0.0),
        other => intval(other) as f64,
    }
}

fn abs(args: &[DataValue]) -> anyhow::Result<DataValue> {
    match arg(args, 0) {
        DataValue::Int(i) => Ok(DataValue::Int(i.saturating_abs())),
        DataValue::Float(f) => Ok(DataValue::Float(f.abs())),
        other => match other.numeric_value() {
            Some(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                Ok(DataValue::Int((n as i64).abs()))
            }
            Some(n) => Ok(DataValue::Float(n.abs())),
            None => bail!("abs(): argument #1 must be numeric, {} given", other.type_name()),
        },
    }
}

fn round(args: &[DataValue]) -> anyhow::Result<DataValue> {
    let value = arg(args, 0);
    let Some(n) = value.numeric_value() else {
        bail!("round(): argument #1 must be numeric, {} given", value.type_name());
    };
    let precision = args.get(1).map(intval).unwrap_or(0).clamp(-15, 15) as i32;
    let factor = 10f64.powi(precision);
    Ok(DataValue::Float((n * factor).round() / factor))
}

fn json_decode(args: &[DataValue]) -> anyhow::Result<DataValue> {
    let text = string_arg(args, 0)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    Ok(DataValue::from_json_value(value))
}

fn json_encode(args: &[DataValue]) -> anyhow::Result<DataValue> {
    Ok(DataValue::String(serde_json::to_string(&arg(args, 0).to_json_value())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(table: &FunctionTable, name: &str, args: Vec<DataValue>) -> Result<DataValue, String> {
        let f = table.get(name).expect("builtin registered");
        invoke(&f, &args)
    }

    #[test]
    fn test_string_builtins() {
        let table = FunctionTable::new();
        assert_eq!(
            call(&table, "trim", vec!["  hi \n".into()]).unwrap(),
            DataValue::from("hi")
        );
        assert_eq!(
            call(&table, "trim", vec!["--hi--".into(), "-".into()]).unwrap(),
            DataValue::from("hi")
        );
        assert_eq!(
            call(&table, "ucwords", vec!["j.k. rowling".into(), " .".into()]).unwrap(),
            DataValue::from("J.K. Rowling")
        );
        assert_eq!(
            call(&table, "ucwords", vec!["the philosopher's stone".into()]).unwrap(),
            DataValue::from("The Philosopher's Stone")
        );
        assert_eq!(
            call(&table, "lcfirst", vec!["Hello".into()]).unwrap(),
            DataValue::from("hello")
        );
    }

    #[test]
    fn test_numeric_builtins() {
        let table = FunctionTable::new();
        assert_eq!(call(&table, "intval", vec!["  2010  ".into()]).unwrap(), DataValue::Int(2010));
        assert_eq!(call(&table, "intval", vec!["12abc".into()]).unwrap(), DataValue::Int(12));
        assert_eq!(call(&table, "intval", vec!["abc".into()]).unwrap(), DataValue::Int(0));
        assert_eq!(call(&table, "floatval", vec!["1.5kg".into()]).unwrap(), DataValue::Float(1.5));
        assert_eq!(call(&table, "abs", vec![(-3).into()]).unwrap(), DataValue::Int(3));
        assert_eq!(
            call(&table, "round", vec![2.456.into(), 2.into()]).unwrap(),
            DataValue::Float(2.46)
        );
    }

    #[test]
    fn test_default_and_json() {
        let table = FunctionTable::new();
        assert_eq!(
            call(&table, "default", vec![DataValue::Null, "x".into()]).unwrap(),
            DataValue::from("x")
        );
        assert_eq!(
            call(&table, "json_decode", vec![r#"{"a":[1]}"#.into()]).unwrap(),
            DataValue::from(serde_json::json!({"a": [1]}))
        );
        assert!(call(&table, "json_decode", vec!["{bad".into()]).is_err());
    }

    #[test]
    fn test_invoke_catches_errors_and_panics() {
        let failing = callable(|_| bail!("boom"));
        assert_eq!(invoke(&failing, &[]).unwrap_err(), "boom");

        let panicking = callable(|_| panic!("kaboom"));
        assert_eq!(invoke(&panicking, &[]).unwrap_err(), "kaboom");

        let table = FunctionTable::new();
        assert!(call(&table, "strtoupper", vec![DataValue::from(vec![1])]).is_err());
    }
}
