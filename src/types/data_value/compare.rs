//! 宽松比较与字符串强制转换
//!
//! 校验操作符（`==`、`<`、`in` 等）和内置函数需要在不同类型之间比较或转换值，
//! 这里集中实现这些规则：数字与数字字符串按数值比较，其余按类型自身语义比较。

use super::DataValue;
use std::cmp::Ordering;

/// 解析数字字符串（允许首尾空白），不接受部分数字
pub(crate) fn parse_numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.contains("inf") || lower.contains("nan") {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

impl DataValue {
    /// 真值判断：null、false、0、0.0、""、"0"、空容器为假
    pub fn is_truthy(&self) -> bool {
        match self {
            DataValue::Null => false,
            DataValue::Bool(b) => *b,
            DataValue::Int(i) => *i != 0,
            DataValue::Float(f) => *f != 0.0,
            DataValue::String(s) => !(s.is_empty() || s == "0"),
            DataValue::Array(items) => !items.is_empty(),
            DataValue::Object(map) => !map.is_empty(),
        }
    }

    /// 空值判断（与真值相反）
    pub fn is_empty_value(&self) -> bool {
        !self.is_truthy()
    }

    /// 数值视图：数字本身或数字字符串
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            DataValue::Int(i) => Some(*i as f64),
            DataValue::Float(f) => Some(*f),
            DataValue::String(s) => parse_numeric(s),
            _ => None,
        }
    }

    /// 强制转换为字符串；容器无法转换
    pub fn coerce_string(&self) -> Option<String> {
        match self {
            DataValue::Null => Some(String::new()),
            DataValue::Bool(true) => Some("1".to_string()),
            DataValue::Bool(false) => Some(String::new()),
            DataValue::Int(i) => Some(i.to_string()),
            DataValue::Float(f) => Some(format_float(*f)),
            DataValue::String(s) => Some(s.clone()),
            DataValue::Array(_) | DataValue::Object(_) => None,
        }
    }

    /// 严格相等：类型与值都相同
    pub fn strict_eq(&self, other: &DataValue) -> bool {
        self == other
    }

    /// 宽松相等
    pub fn loose_eq(&self, other: &DataValue) -> bool {
        match (self, other) {
            (DataValue::Null, DataValue::Null) => true,
            (DataValue::Null, DataValue::String(s)) | (DataValue::String(s), DataValue::Null) => {
                s.is_empty()
            }
            (DataValue::Null, v) | (v, DataValue::Null) => !v.is_truthy(),
            (DataValue::Bool(b), v) | (v, DataValue::Bool(b)) => *b == v.is_truthy(),
            (DataValue::String(a), DataValue::String(b)) => {
                match (parse_numeric(a), parse_numeric(b)) {
                    (Some(x), Some(y)) => x == y,
                    _ => a == b,
                }
            }
            (DataValue::Array(a), DataValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (DataValue::Object(a), DataValue::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).map(|o| v.loose_eq(o)).unwrap_or(false))
            }
            (DataValue::Array(_) | DataValue::Object(_), _)
            | (_, DataValue::Array(_) | DataValue::Object(_)) => false,
            (a, b) => match (a.numeric_value(), b.numeric_value()) {
                (Some(x), Some(y)) => x == y,
                // 数字与非数字字符串：按字符串比较
                _ => a.coerce_string() == b.coerce_string(),
            },
        }
    }

    /// 宽松排序比较
    ///
    /// # 返回值
    /// 无法比较时返回 `None`（例如映射与数字）
    pub fn loose_cmp(&self, other: &DataValue) -> Option<Ordering> {
        match (self, other) {
            (DataValue::Null, DataValue::String(s)) => Some("".cmp(s.as_str())),
            (DataValue::String(s), DataValue::Null) => Some(s.as_str().cmp("")),
            (DataValue::Null | DataValue::Bool(_), _) | (_, DataValue::Null | DataValue::Bool(_)) => {
                Some(self.is_truthy().cmp(&other.is_truthy()))
            }
            (DataValue::String(a), DataValue::String(b)) => {
                match (parse_numeric(a), parse_numeric(b)) {
                    (Some(x), Some(y)) => x.partial_cmp(&y),
                    _ => Some(a.cmp(b)),
                }
            }
            (DataValue::Array(a), DataValue::Array(b)) => Some(a.len().cmp(&b.len())),
            (DataValue::Object(a), DataValue::Object(b)) => Some(a.len().cmp(&b.len())),
            (DataValue::Array(_) | DataValue::Object(_), _)
            | (_, DataValue::Array(_) | DataValue::Object(_)) => None,
            (a, b) => match (a.numeric_value(), b.numeric_value()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => match (a.coerce_string(), b.coerce_string()) {
                    (Some(x), Some(y)) => Some(x.cmp(&y)),
                    _ => None,
                },
            },
        }
    }

    /// 渲染为错误消息中使用的字面量
    ///
    /// 标量渲染为源码字面量形式（字符串带单引号），容器渲染为 JSON
    pub fn to_literal(&self) -> String {
        match self {
            DataValue::Null => "NULL".to_string(),
            DataValue::Bool(b) => b.to_string(),
            DataValue::Int(i) => i.to_string(),
            DataValue::Float(f) => format_float(*f),
            DataValue::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            DataValue::Array(_) | DataValue::Object(_) => self.to_string(),
        }
    }
}

/// 浮点数格式化：整数值保留一位小数以区别于整数
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!DataValue::from("0").is_truthy());
        assert!(!DataValue::from("").is_truthy());
        assert!(DataValue::from("0.0").is_truthy());
        assert!(!DataValue::Array(vec![]).is_truthy());
        assert!(DataValue::from(-1).is_truthy());
    }

    #[test]
    fn test_loose_equality() {
        assert!(DataValue::from("1").loose_eq(&DataValue::from(1)));
        assert!(DataValue::from("1.0").loose_eq(&DataValue::from("1")));
        assert!(DataValue::Null.loose_eq(&DataValue::from(false)));
        assert!(DataValue::Null.loose_eq(&DataValue::from("")));
        assert!(!DataValue::from("abc").loose_eq(&DataValue::from(0)));
        assert!(!DataValue::from("1").strict_eq(&DataValue::from(1)));
    }

    #[test]
    fn test_loose_ordering() {
        assert_eq!(
            DataValue::from("10").loose_cmp(&DataValue::from(9)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            DataValue::from("apple").loose_cmp(&DataValue::from("banana")),
            Some(Ordering::Less)
        );
        assert_eq!(
            DataValue::from(2).loose_cmp(&DataValue::Array(vec![])),
            None
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(DataValue::from("it's").to_literal(), "'it\\'s'");
        assert_eq!(DataValue::from(3).to_literal(), "3");
        assert_eq!(DataValue::from(2.0).to_literal(), "2.0");
        assert_eq!(DataValue::Null.to_literal(), "NULL");
        assert_eq!(DataValue::from(vec![1, 2]).to_literal(), "[1,2]");
    }
}
