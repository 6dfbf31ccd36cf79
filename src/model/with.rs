//! 内置校验操作符
//!
//! 每个操作符对字段值和若干操作数求值，失败时生成可读的错误消息。

use crate::model::types::{type_name, types_from_str, value_matches_any};
use crate::types::DataValue;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

macro_rules! with_operators {
    ($($variant:ident => $tag:literal),* $(,)?) => {
        /// 内置校验操作符
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum With {
            $($variant),*
        }

        impl With {
            /// 所有操作符
            pub const ALL: &'static [With] = &[$(With::$variant),*];

            /// 操作符标签（声明中使用的字符串形式）
            pub fn tag(&self) -> &'static str {
                match self {
                    $(With::$variant => $tag),*
                }
            }

            /// 按标签查找操作符
            pub fn from_tag(tag: &str) -> Option<With> {
                match tag {
                    $($tag => Some(With::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

with_operators! {
    EqualStrict => "===",
    Equal => "==",
    NotEqualStrict => "!==",
    NotEqual => "!=",
    LessThanOrEqual => "<=",
    GreaterThanOrEqual => ">=",
    LessThan => "<",
    GreaterThan => ">",
    Is => "is",
    IsNot => "is_not",
    Equals => "equals",
    NotEquals => "not_equals",
    Contains => "contains",
    MbContains => "mb_contains",
    NotContains => "not_contains",
    NotMbContains => "not_mb_contains",
    StartsWith => "starts_with",
    MbStartsWith => "mb_starts_with",
    StartsWithCi => "starts_with_ci",
    MbStartsWithCi => "mb_starts_with_ci",
    NotStartsWith => "not_starts_with",
    MbNotStartsWith => "mb_not_starts_with",
    NotStartsWithCi => "not_starts_with_ci",
    MbNotStartsWithCi => "mb_not_starts_with_ci",
    EndsWith => "ends_with",
    MbEndsWith => "mb_ends_with",
    EndsWithCi => "ends_with_ci",
    MbEndsWithCi => "mb_ends_with_ci",
    NotEndsWith => "not_ends_with",
    MbNotEndsWith => "mb_not_ends_with",
    NotEndsWithCi => "not_ends_with_ci",
    MbNotEndsWithCi => "mb_not_ends_with_ci",
    Length => "length",
    MbLength => "mb_length",
    NotLength => "not_length",
    NotMbLength => "not_mb_length",
    MinLength => "min_length",
    MinMbLength => "min_mb_length",
    MaxLength => "max_length",
    MaxMbLength => "max_mb_length",
    BetweenLength => "between_length",
    BetweenMbLength => "between_mb_length",
    NotBetweenLength => "not_between_length",
    NotBetweenMbLength => "not_between_mb_length",
    In => "in",
    NotIn => "not_in",
    IsNull => "is_null",
    IsNotNull => "is_not_null",
    IsEmpty => "is_empty",
    IsNotEmpty => "is_not_empty",
    Type => "type",
    NotType => "not_type",
    Instance => "instance",
    NotInstance => "not_instance",
    InRange => "in_range",
    NotInRange => "not_in_range",
    Regex => "regex",
    NotRegex => "not_regex",
    IsAlpha => "is_alpha",
    IsNotAlpha => "is_not_alpha",
    IsAlnum => "is_alnum",
    IsNotAlnum => "is_not_alnum",
    IsDigit => "is_digit",
    IsNotDigit => "is_not_digit",
    IsLower => "is_lower",
    IsNotLower => "is_not_lower",
    IsUpper => "is_upper",
    IsNotUpper => "is_not_upper",
    IsSpace => "is_space",
    IsNotSpace => "is_not_space",
    IsXdigit => "is_xdigit",
    IsNotXdigit => "is_not_xdigit",
    IsPrint => "is_print",
    IsNotPrint => "is_not_print",
    IsGraph => "is_graph",
    IsNotGraph => "is_not_graph",
}

impl fmt::Display for With {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl std::str::FromStr for With {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        With::from_tag(s).ok_or_else(|| format!("unknown operator '{}'", s))
    }
}

static NULL: DataValue = DataValue::Null;

/// 已编译的正则缓存
static REGEX_CACHE: Lazy<DashMap<String, Regex>> = Lazy::new(DashMap::new);

/// 字符串子串判断的匹配方式
#[derive(Clone, Copy)]
enum Affix {
    Contains,
    Prefix,
    Suffix,
}

/// 大小写处理方式：区分大小写、ASCII 忽略大小写、Unicode 忽略大小写
#[derive(Clone, Copy)]
enum Case {
    Sensitive,
    AsciiInsensitive,
    UnicodeInsensitive,
}

/// 长度计量：字节或字符
#[derive(Clone, Copy)]
enum Measure {
    Bytes,
    Chars,
}

/// 字符类
#[derive(Clone, Copy)]
enum CharClass {
    Alpha,
    Alnum,
    Digit,
    Lower,
    Upper,
    Space,
    Xdigit,
    Print,
    Graph,
}

impl With {
    /// 求值
    ///
    /// # 参数
    /// * `value` - 字段值
    /// * `operands` - 操作数（参数列表中除值以外的部分，按顺序）
    ///
    /// # 返回值
    /// `Ok((是否通过, 失败消息))`；操作数或值的类型无法参与运算时返回 `Err`
    pub fn evaluate(&self, value: &DataValue, operands: &[DataValue]) -> Result<(bool, String), String> {
        let valid = self.test(value, operands)?;
        let message = if valid {
            String::new()
        } else {
            self.error_message(operands)
        };
        Ok((valid, message))
    }

    fn test(&self, value: &DataValue, operands: &[DataValue]) -> Result<bool, String> {
        let arg1 = operands.first().unwrap_or(&NULL);
        let arg2 = operands.get(1).unwrap_or(&NULL);
        let cmp = |a: &DataValue, b: &DataValue, accept: fn(Ordering) -> bool| {
            a.loose_cmp(b).map(accept).unwrap_or(false)
        };

        use With::*;
        let valid = match self {
            EqualStrict | Is => value.strict_eq(arg1),
            NotEqualStrict | IsNot => !value.strict_eq(arg1),
            Equal | Equals => value.loose_eq(arg1),
            NotEqual | NotEquals => !value.loose_eq(arg1),
            LessThanOrEqual => cmp(value, arg1, Ordering::is_le),
            GreaterThanOrEqual => cmp(value, arg1, Ordering::is_ge),
            LessThan => cmp(value, arg1, Ordering::is_lt),
            GreaterThan => cmp(value, arg1, Ordering::is_gt),

            Contains | MbContains => affix(value, arg1, Affix::Contains, Case::Sensitive)?,
            NotContains | NotMbContains => !affix(value, arg1, Affix::Contains, Case::Sensitive)?,
            StartsWith | MbStartsWith => affix(value, arg1, Affix::Prefix, Case::Sensitive)?,
            StartsWithCi => affix(value, arg1, Affix::Prefix, Case::AsciiInsensitive)?,
            MbStartsWithCi => affix(value, arg1, Affix::Prefix, Case::UnicodeInsensitive)?,
            NotStartsWith | MbNotStartsWith => !affix(value, arg1, Affix::Prefix, Case::Sensitive)?,
            NotStartsWithCi => !affix(value, arg1, Affix::Prefix, Case::AsciiInsensitive)?,
            MbNotStartsWithCi => !affix(value, arg1, Affix::Prefix, Case::UnicodeInsensitive)?,
            EndsWith | MbEndsWith => affix(value, arg1, Affix::Suffix, Case::Sensitive)?,
            EndsWithCi => affix(value, arg1, Affix::Suffix, Case::AsciiInsensitive)?,
            MbEndsWithCi => affix(value, arg1, Affix::Suffix, Case::UnicodeInsensitive)?,
            NotEndsWith | MbNotEndsWith => !affix(value, arg1, Affix::Suffix, Case::Sensitive)?,
            NotEndsWithCi => !affix(value, arg1, Affix::Suffix, Case::AsciiInsensitive)?,
            MbNotEndsWithCi => !affix(value, arg1, Affix::Suffix, Case::UnicodeInsensitive)?,

            Length => length(value, Measure::Bytes)? == int_operand(arg1)?,
            MbLength => length(value, Measure::Chars)? == int_operand(arg1)?,
            NotLength => length(value, Measure::Bytes)? != int_operand(arg1)?,
            NotMbLength => length(value, Measure::Chars)? != int_operand(arg1)?,
            MinLength => length(value, Measure::Bytes)? >= int_operand(arg1)?,
            MinMbLength => length(value, Measure::Chars)? >= int_operand(arg1)?,
            MaxLength => length(value, Measure::Bytes)? <= int_operand(arg1)?,
            MaxMbLength => length(value, Measure::Chars)? <= int_operand(arg1)?,
            BetweenLength => between(length(value, Measure::Bytes)?, arg1, arg2)?,
            BetweenMbLength => between(length(value, Measure::Chars)?, arg1, arg2)?,
            NotBetweenLength => !between(length(value, Measure::Bytes)?, arg1, arg2)?,
            NotBetweenMbLength => !between(length(value, Measure::Chars)?, arg1, arg2)?,

            In => contains_value(arg1, value)?,
            NotIn => !contains_value(arg1, value)?,
            IsNull => value.is_null(),
            IsNotNull => !value.is_null(),
            IsEmpty => value.is_empty_value(),
            IsNotEmpty => !value.is_empty_value(),
            Type => type_name(&string_operand(arg1)?) == value.type_name(),
            NotType => type_name(&string_operand(arg1)?) != value.type_name(),
            Instance => value_matches_any(&types_from_str(&string_operand(arg1)?), value),
            NotInstance => !value_matches_any(&types_from_str(&string_operand(arg1)?), value),
            InRange => cmp(value, arg1, Ordering::is_ge) && cmp(value, arg2, Ordering::is_le),
            NotInRange => cmp(value, arg1, Ordering::is_lt) || cmp(value, arg2, Ordering::is_gt),
            Regex => regex_match(arg1, value)?,
            NotRegex => !regex_match(arg1, value)?,

            IsAlpha => char_class(value, CharClass::Alpha),
            IsNotAlpha => !char_class(value, CharClass::Alpha),
            IsAlnum => char_class(value, CharClass::Alnum),
            IsNotAlnum => !char_class(value, CharClass::Alnum),
            IsDigit => char_class(value, CharClass::Digit),
            IsNotDigit => !char_class(value, CharClass::Digit),
            IsLower => char_class(value, CharClass::Lower),
            IsNotLower => !char_class(value, CharClass::Lower),
            IsUpper => char_class(value, CharClass::Upper),
            IsNotUpper => !char_class(value, CharClass::Upper),
            IsSpace => char_class(value, CharClass::Space),
            IsNotSpace => !char_class(value, CharClass::Space),
            IsXdigit => char_class(value, CharClass::Xdigit),
            IsNotXdigit => !char_class(value, CharClass::Xdigit),
            IsPrint => char_class(value, CharClass::Print),
            IsNotPrint => !char_class(value, CharClass::Print),
            IsGraph => char_class(value, CharClass::Graph),
            IsNotGraph => !char_class(value, CharClass::Graph),
        };
        Ok(valid)
    }

    /// 渲染操作数：单个操作数使用字面量形式，多个操作数渲染为 JSON 列表
    pub fn render_operands(operands: &[DataValue]) -> String {
        match operands {
            [] => String::new(),
            [single] => single.to_literal(),
            many => DataValue::Array(many.to_vec()).to_string(),
        }
    }

    /// 失败消息
    pub fn error_message(&self, operands: &[DataValue]) -> String {
        let s = With::render_operands(operands);
        use With::*;
        match self {
            EqualStrict | Is => format!("Must be strictly equal to {}", s),
            Equal | Equals => format!("Must be equal to {}", s),
            NotEqualStrict | IsNot => format!("Must not be strictly equal to {}", s),
            NotEqual | NotEquals => format!("Must not be equal to {}", s),
            LessThanOrEqual => format!("Must be less than or equal to {}", s),
            GreaterThanOrEqual => format!("Must be greater than or equal to {}", s),
            LessThan => format!("Must be less than {}", s),
            GreaterThan => format!("Must be greater than {}", s),
            Contains | MbContains => format!("Must contain {}", s),
            NotContains | NotMbContains => format!("Must not contain {}", s),
            StartsWith | MbStartsWith => format!("Must start with {}", s),
            StartsWithCi | MbStartsWithCi => format!("Must start with {} (case insensitive)", s),
            NotStartsWith | MbNotStartsWith => format!("Must not start with {}", s),
            NotStartsWithCi | MbNotStartsWithCi => {
                format!("Must not start with {} (case insensitive)", s)
            }
            EndsWith | MbEndsWith => format!("Must end with {}", s),
            EndsWithCi | MbEndsWithCi => format!("Must end with {} (case insensitive)", s),
            NotEndsWith | MbNotEndsWith => format!("Must not end with {}", s),
            NotEndsWithCi | MbNotEndsWithCi => format!("Must not end with {} (case insensitive)", s),
            Length | MbLength => format!("Must have a length of {}", s),
            NotLength | NotMbLength => format!("Must not have a length of {}", s),
            MinLength | MinMbLength => format!("Must have a minimum length of {}", s),
            MaxLength | MaxMbLength => format!("Must have a maximum length of {}", s),
            BetweenLength | BetweenMbLength => format!("Must have a length between {}", s),
            NotBetweenLength | NotBetweenMbLength => format!("Must not have a length between {}", s),
            In => format!("Must be one of the following values: {}", s),
            NotIn => format!("Must not be one of the following values: {}", s),
            IsNull => "Must be null".to_string(),
            IsNotNull => "Must not be null".to_string(),
            IsEmpty => "Must be empty".to_string(),
            IsNotEmpty => "Must not be empty".to_string(),
            Type => format!("Must be of type {}", s),
            NotType => format!("Must not be of type {}", s),
            Instance => format!("Must be an instance of {}", s),
            NotInstance => format!("Must not be an instance of {}", s),
            InRange => format!("Must be between {}", s),
            NotInRange => format!("Must not be between {}", s),
            Regex => format!("Must match the following regular expression: {}", s),
            NotRegex => format!("Must not match the following regular expression: {}", s),
            IsAlpha => "Must be alphabetic".to_string(),
            IsNotAlpha => "Must not be alphabetic".to_string(),
            IsAlnum => "Must be alphanumeric".to_string(),
            IsNotAlnum => "Must not be alphanumeric".to_string(),
            IsDigit => "Must be a digit".to_string(),
            IsNotDigit => "Must not be a digit".to_string(),
            IsLower => "Must be lowercase".to_string(),
            IsNotLower => "Must not be lowercase".to_string(),
            IsUpper => "Must be uppercase".to_string(),
            IsNotUpper => "Must not be uppercase".to_string(),
            IsSpace => "Must be a space".to_string(),
            IsNotSpace => "Must not be a space".to_string(),
            IsXdigit => "Must be a hexadecimal digit".to_string(),
            IsNotXdigit => "Must not be a hexadecimal digit".to_string(),
            IsPrint => "Must be printable".to_string(),
            IsNotPrint => "Must not be printable".to_string(),
            IsGraph => "Must be visible".to_string(),
            IsNotGraph => "Must not be visible".to_string(),
        }
    }
}

fn subject(value: &DataValue) -> Result<String, String> {
    value
        .coerce_string()
        .ok_or_else(|| format!("expected a string value, {} given", value.type_name()))
}

fn string_operand(operand: &DataValue) -> Result<String, String> {
    operand
        .coerce_string()
        .ok_or_else(|| format!("expected a string operand, {} given", operand.type_name()))
}

fn int_operand(operand: &DataValue) -> Result<i64, String> {
    match operand {
        DataValue::Int(i) => Ok(*i),
        DataValue::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
        other => Err(format!("expected an integer operand, {} given", other.type_name())),
    }
}

fn affix(value: &DataValue, needle: &DataValue, mode: Affix, case: Case) -> Result<bool, String> {
    let hay = subject(value)?;
    let needle = string_operand(needle)?;
    let (hay, needle) = match case {
        Case::Sensitive => (hay, needle),
        Case::AsciiInsensitive => (hay.to_ascii_lowercase(), needle.to_ascii_lowercase()),
        Case::UnicodeInsensitive => (hay.to_lowercase(), needle.to_lowercase()),
    };
    Ok(match mode {
        Affix::Contains => hay.contains(&needle),
        Affix::Prefix => hay.starts_with(&needle),
        Affix::Suffix => hay.ends_with(&needle),
    })
}

fn length(value: &DataValue, measure: Measure) -> Result<i64, String> {
    let s = subject(value)?;
    Ok(match measure {
        Measure::Bytes => s.len() as i64,
        Measure::Chars => s.chars().count() as i64,
    })
}

fn between(len: i64, min: &DataValue, max: &DataValue) -> Result<bool, String> {
    Ok(len >= int_operand(min)? && len <= int_operand(max)?)
}

fn contains_value(haystack: &DataValue, value: &DataValue) -> Result<bool, String> {
    match haystack {
        DataValue::Array(items) => Ok(items.iter().any(|item| item.loose_eq(value))),
        DataValue::Object(map) => Ok(map.values().any(|item| item.loose_eq(value))),
        other => Err(format!("expected a list operand, {} given", other.type_name())),
    }
}

/// 编译正则；支持 `/pattern/flags` 形式的定界写法
fn compile_regex(pattern: &str) -> Result<Regex, String> {
    if let Some(cached) = REGEX_CACHE.get(pattern) {
        return Ok(cached.value().clone());
    }

    let source = match split_delimited(pattern) {
        Some((body, flags)) => {
            let mut inline = String::new();
            for flag in flags.chars() {
                match flag {
                    'i' | 'm' | 's' | 'x' | 'U' => inline.push(flag),
                    'u' | 'D' => {}
                    other => return Err(format!("unknown regex modifier '{}'", other)),
                }
            }
            if inline.is_empty() {
                body.to_string()
            } else {
                format!("(?{}){}", inline, body)
            }
        }
        None => pattern.to_string(),
    };

    let regex = Regex::new(&source).map_err(|e| e.to_string())?;
    REGEX_CACHE.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

fn split_delimited(pattern: &str) -> Option<(&str, &str)> {
    let open = pattern.chars().next()?;
    if !matches!(open, '/' | '#' | '~' | '!' | '@' | '%' | '|' | '+' | '(' | '{' | '[' | '<') {
        return None;
    }
    let close = match open {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        c => c,
    };
    let rest = &pattern[open.len_utf8()..];
    let end = rest.rfind(close)?;
    Some((&rest[..end], &rest[end + close.len_utf8()..]))
}

fn regex_match(pattern: &DataValue, value: &DataValue) -> Result<bool, String> {
    let regex = compile_regex(&string_operand(pattern)?)?;
    Ok(regex.is_match(&subject(value)?))
}

fn char_class(value: &DataValue, class: CharClass) -> bool {
    let text = match value {
        DataValue::String(s) => s.clone(),
        DataValue::Int(i) => i.to_string(),
        _ => return false,
    };
    if text.is_empty() {
        return false;
    }
    text.bytes().all(|b| match class {
        CharClass::Alpha => b.is_ascii_alphabetic(),
        CharClass::Alnum => b.is_ascii_alphanumeric(),
        CharClass::Digit => b.is_ascii_digit(),
        CharClass::Lower => b.is_ascii_lowercase(),
        CharClass::Upper => b.is_ascii_uppercase(),
        CharClass::Space => matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C),
        CharClass::Xdigit => b.is_ascii_hexdigit(),
        CharClass::Print => (0x20..=0x7E).contains(&b),
        CharClass::Graph => (0x21..=0x7E).contains(&b),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(op: With, value: impl Into<DataValue>, operands: Vec<DataValue>) -> (bool, String) {
        op.evaluate(&value.into(), &operands).unwrap()
    }

    #[test]
    fn test_tags_round_trip() {
        for op in With::ALL {
            assert_eq!(With::from_tag(op.tag()), Some(*op));
        }
        assert_eq!("min_length".parse::<With>().unwrap(), With::MinLength);
        assert!(With::from_tag("nope").is_none());
    }

    #[test]
    fn test_equality_operators() {
        assert!(eval(With::Equal, "5", vec![5.into()]).0);
        assert!(!eval(With::EqualStrict, "5", vec![5.into()]).0);
        let (ok, msg) = eval(With::Is, 4, vec![5.into()]);
        assert!(!ok);
        assert_eq!(msg, "Must be strictly equal to 5");
    }

    #[test]
    fn test_length_operators() {
        let (ok, msg) = eval(With::MinLength, "ab", vec![3.into()]);
        assert!(!ok);
        assert_eq!(msg, "Must have a minimum length of 3");
        assert!(eval(With::MbLength, "héllo", vec![5.into()]).0);
        assert!(!eval(With::Length, "héllo", vec![5.into()]).0);
        let (ok, msg) = eval(With::BetweenLength, "abcdef", vec![1.into(), 3.into()]);
        assert!(!ok);
        assert_eq!(msg, "Must have a length between [1,3]");
    }

    #[test]
    fn test_string_affixes() {
        assert!(eval(With::StartsWithCi, "Hello", vec!["he".into()]).0);
        assert!(!eval(With::StartsWith, "Hello", vec!["he".into()]).0);
        assert!(eval(With::EndsWith, "abab", vec!["ab".into()]).0);
        assert!(eval(With::MbEndsWithCi, "ÉCOLE", vec!["école".into()]).0);
        let (ok, msg) = eval(With::Contains, "hello", vec!["xyz".into()]);
        assert!(!ok);
        assert_eq!(msg, "Must contain 'xyz'");
    }

    #[test]
    fn test_membership_and_range() {
        let list = DataValue::from(json!(["red", "green"]));
        assert!(eval(With::In, "red", vec![list.clone()]).0);
        let (ok, msg) = eval(With::In, "blue", vec![list]);
        assert!(!ok);
        assert_eq!(msg, r#"Must be one of the following values: ["red","green"]"#);
        assert!(eval(With::InRange, 5, vec![1.into(), 10.into()]).0);
        assert!(eval(With::NotInRange, 11, vec![1.into(), 10.into()]).0);
    }

    #[test]
    fn test_type_and_instance() {
        assert!(eval(With::Type, 1, vec!["int".into()]).0);
        assert!(!eval(With::Type, 1.5, vec!["int".into()]).0);
        assert!(eval(With::Instance, json!({"a": 1}), vec!["array".into()]).0);
        assert!(eval(With::NotInstance, "x", vec!["int|float".into()]).0);
    }

    #[test]
    fn test_regex_and_classes() {
        assert!(eval(With::Regex, "ABC", vec!["/^[a-z]+$/i".into()]).0);
        assert!(!eval(With::Regex, "ABC1", vec!["/^[a-z]+$/i".into()]).0);
        assert!(eval(With::NotRegex, "abc", vec![r"^\d+$".into()]).0);
        assert!(eval(With::IsDigit, "0123", vec![]).0);
        assert!(!eval(With::IsDigit, "", vec![]).0);
        assert!(eval(With::IsNotUpper, "Abc", vec![]).0);
        assert!(!eval(With::IsAlpha, DataValue::Null, vec![]).0);
    }

    #[test]
    fn test_type_errors_are_reported() {
        assert!(With::Contains
            .evaluate(&DataValue::from(json!([1])), &[DataValue::from("a")])
            .is_err());
        let a = DataValue::from("a");
        assert!(With::In.evaluate(&a, &[DataValue::from("a")]).is_err());
        assert!(With::Regex.evaluate(&a, &[DataValue::from("/(/")]).is_err());
    }
}
