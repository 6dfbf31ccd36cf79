//! 值错误树
//!
//! 导入、赋值和校验过程中的错误不会中断流程，而是按字段名汇总到 `ErrorTree`。
//! 嵌套模型的错误以子树形式挂在对应字段下。

use crate::types::{DataMap, DataValue};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// 通用错误键（不属于任何字段的错误）
pub const GENERAL_ERRORS: &str = "errors";

/// 错误条目：消息或嵌套子树
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorEntry {
    Message(String),
    Nested(ErrorTree),
}

impl ErrorEntry {
    pub fn as_message(&self) -> Option<&str> {
        match self {
            ErrorEntry::Message(m) => Some(m),
            ErrorEntry::Nested(_) => None,
        }
    }

    pub fn as_nested(&self) -> Option<&ErrorTree> {
        match self {
            ErrorEntry::Nested(tree) => Some(tree),
            ErrorEntry::Message(_) => None,
        }
    }

    fn to_data_value(&self) -> DataValue {
        match self {
            ErrorEntry::Message(m) => DataValue::String(m.clone()),
            ErrorEntry::Nested(tree) => tree.to_data_value(),
        }
    }
}

/// 字段名 → 错误列表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorTree {
    entries: IndexMap<String, Vec<ErrorEntry>>,
}

impl ErrorTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条消息
    pub fn append(&mut self, of: impl Into<String>, message: impl Into<String>) {
        self.entries
            .entry(of.into())
            .or_default()
            .push(ErrorEntry::Message(message.into()));
    }

    /// 追加一条通用错误
    pub fn append_general(&mut self, message: impl Into<String>) {
        self.append(GENERAL_ERRORS, message);
    }

    /// 挂载嵌套错误子树；空子树忽略
    pub fn append_nested(&mut self, of: impl Into<String>, tree: ErrorTree) {
        if tree.is_empty() {
            return;
        }
        self.entries
            .entry(of.into())
            .or_default()
            .push(ErrorEntry::Nested(tree));
    }

    /// 合并另一棵树（同名字段的条目追加到末尾）
    pub fn merge(&mut self, other: ErrorTree) {
        for (of, entries) in other.entries {
            self.entries.entry(of).or_default().extend(entries);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 有错误的字段数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, of: &str) -> bool {
        self.entries.contains_key(of)
    }

    /// 字段的全部条目
    pub fn get(&self, of: &str) -> Option<&[ErrorEntry]> {
        self.entries.get(of).map(Vec::as_slice)
    }

    /// 字段的消息条目（忽略子树）
    pub fn messages(&self, of: &str) -> Vec<&str> {
        self.get(of)
            .map(|entries| entries.iter().filter_map(ErrorEntry::as_message).collect())
            .unwrap_or_default()
    }

    /// 字段的第一个嵌套子树
    pub fn nested(&self, of: &str) -> Option<&ErrorTree> {
        self.get(of)?.iter().find_map(ErrorEntry::as_nested)
    }

    /// 有错误的字段名（按首次出现顺序）
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ErrorEntry])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// 转换为通用值：`{字段: [消息 | 子树, ...]}`
    pub fn to_data_value(&self) -> DataValue {
        let map: DataMap = self
            .entries
            .iter()
            .map(|(of, entries)| {
                (
                    of.clone(),
                    DataValue::Array(entries.iter().map(ErrorEntry::to_data_value).collect()),
                )
            })
            .collect();
        DataValue::Object(map)
    }
}

impl Serialize for ErrorEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ErrorEntry::Message(m) => serializer.serialize_str(m),
            ErrorEntry::Nested(tree) => tree.serialize(serializer),
        }
    }
}

impl Serialize for ErrorTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (of, entries) in &self.entries {
            map.serialize_entry(of, entries)?;
        }
        map.end()
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_data_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_query() {
        let mut errors = ErrorTree::new();
        errors.append("name", "Must not be empty");
        errors.append("name", "Must be alphabetic");
        errors.append_general("Could not initialize - declaration errors");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.messages("name"), vec!["Must not be empty", "Must be alphabetic"]);
        assert!(errors.contains(GENERAL_ERRORS));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name", "errors"]);
    }

    #[test]
    fn test_nested_subtree() {
        let mut inner = ErrorTree::new();
        inner.append("year", "Must be greater than 1900");
        let mut errors = ErrorTree::new();
        errors.append_nested("car", inner.clone());
        errors.append_nested("empty", ErrorTree::new());

        assert_eq!(errors.nested("car"), Some(&inner));
        assert!(!errors.contains("empty"));
        assert_eq!(
            serde_json::to_string(&errors).unwrap(),
            r#"{"car":[{"year":["Must be greater than 1900"]}]}"#
        );
    }

    #[test]
    fn test_merge_keeps_order() {
        let mut a = ErrorTree::new();
        a.append("x", "one");
        let mut b = ErrorTree::new();
        b.append("y", "two");
        b.append("x", "three");
        a.merge(b);
        assert_eq!(a.messages("x"), vec!["one", "three"]);
        assert_eq!(a.to_string(), r#"{"x":["one","three"],"y":["two"]}"#);
    }
}
