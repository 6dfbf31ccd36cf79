use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

mod compare;

/// 有序的字符串键映射
pub type DataMap = IndexMap<String, DataValue>;

/// 通用数据值类型 - 模型字段、过滤器参数与导出结果共用的动态值
#[derive(Clone, PartialEq)]
pub enum DataValue {
    /// 空值
    Null,
    /// 布尔值
    Bool(bool),
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    String(String),
    /// 有序列表
    Array(Vec<DataValue>),
    /// 有序映射（键保持插入顺序）
    Object(DataMap),
}

impl std::fmt::Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataValue::Null => write!(f, "null"),
            DataValue::Bool(b) => write!(f, "{}", b),
            DataValue::Int(i) => write!(f, "{}", i),
            DataValue::Float(fl) => write!(f, "{}", fl),
            DataValue::String(s) => write!(f, "{}", s),
            DataValue::Array(_) | DataValue::Object(_) => {
                let json_str = serde_json::to_string(&self.to_json_value()).unwrap_or_default();
                write!(f, "{}", json_str)
            }
        }
    }
}

impl std::fmt::Debug for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 与 Display 保持一致，字符串额外加引号以便区分 "1" 与 1
        match self {
            DataValue::String(s) => write!(f, "{:?}", s),
            _ => write!(f, "{}", self),
        }
    }
}

impl DataValue {
    /// 获取数据类型名称（规范名）
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::Null => "null",
            DataValue::Bool(_) => "boolean",
            DataValue::Int(_) => "integer",
            DataValue::Float(_) => "float",
            DataValue::String(_) => "string",
            DataValue::Array(_) => "array",
            DataValue::Object(_) => "object",
        }
    }

    /// 判断是否为空值
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// 是否为容器（列表或映射）
    pub fn is_container(&self) -> bool {
        matches!(self, DataValue::Array(_) | DataValue::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DataValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Int(i) => Some(*i as f64),
            DataValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<DataValue>> {
        match self {
            DataValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&DataMap> {
        match self {
            DataValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// 按键读取映射中的值
    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// 将容器统一转换为有序映射；列表的键为下标字符串
    ///
    /// # 返回值
    /// 非容器值返回 `None`
    pub fn into_map(self) -> Option<DataMap> {
        match self {
            DataValue::Object(map) => Some(map),
            DataValue::Array(items) => Some(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// 转换为 JSON 值
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            DataValue::Null => serde_json::Value::Null,
            DataValue::Bool(b) => serde_json::Value::Bool(*b),
            DataValue::Int(i) => serde_json::Value::Number(serde_json::Number::from(*i)),
            DataValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            DataValue::String(s) => serde_json::Value::String(s.clone()),
            DataValue::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(|item| item.to_json_value()).collect())
            }
            DataValue::Object(obj) => {
                let json_object: serde_json::Map<String, serde_json::Value> = obj
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect();
                serde_json::Value::Object(json_object)
            }
        }
    }

    /// 从 JSON 值解析
    pub fn from_json_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => DataValue::Null,
            serde_json::Value::Bool(b) => DataValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DataValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    DataValue::Float(f)
                } else {
                    DataValue::Null
                }
            }
            serde_json::Value::String(s) => DataValue::String(s),
            serde_json::Value::Array(arr) => {
                DataValue::Array(arr.into_iter().map(DataValue::from_json_value).collect())
            }
            serde_json::Value::Object(obj) => DataValue::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, DataValue::from_json_value(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for DataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DataValue::Null => serializer.serialize_unit(),
            DataValue::Bool(b) => serializer.serialize_bool(*b),
            DataValue::Int(i) => serializer.serialize_i64(*i),
            DataValue::Float(f) => serializer.serialize_f64(*f),
            DataValue::String(s) => serializer.serialize_str(s),
            DataValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DataValue::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for DataValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(DataValue::from_json_value(value))
    }
}

impl Default for DataValue {
    fn default() -> Self {
        DataValue::Null
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Int(value as i64)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int(value)
    }
}

impl From<u32> for DataValue {
    fn from(value: u32) -> Self {
        DataValue::Int(value as i64)
    }
}

impl From<usize> for DataValue {
    fn from(value: usize) -> Self {
        DataValue::Int(value as i64)
    }
}

impl From<f32> for DataValue {
    fn from(value: f32) -> Self {
        DataValue::Float(value as f64)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::String(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.to_string())
    }
}

impl From<&String> for DataValue {
    fn from(value: &String) -> Self {
        DataValue::String(value.clone())
    }
}

impl<T: Into<DataValue>> From<Vec<T>> for DataValue {
    fn from(value: Vec<T>) -> Self {
        DataValue::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DataValue::Null,
        }
    }
}

impl From<DataMap> for DataValue {
    fn from(value: DataMap) -> Self {
        DataValue::Object(value)
    }
}

impl From<serde_json::Value> for DataValue {
    fn from(value: serde_json::Value) -> Self {
        DataValue::from_json_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_names() {
        assert_eq!(DataValue::Null.type_name(), "null");
        assert_eq!(DataValue::from(1).type_name(), "integer");
        assert_eq!(DataValue::from(1.5).type_name(), "float");
        assert_eq!(DataValue::from("a").type_name(), "string");
        assert_eq!(DataValue::from(json!([1])).type_name(), "array");
        assert_eq!(DataValue::from(json!({"a": 1})).type_name(), "object");
    }

    #[test]
    fn test_object_keeps_insertion_order() {
        let value = DataValue::from(json!({"zeta": 1, "alpha": 2, "mid": 3}));
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(value.to_string(), r#"{"zeta":1,"alpha":2,"mid":3}"#);
    }

    #[test]
    fn test_list_into_map_uses_indices() {
        let map = DataValue::from(json!(["a", "b"])).into_map().unwrap();
        assert_eq!(map.get("1"), Some(&DataValue::from("b")));
        assert!(DataValue::from(3).into_map().is_none());
    }

    #[test]
    fn test_serde_is_untagged() {
        let value = DataValue::from(json!({"n": null, "list": [1, 2.5, "x"]}));
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"n":null,"list":[1,2.5,"x"]}"#);
        let back: DataValue = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }
}
