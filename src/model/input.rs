//! 导入数据的输入形态
//!
//! `from_data` / `extend` 接受映射或列表、JSON 字符串、另一个模型实例，
//! 以及任何可序列化的结构体。

use crate::error::ModelResult;
use crate::model::json;
use crate::model::traits::Model;
use crate::types::{DataMap, DataValue};
use serde::Serialize;

/// 输入数据不是容器时的错误消息
pub const INVALID_INPUT: &str =
    "Received data is invalid, must be a mapping, a model instance or a JSON string";

/// 导入输入
pub enum Input<'a> {
    /// 映射或列表
    Data(DataValue),
    /// JSON 字符串
    Json(&'a str),
    /// 另一个模型或集合实例
    Model(&'a (dyn Model + 'static)),
}

impl<'a> Input<'a> {
    /// 从可序列化的值构造输入
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> ModelResult<Input<'static>> {
        let json = serde_json::to_value(value).map_err(|e| crate::model_error!(json, e))?;
        Ok(Input::Data(DataValue::from_json_value(json)))
    }

    /// 将输入解析为通用值
    ///
    /// # 返回值
    /// JSON 解析失败时返回错误消息
    pub(crate) fn into_value(self) -> Result<DataValue, String> {
        match self {
            Input::Data(value) => Ok(value),
            Input::Json(text) => json::decode(text).map_err(|e| e.to_string()),
            Input::Model(model) => Ok(model.to_data_value()),
        }
    }

    /// 将输入解析为有序映射（列表的键为下标）
    pub(crate) fn into_map(self) -> Result<DataMap, String> {
        self.into_value()?
            .into_map()
            .ok_or_else(|| INVALID_INPUT.to_string())
    }
}

impl From<DataValue> for Input<'_> {
    fn from(value: DataValue) -> Self {
        Input::Data(value)
    }
}

impl From<DataMap> for Input<'_> {
    fn from(value: DataMap) -> Self {
        Input::Data(DataValue::Object(value))
    }
}

impl From<serde_json::Value> for Input<'_> {
    fn from(value: serde_json::Value) -> Self {
        Input::Data(DataValue::from_json_value(value))
    }
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(value: &'a str) -> Self {
        Input::Json(value)
    }
}

impl<'a> From<&'a String> for Input<'a> {
    fn from(value: &'a String) -> Self {
        Input::Json(value.as_str())
    }
}

impl<'a> From<&'a (dyn Model + 'static)> for Input<'a> {
    fn from(value: &'a (dyn Model + 'static)) -> Self {
        Input::Model(value)
    }
}

impl<'a> From<&'a crate::model::data_model::DataModel> for Input<'a> {
    fn from(value: &'a crate::model::data_model::DataModel) -> Self {
        Input::Model(value)
    }
}

impl<'a> From<&'a crate::model::collection::Collection> for Input<'a> {
    fn from(value: &'a crate::model::collection::Collection) -> Self {
        Input::Model(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_shapes_into_map() {
        let map = Input::from(json!({"a": 1})).into_map().unwrap();
        assert_eq!(map.get("a"), Some(&DataValue::from(1)));

        let map = Input::from(r#"["x", "y"]"#).into_map().unwrap();
        assert_eq!(map.get("1"), Some(&DataValue::from("y")));

        let map = Input::from_serialize(&Point { x: 1, y: 2 })
            .unwrap()
            .into_map()
            .unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_invalid_shapes() {
        assert_eq!(
            Input::from(DataValue::from(3)).into_map().unwrap_err(),
            INVALID_INPUT
        );
        assert!(
            Input::from("{oops")
                .into_map()
                .unwrap_err()
                .starts_with("JSON serialization error")
        );
        assert_eq!(Input::from("42").into_map().unwrap_err(), INVALID_INPUT);
    }
}
