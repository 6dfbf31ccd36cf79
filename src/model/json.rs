//! JSON 编解码服务

use crate::error::ModelResult;
use crate::types::DataValue;

/// 解析 JSON 字符串
pub fn decode(text: &str) -> ModelResult<DataValue> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| crate::model_error!(json, e))?;
    Ok(DataValue::from_json_value(value))
}

/// 序列化为 JSON 字符串
///
/// # 参数
/// * `value` - 待序列化的值
/// * `pretty` - 是否格式化输出
pub fn encode(value: &DataValue, pretty: bool) -> ModelResult<String> {
    let result = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    result.map_err(|e| crate::model_error!(json, e))
}
