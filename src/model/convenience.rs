//! 字段声明便捷函数
//!
//! 提供创建常用字段声明的便捷函数，返回的 [`FieldDefinition`] 可继续链式配置

use crate::model::field_types::FieldDefinition;
use crate::model::types::ANY_TYPE;

/// 便捷函数：创建字符串字段
pub fn string_field() -> FieldDefinition {
    FieldDefinition::new("string")
}

/// 便捷函数：创建整数字段
pub fn integer_field() -> FieldDefinition {
    FieldDefinition::new("integer")
}

/// 便捷函数：创建浮点数字段
pub fn float_field() -> FieldDefinition {
    FieldDefinition::new("float")
}

/// 便捷函数：创建布尔字段
pub fn boolean_field() -> FieldDefinition {
    FieldDefinition::new("boolean")
}

/// 便捷函数：创建数组字段（同时接受映射）
pub fn array_field() -> FieldDefinition {
    FieldDefinition::new("array")
}

/// 便捷函数：创建映射字段
pub fn object_field() -> FieldDefinition {
    FieldDefinition::new("object")
}

/// 便捷函数：创建任意类型字段（总是可空）
pub fn any_field() -> FieldDefinition {
    FieldDefinition::new(ANY_TYPE)
}

/// 便捷函数：创建嵌套模型或集合字段
///
/// # 参数
/// * `type_name` - 已注册的模型或集合类型名，`?` 前缀表示可空
pub fn model_field(type_name: &str) -> FieldDefinition {
    FieldDefinition::new(type_name)
}

/// 便捷函数：创建 extra 字段，收集未声明的键
pub fn extra_field() -> FieldDefinition {
    FieldDefinition::new("object").extra()
}
