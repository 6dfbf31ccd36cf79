//! 错误类型定义
//!
//! 声明错误（注册表构建阶段）通过 `ModelError` 返回；
//! 值错误（类型不匹配、必填为空、过滤/校验失败等）不走 `Result`，
//! 统一写入 [`ErrorTree`](crate::model::errors::ErrorTree)。

use crate::model::spec::SpecKind;
use thiserror::Error;

/// 数据模型错误
#[derive(Error, Debug)]
pub enum ModelError {
    /// 字段访问修饰符非法（只允许 public / protected）
    #[error("DataPoint '{field}' can only be 'public' or 'protected'")]
    AccessModifier { field: String },

    /// extra 字段不是映射容器类型
    #[error("DataPoint '{field}' is marked as extra but is not a mapping container")]
    ExtraDataPointType { field: String },

    /// 同一模型声明了多个 extra 字段
    #[error("DataPoint '{second}' is marked as extra but '{first}' already is")]
    MultipleExtraDataPoints { first: String, second: String },

    /// 集合声明的元素类型不是数据模型
    #[error("All Collection types must be data models. Got '{type_name}'")]
    CollectionTypeMismatch { type_name: String },

    /// 引用链出现环
    #[error("Circular '{kind}' reference detected between '{caller}' <-> '{callee}'")]
    CircularReference {
        kind: SpecKind,
        caller: String,
        callee: String,
    },

    /// 引用的目标类型不是数据模型
    #[error("Invalid referenced model '{model}' in '{kind}' declaration")]
    ReferableNotDataModel { model: String, kind: SpecKind },

    /// 引用的目标字段不存在
    #[error("Invalid referenced DataPoint '{field}' in '{kind}' declaration")]
    ReferableNotDataPoint { field: String, kind: SpecKind },

    /// 过滤器/校验器目标不可调用
    #[error("{kind} '{name}' is not callable")]
    NotCallable { kind: SpecKind, name: String },

    /// 模型名与内置类型名冲突
    #[error("Model name '{type_name}' is reserved for a builtin type")]
    ReservedTypeName { type_name: String },

    /// 字段类型既不是内置类型也不是已注册的模型
    #[error("DataPoint '{field}' has an unknown type '{type_name}'")]
    UnknownFieldType { field: String, type_name: String },

    /// 未注册的模型类型
    #[error("Unknown model type '{type_name}'")]
    UnknownModel { type_name: String },

    /// JSON 编解码失败
    #[error("JSON serialization error: {message}")]
    InvalidJson { message: String },

    /// 配置错误
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO错误
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// 结果类型别名
pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    /// 是否属于声明错误（注册表构建失败）
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            ModelError::AccessModifier { .. }
                | ModelError::ExtraDataPointType { .. }
                | ModelError::MultipleExtraDataPoints { .. }
                | ModelError::CollectionTypeMismatch { .. }
                | ModelError::CircularReference { .. }
                | ModelError::ReferableNotDataModel { .. }
                | ModelError::ReferableNotDataPoint { .. }
                | ModelError::NotCallable { .. }
                | ModelError::ReservedTypeName { .. }
                | ModelError::UnknownFieldType { .. }
                | ModelError::UnknownModel { .. }
        )
    }
}

/// 便捷宏：构造常用错误
#[macro_export]
macro_rules! model_error {
    (config, $msg:expr) => {
        $crate::error::ModelError::Config {
            message: $msg.to_string(),
        }
    };
    (json, $msg:expr) => {
        $crate::error::ModelError::InvalidJson {
            message: $msg.to_string(),
        }
    };
    (unknown_model, $name:expr) => {
        $crate::error::ModelError::UnknownModel {
            type_name: $name.to_string(),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_classification() {
        let err = ModelError::AccessModifier {
            field: "secret".to_string(),
        };
        assert!(err.is_declaration());
        assert_eq!(
            err.to_string(),
            "DataPoint 'secret' can only be 'public' or 'protected'"
        );

        let err = crate::model_error!(config, "bad");
        assert!(!err.is_declaration());
        assert_eq!(err.to_string(), "Configuration error: bad");
    }

    #[test]
    fn test_circular_message() {
        let err = ModelError::CircularReference {
            kind: SpecKind::Filter,
            caller: "Book::two".to_string(),
            callee: "Book::four".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Circular 'Filter' reference detected between 'Book::two' <-> 'Book::four'"
        );
    }
}
