//! 通用数据类型定义
//!
//! 定义模型字段、过滤器参数和导出结果共用的动态值类型

pub mod data_value;

pub use data_value::{DataMap, DataValue};
