//! rat_quickdm - 声明式数据模型引擎
//!
//! 根据字段声明（类型、可空、默认值、嵌套模型、集合）从无类型输入填充模型，
//! 执行类型与可见性约束、有序的过滤器链和校验链，并导出为普通数据或 JSON。

pub mod config;
pub mod error;
pub mod model;
pub mod types;

// 重新导出常用类型
pub use config::{EngineConfig, EngineConfigBuilder};
pub use error::{ModelError, ModelResult};
pub use model::{
    Access, Catalog, Collection, CollectionKey, CollectionSchema, DataModel, ErrorTree,
    FieldDefinition, FilterDef, CheckDef, Input, Model, ModelSchema, SpecRef, With, callable,
    any_field, array_field, boolean_field, extra_field, float_field, integer_field, model_field,
    object_field, string_field,
};
pub use types::{DataMap, DataValue};

/// 常用导入
pub mod prelude {
    pub use crate::error::{ModelError, ModelResult};
    pub use crate::model::*;
    pub use crate::types::{DataMap, DataValue};
}

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        // 在 release 模式下不输出调试信息
    };
}

/// 初始化 rat_quickdm 库
///
/// 预先创建全局目录（含内置函数表）。
///
/// 注意：日志系统由调用者自行初始化，本库不会初始化日志
pub fn init() {
    let catalog = model::Catalog::global();
    rat_logger::info!(
        "{} 已初始化，内置函数 {} 个",
        get_info(),
        catalog.functions().names().len()
    );
}

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
