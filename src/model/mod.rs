//! 数据模型系统模块
//!
//! 通过声明描述模型字段（类型、默认值、可见性、过滤器链与校验链），
//! 从映射、JSON 或其他模型实例填充数据，并导出为普通数据或 JSON。

pub mod catalog;
pub mod check;
pub mod collection;
pub mod convenience;
pub mod data_model;
pub mod errors;
pub mod field_types;
pub mod filter;
pub mod function;
pub mod input;
pub mod json;
pub mod macros;
pub mod reference;
pub mod registry;
pub mod schema;
pub mod spec;
pub mod traits;
pub mod types;
pub mod with;

// 重新导出核心类型
pub use catalog::Catalog;
pub use check::{Check, CheckDef};
pub use collection::{Collection, CollectionKey};
pub use convenience::*;
pub use data_model::{DataModel, FieldValue};
pub use errors::{ErrorEntry, ErrorTree, GENERAL_ERRORS};
pub use field_types::{Access, Field, FieldDefinition};
pub use filter::{Filter, FilterDef};
pub use function::{Callable, FunctionTable, callable};
pub use input::Input;
pub use reference::SpecRef;
pub use registry::FieldRegistry;
pub use schema::{CollectionSchema, ModelSchema};
pub use spec::SpecKind;
pub use traits::Model;
pub use with::With;
