//! # 配置构建器模块
//!
//! 所有配置项必须显式设置，未设置的项在 `build()` 时报错

pub mod engine_builder;

pub use engine_builder::EngineConfigBuilder;
