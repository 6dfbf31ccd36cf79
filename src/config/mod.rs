//! # 配置管理模块
//!
//! 提供引擎配置与构建器，支持链式配置和文件加载
//! 构建器要求所有配置项显式设置

pub mod builders;
pub mod core;

pub use builders::EngineConfigBuilder;
pub use core::EngineConfig;
