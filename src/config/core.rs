//! # 配置核心模块
//!
//! 定义引擎配置结构，支持从 TOML / JSON 文件加载与保存

use crate::error::{ModelError, ModelResult};
use rat_logger::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 新建集合是否默认开启自动重建索引
    pub auto_reindex: bool,
    /// 集合添加模型实例时是否默认重新导入（克隆）
    pub clone_items: bool,
    /// `to_json` 默认是否格式化输出
    pub pretty_json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_reindex: true,
            clone_items: true,
            pretty_json: false,
        }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}

impl EngineConfig {
    /// 创建配置构建器
    pub fn builder() -> super::builders::EngineConfigBuilder {
        super::builders::EngineConfigBuilder::new()
    }

    /// 从文件加载配置（`.toml` 按 TOML 解析，其余按 JSON 解析）
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> ModelResult<Self> {
        let path = config_path.as_ref();
        let content = std::fs::read_to_string(path).map_err(ModelError::Io)?;

        let config: EngineConfig = if is_toml(path) {
            toml::from_str(&content)
                .map_err(|e| crate::model_error!(config, format!("failed to parse TOML config: {}", e)))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| crate::model_error!(config, format!("failed to parse JSON config: {}", e)))?
        };

        info!("从文件加载引擎配置: {:?}", path);
        Ok(config)
    }

    /// 保存配置到文件
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径
    pub fn save_to_file<P: AsRef<Path>>(&self, config_path: P) -> ModelResult<()> {
        let path = config_path.as_ref();
        let content = if is_toml(path) {
            toml::to_string_pretty(self)
                .map_err(|e| crate::model_error!(config, format!("failed to serialize TOML config: {}", e)))?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|e| crate::model_error!(config, format!("failed to serialize JSON config: {}", e)))?
        };

        std::fs::write(path, content).map_err(ModelError::Io)?;

        info!("保存引擎配置到文件: {:?}", path);
        Ok(())
    }
}
