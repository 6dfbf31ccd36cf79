//! # 引擎配置构建器模块
//!
//! 提供引擎配置的构建器实现，支持链式调用和严格验证

use crate::config::core::EngineConfig;
use crate::error::ModelError;
use rat_logger::info;

/// 引擎配置构建器
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    auto_reindex: Option<bool>,
    clone_items: Option<bool>,
    pretty_json: Option<bool>,
}

impl EngineConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置新建集合是否自动重建索引
    ///
    /// # 参数
    ///
    /// * `auto_reindex` - 删除元素后列表集合是否重新编号
    pub fn auto_reindex(mut self, auto_reindex: bool) -> Self {
        self.auto_reindex = Some(auto_reindex);
        self
    }

    /// 设置集合添加模型实例时是否重新导入
    ///
    /// # 参数
    ///
    /// * `clone_items` - 为真时添加的实例会经过完整导入流程生成新实例
    pub fn clone_items(mut self, clone_items: bool) -> Self {
        self.clone_items = Some(clone_items);
        self
    }

    /// 设置 JSON 导出是否默认格式化
    pub fn pretty_json(mut self, pretty_json: bool) -> Self {
        self.pretty_json = Some(pretty_json);
        self
    }

    /// 构建引擎配置
    ///
    /// # 错误
    ///
    /// 如果任何必需的配置项未设置，将返回错误
    pub fn build(self) -> Result<EngineConfig, ModelError> {
        let auto_reindex = self
            .auto_reindex
            .ok_or_else(|| crate::model_error!(config, "auto_reindex must be set"))?;
        let clone_items = self
            .clone_items
            .ok_or_else(|| crate::model_error!(config, "clone_items must be set"))?;
        let pretty_json = self
            .pretty_json
            .ok_or_else(|| crate::model_error!(config, "pretty_json must be set"))?;

        info!(
            "创建引擎配置: auto_reindex={}, clone_items={}, pretty_json={}",
            auto_reindex, clone_items, pretty_json
        );

        Ok(EngineConfig {
            auto_reindex,
            clone_items,
            pretty_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_option_required() {
        let err = EngineConfigBuilder::new()
            .auto_reindex(true)
            .clone_items(false)
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: pretty_json must be set");
    }

    #[test]
    fn test_build() {
        let config = EngineConfig::builder()
            .auto_reindex(false)
            .clone_items(false)
            .pretty_json(true)
            .build()
            .unwrap();
        assert!(!config.auto_reindex);
        assert!(!config.clone_items);
        assert!(config.pretty_json);
    }
}
