//! 模型能力接口
//!
//! 数据模型与集合都实现 [`Model`]，嵌套字段和集合元素只依赖该接口。

use crate::error::ModelResult;
use crate::model::errors::ErrorTree;
use crate::model::input::Input;
use crate::model::json;
use crate::types::DataValue;
use rat_logger::error;
use std::any::Any;
use std::fmt;

/// 模型能力接口
pub trait Model: fmt::Debug + Send + Sync {
    /// 模型类型名
    fn type_name(&self) -> &str;

    /// 是否已初始化（注册表已加载）
    fn is_initialized(&self) -> bool;

    /// 初始化；声明错误时返回 `Err`
    fn initialize(&mut self) -> ModelResult<()>;

    /// 初始化；失败时记录日志并返回 `false`
    fn try_initialize(&mut self) -> bool {
        match self.initialize() {
            Ok(()) => true,
            Err(e) => {
                error!("初始化模型 '{}' 失败: {}", self.type_name(), e);
                false
            }
        }
    }

    /// 重置后导入数据
    fn from_data(&mut self, data: Input<'_>, errors: &mut ErrorTree) -> bool;

    /// 在当前状态上导入数据
    fn extend(&mut self, data: Input<'_>, errors: &mut ErrorTree) -> bool;

    /// 恢复默认状态
    fn revert_all(&mut self);

    /// 校验当前状态
    fn validate(&self, errors: &mut ErrorTree) -> bool;

    /// 导出为通用值
    fn to_data_value(&self) -> DataValue;

    /// 导出为 JSON 字符串
    fn to_json(&self, pretty: bool) -> ModelResult<String> {
        json::encode(&self.to_data_value(), pretty)
    }

    /// 结构描述；`seen` 为当前描述路径上的类型名，用于发现循环嵌套
    fn describe_with(&self, seen: &mut Vec<String>) -> DataValue;

    /// 结构描述
    fn describe(&self) -> DataValue {
        self.describe_with(&mut Vec::new())
    }

    fn clone_model(&self) -> Box<dyn Model>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl Clone for Box<dyn Model> {
    fn clone(&self) -> Self {
        self.clone_model()
    }
}

impl dyn Model {
    /// 向下转型为具体模型类型
    pub fn downcast_ref<T: Model + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Model + 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}
