//! 字段类型定义
//!
//! [`FieldDefinition`] 是声明阶段的字段描述（构建器风格），
//! [`Field`] 是注册表中解析后的不可变字段记录。

use crate::error::{ModelError, ModelResult};
use crate::model::catalog::Catalog;
use crate::model::check::CheckDef;
use crate::model::filter::FilterDef;
use crate::model::types::{ANY_TYPE, is_any, types_from_str, value_matches_any};
use crate::types::DataValue;

/// 规范化后的内置标量/容器类型
const BUILTIN_TYPES: &[&str] = &["boolean", "integer", "float", "string", "array", "object"];

/// 字段可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// 默认导出
    Public,
    /// 默认不导出
    Protected,
    /// 不允许声明为字段
    Private,
}

/// 字段声明
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// 类型表达式，如 `"int|string"`、`"?Car"`
    pub types: String,
    /// 是否允许为空
    pub nullable: bool,
    /// 默认值
    pub default: DataValue,
    /// 是否必填（值不能为 null）
    pub required: bool,
    /// 是否导出，未设置时由可见性决定
    pub export: Option<bool>,
    /// 是否允许导入，未设置时为允许
    pub import: Option<bool>,
    /// 是否为 extra 字段（收集未声明的键）
    pub extra: bool,
    /// 可见性
    pub access: Access,
    /// 过滤器声明（按顺序执行）
    pub filters: Vec<FilterDef>,
    /// 校验器声明
    pub checks: Vec<CheckDef>,
    /// 字段描述
    pub description: Option<String>,
}

impl FieldDefinition {
    /// 创建字段声明
    ///
    /// # 参数
    /// * `types` - 类型表达式，`?` 前缀表示可空，空字符串表示任意类型
    pub fn new(types: impl Into<String>) -> Self {
        Self {
            types: types.into(),
            nullable: false,
            default: DataValue::Null,
            required: false,
            export: None,
            import: None,
            extra: false,
            access: Access::Public,
            filters: Vec::new(),
            checks: Vec::new(),
            description: None,
        }
    }

    /// 允许为空
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// 设置默认值
    pub fn default_value(mut self, value: impl Into<DataValue>) -> Self {
        self.default = value.into();
        self
    }

    /// 设置为必填
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn export(mut self, export: bool) -> Self {
        self.export = Some(export);
        self
    }

    pub fn import(mut self, import: bool) -> Self {
        self.import = Some(import);
        self
    }

    /// 标记为 extra 字段
    pub fn extra(mut self) -> Self {
        self.extra = true;
        self
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// 追加过滤器
    pub fn filter(mut self, filter: FilterDef) -> Self {
        self.filters.push(filter);
        self
    }

    /// 追加校验器
    pub fn check(mut self, check: CheckDef) -> Self {
        self.checks.push(check);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// 注册表中的字段
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// 字段序号（extra 字段不占序号）
    pub position: usize,
    /// 规范化后的类型列表；`["any"]` 表示任意类型
    pub types: Vec<String>,
    pub nullable: bool,
    pub default: DataValue,
    pub required: bool,
    /// 类型为已注册的模型或集合
    pub is_data_model: bool,
    pub is_extra: bool,
    pub visible: bool,
    pub export: bool,
    pub import: bool,
}

impl Field {
    /// 从声明解析字段
    pub(crate) fn from_definition(
        name: &str,
        position: usize,
        def: &FieldDefinition,
        catalog: &Catalog,
    ) -> ModelResult<Field> {
        if def.access == Access::Private {
            return Err(ModelError::AccessModifier {
                field: name.to_string(),
            });
        }

        let expr = def.types.trim();
        let mut nullable = def.nullable;
        let expr = match expr.strip_prefix('?') {
            Some(rest) => {
                nullable = true;
                rest
            }
            None => expr,
        };

        let mut types = types_from_str(expr);
        if types.iter().any(|t| t == "null") {
            nullable = true;
            types.retain(|t| t != "null");
        }

        let mut is_data_model = false;
        if is_any(&types) {
            types = vec![ANY_TYPE.to_string()];
            nullable = true;
        } else if let Some(model) = types.iter().find(|t| catalog.is_model_type(t)) {
            types = vec![model.clone()];
            is_data_model = true;
        } else if let Some(unknown) = types.iter().find(|t| !BUILTIN_TYPES.contains(&t.as_str())) {
            return Err(ModelError::UnknownFieldType {
                field: name.to_string(),
                type_name: unknown.clone(),
            });
        }

        let field = Field {
            name: name.to_string(),
            position,
            types,
            nullable,
            default: def.default.clone(),
            required: def.required,
            is_data_model,
            is_extra: def.extra,
            visible: def.access == Access::Public,
            export: def.export.unwrap_or(def.access == Access::Public),
            import: def.import.unwrap_or(true),
        };

        if field.is_extra && !(field.has_type("array") || field.has_type("object")) {
            return Err(ModelError::ExtraDataPointType {
                field: name.to_string(),
            });
        }

        Ok(field)
    }

    /// 声明类型中是否包含指定类型
    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.iter().any(|t| t == type_name)
    }

    /// 值的类型是否被允许
    pub fn is_type_allowed(&self, value: &DataValue) -> bool {
        if value.is_null() {
            return self.nullable;
        }
        value_matches_any(&self.types, value)
    }

    /// 嵌套模型类型名
    pub fn model_type(&self) -> Option<&str> {
        if self.is_data_model {
            self.types.first().map(String::as_str)
        } else {
            None
        }
    }

    /// 类型列表渲染（`|` 连接）
    pub fn types_str(&self) -> String {
        self.types.join("|")
    }

    /// 描述中的标志：required、export、import、extra
    pub fn flags(&self) -> String {
        let mut flags = Vec::new();
        if self.required {
            flags.push("required");
        }
        if self.export {
            flags.push("export");
        }
        if self.import {
            flags.push("import");
        }
        if self.is_extra {
            flags.push("extra");
        }
        flags.join(",")
    }
}
