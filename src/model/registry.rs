//! 字段注册表
//!
//! 每个模型类型构建一次，之后只读共享：字段序号索引、名称索引、
//! extra 字段，以及每个字段展开后的过滤器链和校验链。

use crate::debug_log;
use crate::error::{ModelError, ModelResult};
use crate::model::catalog::Catalog;
use crate::model::check::Check;
use crate::model::field_types::Field;
use crate::model::filter::Filter;
use crate::model::reference::Resolver;
use crate::model::schema::ModelSchema;
use rat_logger::info;
use std::collections::HashMap;

/// 字段注册表
#[derive(Debug)]
pub struct FieldRegistry {
    type_name: String,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    extra: Option<Field>,
    filters: Vec<Vec<Filter>>,
    checks: Vec<Vec<Check>>,
}

impl FieldRegistry {
    /// 构建注册表
    ///
    /// # 参数
    /// * `catalog` - 用于解析类型、函数与引用的目录
    /// * `schema` - 模型声明
    ///
    /// # 返回值
    /// 遇到第一个声明错误即返回
    pub fn build(catalog: &Catalog, schema: &ModelSchema) -> ModelResult<Self> {
        let mut fields: Vec<Field> = Vec::new();
        let mut extra: Option<Field> = None;
        let mut filters = Vec::new();
        let mut checks = Vec::new();

        for (name, definition) in schema.fields() {
            let field = Field::from_definition(name, fields.len(), definition, catalog)?;
            if field.is_extra {
                if let Some(first) = &extra {
                    return Err(ModelError::MultipleExtraDataPoints {
                        first: first.name.clone(),
                        second: name.to_string(),
                    });
                }
                extra = Some(field);
                continue;
            }

            filters.push(Resolver::resolve_field::<Filter>(catalog, schema, name)?);
            checks.push(Resolver::resolve_field::<Check>(catalog, schema, name)?);
            debug_log!(
                "字段 {}::{} 类型 {} 过滤器 {} 校验器 {}",
                schema.name(),
                name,
                field.types_str(),
                filters.last().map(Vec::len).unwrap_or(0),
                checks.last().map(Vec::len).unwrap_or(0)
            );
            fields.push(field);
        }

        let index = fields
            .iter()
            .map(|f| (f.name.clone(), f.position))
            .collect();

        info!("构建字段注册表: {} ({} 个字段)", schema.name(), fields.len());
        Ok(Self {
            type_name: schema.name().to_string(),
            fields,
            index,
            extra,
            filters,
            checks,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// 按序号排列的字段（不含 extra 字段）
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 按名称查找字段
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&pos| &self.fields[pos])
    }

    pub fn field_at(&self, position: usize) -> Option<&Field> {
        self.fields.get(position)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// extra 字段
    pub fn extra(&self) -> Option<&Field> {
        self.extra.as_ref()
    }

    /// 字段的过滤器链
    pub fn filters(&self, position: usize) -> &[Filter] {
        self.filters.get(position).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 字段的校验链
    pub fn checks(&self, position: usize) -> &[Check] {
        self.checks.get(position).map(Vec::as_slice).unwrap_or(&[])
    }
}
