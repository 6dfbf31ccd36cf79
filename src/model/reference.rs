//! 过滤器/校验器引用解析
//!
//! 字段可以通过 `#field`、`Model#field` 或 `(Model, field)` 复用其他字段的过滤器链或校验链。
//! 解析时维护当前解析路径，任何回到路径上节点的引用都视为循环引用；
//! 被引用字段的解析结果按 `(种类, 模型, 字段)` 缓存，整个进程内复用。

use crate::debug_log;
use crate::error::{ModelError, ModelResult};
use crate::model::catalog::Catalog;
use crate::model::check::{Check, CheckDef};
use crate::model::field_types::FieldDefinition;
use crate::model::filter::{Filter, FilterDef};
use crate::model::schema::ModelSchema;
use crate::model::spec::SpecKind;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// 引用标记
pub const SELF_REF: char = '#';

/// 对其他字段规格链的引用
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpecRef {
    /// 同一模型内的字段
    SelfField(String),
    /// 指定模型的字段
    Field { model: String, field: String },
}

impl SpecRef {
    /// 解析 `#field` / `Model#field`；没有 `#` 时视为本模型字段名
    pub fn parse(reference: &str) -> SpecRef {
        match reference.split_once(SELF_REF) {
            Some(("", field)) => SpecRef::SelfField(field.trim().to_string()),
            Some((model, field)) => SpecRef::Field {
                model: model.trim().to_string(),
                field: field.trim().to_string(),
            },
            None => SpecRef::SelfField(reference.trim().to_string()),
        }
    }

    pub fn field(model: impl Into<String>, field: impl Into<String>) -> SpecRef {
        SpecRef::Field {
            model: model.into(),
            field: field.into(),
        }
    }

    /// 目标 `(模型, 字段)`；本模型引用使用 `owner`
    pub fn target<'a>(&'a self, owner: &'a str) -> (&'a str, &'a str) {
        match self {
            SpecRef::SelfField(field) => (owner, field),
            SpecRef::Field { model, field } => (model, field),
        }
    }
}

impl fmt::Display for SpecRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecRef::SelfField(field) => write!(f, "{}{}", SELF_REF, field),
            SpecRef::Field { model, field } => write!(f, "{}{}{}", model, SELF_REF, field),
        }
    }
}

impl From<&str> for SpecRef {
    fn from(value: &str) -> Self {
        SpecRef::parse(value)
    }
}

impl From<String> for SpecRef {
    fn from(value: String) -> Self {
        SpecRef::parse(&value)
    }
}

impl From<(&str, &str)> for SpecRef {
    fn from((model, field): (&str, &str)) -> Self {
        SpecRef::field(model, field)
    }
}

type CacheKey = (String, String);

/// 引用解析缓存
#[derive(Default)]
pub struct ReferenceCache {
    filters: DashMap<CacheKey, Arc<Vec<Filter>>>,
    checks: DashMap<CacheKey, Arc<Vec<Check>>>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 缓存条目总数
    pub fn len(&self) -> usize {
        self.filters.len() + self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, kind: SpecKind, model: &str, field: &str) -> bool {
        let key = (model.to_string(), field.to_string());
        match kind {
            SpecKind::Filter => self.filters.contains_key(&key),
            SpecKind::Check => self.checks.contains_key(&key),
        }
    }

    pub fn clear(&self) {
        self.filters.clear();
        self.checks.clear();
    }
}

/// 可被引用的规格（过滤器或校验器）
pub(crate) trait Referable: Clone + Sized {
    type Def;

    const KIND: SpecKind;

    fn definitions(field: &FieldDefinition) -> &[Self::Def];

    fn reference_of(def: &Self::Def) -> Option<&SpecRef>;

    fn build(def: &Self::Def, owner: &ModelSchema, catalog: &Catalog) -> ModelResult<Self>;

    fn cache(cache: &ReferenceCache) -> &DashMap<CacheKey, Arc<Vec<Self>>>;
}

impl Referable for Filter {
    type Def = FilterDef;

    const KIND: SpecKind = SpecKind::Filter;

    fn definitions(field: &FieldDefinition) -> &[FilterDef] {
        &field.filters
    }

    fn reference_of(def: &FilterDef) -> Option<&SpecRef> {
        def.as_reference()
    }

    fn build(def: &FilterDef, owner: &ModelSchema, catalog: &Catalog) -> ModelResult<Self> {
        Filter::build(def, owner, catalog)
    }

    fn cache(cache: &ReferenceCache) -> &DashMap<CacheKey, Arc<Vec<Filter>>> {
        &cache.filters
    }
}

impl Referable for Check {
    type Def = CheckDef;

    const KIND: SpecKind = SpecKind::Check;

    fn definitions(field: &FieldDefinition) -> &[CheckDef] {
        &field.checks
    }

    fn reference_of(def: &CheckDef) -> Option<&SpecRef> {
        def.as_reference()
    }

    fn build(def: &CheckDef, owner: &ModelSchema, catalog: &Catalog) -> ModelResult<Self> {
        Check::build(def, owner, catalog)
    }

    fn cache(cache: &ReferenceCache) -> &DashMap<CacheKey, Arc<Vec<Check>>> {
        &cache.checks
    }
}

fn node(model: &str, field: &str) -> String {
    format!("{}::{}", model, field)
}

/// 引用解析器（单个顶层字段的一次解析）
pub(crate) struct Resolver<'a> {
    catalog: &'a Catalog,
    path: Vec<String>,
}

impl<'a> Resolver<'a> {
    /// 解析字段的完整规格链（自身声明 + 展开的引用）
    pub(crate) fn resolve_field<S: Referable>(
        catalog: &'a Catalog,
        owner: &ModelSchema,
        field: &str,
    ) -> ModelResult<Vec<S>> {
        let mut resolver = Resolver {
            catalog,
            path: vec![node(owner.name(), field)],
        };
        resolver.collect::<S>(owner, field)
    }

    fn collect<S: Referable>(&mut self, owner: &ModelSchema, field: &str) -> ModelResult<Vec<S>> {
        let Some(definition) = owner.get_field(field) else {
            return Err(ModelError::ReferableNotDataPoint {
                field: field.to_string(),
                kind: S::KIND,
            });
        };

        let mut specs = Vec::new();
        for def in S::definitions(definition) {
            match S::reference_of(def) {
                Some(reference) => {
                    let resolved = self.follow::<S>(owner, field, reference)?;
                    specs.extend(resolved.iter().cloned());
                }
                None => specs.push(S::build(def, owner, self.catalog)?),
            }
        }
        Ok(specs)
    }

    fn follow<S: Referable>(
        &mut self,
        owner: &ModelSchema,
        field: &str,
        reference: &SpecRef,
    ) -> ModelResult<Arc<Vec<S>>> {
        let (model, target) = reference.target(owner.name());
        let callee = node(model, target);
        if self.path.contains(&callee) {
            return Err(ModelError::CircularReference {
                kind: S::KIND,
                caller: node(owner.name(), field),
                callee,
            });
        }

        let key = (model.to_string(), target.to_string());
        if let Some(hit) = S::cache(self.catalog.references()).get(&key) {
            debug_log!("引用缓存命中: {} {}", S::KIND, callee);
            return Ok(hit.value().clone());
        }

        let schema = self
            .catalog
            .model_schema(model)
            .ok_or_else(|| ModelError::ReferableNotDataModel {
                model: model.to_string(),
                kind: S::KIND,
            })?;
        if !schema.has_field(target) {
            return Err(ModelError::ReferableNotDataPoint {
                field: target.to_string(),
                kind: S::KIND,
            });
        }

        self.path.push(callee);
        let collected = self.collect::<S>(&schema, target);
        self.path.pop();
        let specs = Arc::new(collected?);

        debug_log!("解析引用 {} {} 得到 {} 项", S::KIND, node(model, target), specs.len());
        S::cache(self.catalog.references()).insert(key, specs.clone());
        Ok(specs)
    }
}
