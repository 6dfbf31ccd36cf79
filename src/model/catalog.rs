//! 模型目录
//!
//! 保存已注册的模型/集合声明、全局函数表、引用解析缓存、
//! 各类型已构建的字段注册表以及引擎配置。
//! 进程内共享实例通过 [`Catalog::global`] 获取，测试可创建独立实例。

use crate::config::EngineConfig;
use crate::debug_log;
use crate::error::{ModelError, ModelResult};
use crate::model::collection::Collection;
use crate::model::data_model::DataModel;
use crate::model::function::{Callable, FunctionTable};
use crate::model::reference::ReferenceCache;
use crate::model::registry::FieldRegistry;
use crate::model::schema::{CollectionSchema, ModelSchema, Schema};
use crate::model::spec::SpecKind;
use crate::model::traits::Model;
use crate::model::types::{ANY_TYPE, is_any, type_name, types_from_str};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rat_logger::{info, warn};
use std::sync::Arc;

/// 全局目录
static GLOBAL_CATALOG: Lazy<Arc<Catalog>> = Lazy::new(|| Arc::new(Catalog::new()));

/// 内置类型名（不可用作模型名）
const RESERVED_TYPES: &[&str] = &[
    "integer", "boolean", "float", "string", "array", "object", "null", ANY_TYPE,
];

/// 模型目录
pub struct Catalog {
    schemas: DashMap<String, Schema>,
    functions: FunctionTable,
    references: ReferenceCache,
    registries: DashMap<String, Arc<FieldRegistry>>,
    collection_types: DashMap<String, Arc<Vec<String>>>,
    config: RwLock<EngineConfig>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("schemas", &self.schemas.len())
            .field("registries", &self.registries.len())
            .field("references", &self.references.len())
            .finish()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// 创建带内置函数和默认配置的目录
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            schemas: DashMap::new(),
            functions: FunctionTable::new(),
            references: ReferenceCache::new(),
            registries: DashMap::new(),
            collection_types: DashMap::new(),
            config: RwLock::new(config),
        }
    }

    /// 获取进程内共享目录
    pub fn global() -> Arc<Catalog> {
        GLOBAL_CATALOG.clone()
    }

    fn check_name(name: &str) -> ModelResult<()> {
        if name.trim().is_empty()
            || RESERVED_TYPES.contains(&name)
            || RESERVED_TYPES.contains(&type_name(name).as_str())
        {
            return Err(ModelError::ReservedTypeName {
                type_name: name.to_string(),
            });
        }
        Ok(())
    }

    /// 新类型可能改变其他类型字段的解析结果，因此每次注册都清空缓存
    fn insert_schema(&self, schema: Schema) {
        let name = schema.name().to_string();
        if self.schemas.insert(name.clone(), schema).is_some() {
            warn!("模型类型 '{}' 被重新注册", name);
        }
        self.reset_caches();
    }

    /// 注册模型声明
    ///
    /// # 参数
    /// * `schema` - 模型声明；同名声明会被替换
    pub fn register_model(&self, schema: ModelSchema) -> ModelResult<()> {
        Self::check_name(schema.name())?;
        info!("注册模型: {}", schema.name());
        self.insert_schema(Schema::Model(Arc::new(schema)));
        Ok(())
    }

    /// 注册集合声明
    pub fn register_collection(&self, schema: CollectionSchema) -> ModelResult<()> {
        Self::check_name(schema.name())?;
        info!("注册集合: {}", schema.name());
        self.insert_schema(Schema::Collection(Arc::new(schema)));
        Ok(())
    }

    /// 注册全局函数
    pub fn register_function(&self, name: impl Into<String>, f: Callable) {
        self.functions.register(name, f);
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn references(&self) -> &ReferenceCache {
        &self.references
    }

    pub fn model_schema(&self, name: &str) -> Option<Arc<ModelSchema>> {
        match self.schemas.get(name)?.value() {
            Schema::Model(schema) => Some(schema.clone()),
            Schema::Collection(_) => None,
        }
    }

    pub fn collection_schema(&self, name: &str) -> Option<Arc<CollectionSchema>> {
        match self.schemas.get(name)?.value() {
            Schema::Collection(schema) => Some(schema.clone()),
            Schema::Model(_) => None,
        }
    }

    /// 类型名是否为已注册的模型或集合
    pub fn is_model_type(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn is_collection_type(&self, name: &str) -> bool {
        self.collection_schema(name).is_some()
    }

    /// 已注册的类型名（排序）
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// 获取（必要时构建）模型类型的字段注册表
    pub fn registry(&self, type_name: &str) -> ModelResult<Arc<FieldRegistry>> {
        if let Some(registry) = self.registries.get(type_name) {
            return Ok(registry.value().clone());
        }

        let schema = self
            .model_schema(type_name)
            .ok_or_else(|| crate::model_error!(unknown_model, type_name))?;
        let built = Arc::new(FieldRegistry::build(self, &schema)?);

        // 并发首次构建时以先插入者为准
        let registry = self
            .registries
            .entry(type_name.to_string())
            .or_insert(built)
            .value()
            .clone();
        Ok(registry)
    }

    /// 获取（必要时解析）集合类型允许的元素类型；空列表表示任意模型
    pub fn collection_types(&self, type_name: &str) -> ModelResult<Arc<Vec<String>>> {
        if let Some(types) = self.collection_types.get(type_name) {
            return Ok(types.value().clone());
        }

        let schema = self
            .collection_schema(type_name)
            .ok_or_else(|| crate::model_error!(unknown_model, type_name))?;
        let mut types = types_from_str(schema.model_types());
        if is_any(&types) {
            types.clear();
        }
        if let Some(invalid) = types.iter().find(|t| !self.is_model_type(t)) {
            return Err(ModelError::CollectionTypeMismatch {
                type_name: invalid.clone(),
            });
        }

        debug_log!("集合 {} 元素类型: {:?}", type_name, types);
        let types = self
            .collection_types
            .entry(type_name.to_string())
            .or_insert(Arc::new(types))
            .value()
            .clone();
        Ok(types)
    }

    /// 创建已初始化的模型或集合实例
    pub fn instantiate(self: &Arc<Self>, type_name: &str) -> ModelResult<Box<dyn Model>> {
        match self.schemas.get(type_name).map(|e| e.value().clone()) {
            Some(Schema::Model(_)) => Ok(Box::new(DataModel::new(self, type_name)?)),
            Some(Schema::Collection(_)) => Ok(Box::new(Collection::new(self, type_name)?)),
            None => Err(crate::model_error!(unknown_model, type_name)),
        }
    }

    /// 解析函数名
    ///
    /// `::name` 指向声明模型自身的函数，`Model::name` 指向指定模型的函数，
    /// 其余名称在全局函数表中查找。
    pub(crate) fn resolve_callable(
        &self,
        owner: &ModelSchema,
        name: &str,
        kind: SpecKind,
    ) -> ModelResult<Callable> {
        let not_callable = || ModelError::NotCallable {
            kind,
            name: name.to_string(),
        };

        if let Some(function) = name.strip_prefix("::") {
            return owner.get_function(function).ok_or_else(not_callable);
        }
        if let Some((model, function)) = name.split_once("::") {
            let found = if model == owner.name() {
                owner.get_function(function)
            } else {
                self.model_schema(model).and_then(|s| s.get_function(function))
            };
            return found.ok_or_else(not_callable);
        }
        self.functions.get(name).ok_or_else(not_callable)
    }

    /// 当前配置
    pub fn config(&self) -> EngineConfig {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: EngineConfig) {
        *self.config.write() = config;
    }

    /// 清空已构建的注册表、集合类型与引用缓存
    pub fn reset_caches(&self) {
        self.registries.clear();
        self.collection_types.clear();
        self.references.clear();
    }
}
