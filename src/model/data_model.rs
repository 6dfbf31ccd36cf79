//! 数据模型实例
//!
//! 每个实例持有类型的共享字段注册表和按字段序号排列的当前值。
//! 赋值经过完整流水线：extra 转交、导入权限、过滤器链、必填检查、
//! 嵌套模型构建、类型检查、校验链，全部通过后才写入字段。

use crate::error::{ModelError, ModelResult};
use crate::model::catalog::Catalog;
use crate::model::check::apply_checks;
use crate::model::collection::Collection;
use crate::model::errors::ErrorTree;
use crate::model::field_types::Field;
use crate::model::filter::apply_filters;
use crate::model::input::Input;
use crate::model::registry::FieldRegistry;
use crate::model::traits::Model;
use crate::types::{DataMap, DataValue};
use rat_logger::{error, warn};
use std::any::Any;
use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

/// 必填字段为空
pub const REQUIRED_NULL: &str = "Required DataPoint cannot be null";

/// 嵌套字段收到无法构建模型的值
pub const NESTED_INVALID: &str =
    "Value for nested DataPoint must be a mapping, a model instance or a JSON string";

/// 初始化失败（声明错误）
pub const INIT_FAILED: &str = "Could not initialize - declaration errors";

/// 描述中的循环嵌套标记
pub const CIRCULAR_REFERENCE: &str = "Circular reference";

/// 描述中无法实例化嵌套类型的标记
pub const CANNOT_DESCRIBE: &str = "Cannot describe";

thread_local! {
    /// 当前线程正在构建嵌套默认值的类型链
    static BUILDING_DEFAULTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// 在类型链上登记一个类型，离开作用域时移除
struct DefaultChainGuard;

impl DefaultChainGuard {
    /// 类型已在链上时返回 `None`
    fn enter(type_name: &str) -> Option<Self> {
        BUILDING_DEFAULTS.with(|chain| {
            let mut chain = chain.borrow_mut();
            if chain.iter().any(|t| t == type_name) {
                None
            } else {
                chain.push(type_name.to_string());
                Some(DefaultChainGuard)
            }
        })
    }
}

impl Drop for DefaultChainGuard {
    fn drop(&mut self) {
        BUILDING_DEFAULTS.with(|chain| {
            chain.borrow_mut().pop();
        });
    }
}

/// 字段当前值
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// 普通值
    Data(DataValue),
    /// 嵌套模型或集合（未设置为 `None`）
    Nested(Option<Box<dyn Model>>),
}

impl FieldValue {
    pub fn as_data(&self) -> Option<&DataValue> {
        match self {
            FieldValue::Data(value) => Some(value),
            FieldValue::Nested(_) => None,
        }
    }

    pub fn as_model(&self) -> Option<&(dyn Model + 'static)> {
        match self {
            FieldValue::Nested(Some(model)) => Some(model.as_ref()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Data(DataValue::Null) | FieldValue::Nested(None))
    }

    /// 导出为通用值；嵌套模型递归导出
    pub fn to_data_value(&self) -> DataValue {
        match self {
            FieldValue::Data(value) => value.clone(),
            FieldValue::Nested(Some(model)) => model.to_data_value(),
            FieldValue::Nested(None) => DataValue::Null,
        }
    }
}

/// 数据模型实例
#[derive(Clone)]
pub struct DataModel {
    catalog: Arc<Catalog>,
    type_name: String,
    registry: Option<Arc<FieldRegistry>>,
    values: Vec<FieldValue>,
    extra: DataMap,
}

impl fmt::Debug for DataModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(&self.type_name);
        if let Some(registry) = &self.registry {
            for field in registry.fields() {
                out.field(&field.name, &self.values[field.position]);
            }
            if let Some(extra) = registry.extra() {
                out.field(&extra.name, &self.extra);
            }
        }
        out.finish()
    }
}

impl DataModel {
    /// 声明未初始化的实例；首次修改时自动初始化
    pub fn declare(catalog: &Arc<Catalog>, type_name: impl Into<String>) -> Self {
        Self {
            catalog: catalog.clone(),
            type_name: type_name.into(),
            registry: None,
            values: Vec::new(),
            extra: DataMap::new(),
        }
    }

    /// 创建并初始化实例
    ///
    /// # 参数
    /// * `catalog` - 已注册该类型的目录
    /// * `type_name` - 模型类型名
    ///
    /// # 返回值
    /// 类型未注册或声明错误时返回 `Err`
    pub fn new(catalog: &Arc<Catalog>, type_name: &str) -> ModelResult<Self> {
        let mut model = Self::declare(catalog, type_name);
        model.initialize()?;
        Ok(model)
    }

    /// 创建实例并导入数据
    pub fn with_data<'a>(
        catalog: &Arc<Catalog>,
        type_name: &str,
        data: impl Into<Input<'a>>,
        errors: &mut ErrorTree,
    ) -> ModelResult<Self> {
        let mut model = Self::new(catalog, type_name)?;
        model.from_data(data, errors);
        Ok(model)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn registry(&self) -> Option<&Arc<FieldRegistry>> {
        self.registry.as_ref()
    }

    /// 已初始化时借用自身，否则初始化一个副本
    fn view(&self) -> Option<Cow<'_, DataModel>> {
        if self.registry.is_some() {
            return Some(Cow::Borrowed(self));
        }
        let mut copy = self.clone();
        if copy.try_initialize() {
            Some(Cow::Owned(copy))
        } else {
            None
        }
    }

    /// 已初始化的注册表，或从目录获取
    fn resolved_registry(&self) -> Option<Arc<FieldRegistry>> {
        match &self.registry {
            Some(registry) => Some(registry.clone()),
            None => self.catalog.registry(&self.type_name).ok(),
        }
    }

    fn ensure_initialized(&mut self, errors: &mut ErrorTree) -> bool {
        if self.registry.is_some() {
            return true;
        }
        match self.initialize() {
            Ok(()) => true,
            Err(e) => {
                error!("初始化模型 '{}' 失败: {}", self.type_name, e);
                errors.append_general(INIT_FAILED);
                false
            }
        }
    }

    /// 字段默认值；嵌套字段的容器默认值构建为嵌套实例
    ///
    /// 默认值链回到正在构建的类型时，该层嵌套留空
    fn default_for(&self, field: &Field) -> FieldValue {
        if !field.is_data_model {
            return FieldValue::Data(field.default.clone());
        }
        let Some(type_name) = field.model_type() else {
            return FieldValue::Nested(None);
        };
        if !(field.default.is_container() || matches!(field.default, DataValue::String(_))) {
            return FieldValue::Nested(None);
        }
        let Some(_guard) = DefaultChainGuard::enter(type_name) else {
            warn!("字段 '{}' 的默认值循环嵌套类型 '{}'，置为空", field.name, type_name);
            return FieldValue::Nested(None);
        };

        let mut errors = ErrorTree::new();
        let built = self.catalog.instantiate(type_name).map(|mut nested| {
            let ok = nested.from_data(item_input(&field.default), &mut errors);
            (nested, ok)
        });
        match built {
            Ok((nested, true)) => FieldValue::Nested(Some(nested)),
            Ok((_, false)) => {
                warn!("字段 '{}' 的默认值无法导入: {}", field.name, errors);
                FieldValue::Nested(None)
            }
            Err(e) => {
                warn!("字段 '{}' 的默认值无法构建: {}", field.name, e);
                FieldValue::Nested(None)
            }
        }
    }

    fn default_extra(registry: &FieldRegistry) -> DataMap {
        registry
            .extra()
            .and_then(|f| f.default.clone().into_map())
            .unwrap_or_default()
    }

    /// 未声明的键转交 extra 字段
    fn save_extra(&mut self, registry: &FieldRegistry, key: &str, value: DataValue, import: bool) -> bool {
        match registry.extra() {
            Some(extra) if !import || extra.import => {
                self.extra.insert(key.to_string(), value);
                true
            }
            _ => false,
        }
    }

    /// 给字段赋值
    ///
    /// # 参数
    /// * `name` - 字段名；未声明的名称转交 extra 字段
    /// * `value` - 新值
    /// * `errors` - 错误输出
    /// * `import` - 是否为导入模式（遵守 import 标志并执行校验链）
    ///
    /// # 返回值
    /// 值被接受（或按导入规则被忽略）时返回 `true`
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<DataValue>,
        errors: &mut ErrorTree,
        import: bool,
    ) -> bool {
        if !self.ensure_initialized(errors) {
            return false;
        }
        let Some(registry) = self.registry.clone() else {
            return false;
        };
        let value = value.into();

        let Some(field) = registry.field(name) else {
            if self.save_extra(&registry, name, value, import) {
                return true;
            }
            errors.append_general(format!("DataPoint '{}' does not exist", name));
            return false;
        };

        if import && !field.import {
            return true;
        }

        let value = match apply_filters(value, registry.filters(field.position)) {
            Ok(value) => value,
            Err(message) => {
                errors.append(name, message);
                return false;
            }
        };

        if field.required && value.is_null() {
            errors.append(name, REQUIRED_NULL);
            return false;
        }

        if field.is_data_model {
            return self.set_nested(field, value, errors);
        }

        if !field.is_type_allowed(&value) {
            errors.append(
                name,
                format!(
                    "Value for DataPoint '{}' must be of type '{}' -> Got '{}'",
                    name,
                    field.types_str(),
                    value.type_name()
                ),
            );
            return false;
        }

        if import && !apply_checks(name, &value, registry.checks(field.position), errors) {
            return false;
        }

        self.values[field.position] = FieldValue::Data(value);
        true
    }

    /// 非导入模式赋值（忽略 import 标志，不执行校验链）
    pub fn set_direct(&mut self, name: &str, value: impl Into<DataValue>, errors: &mut ErrorTree) -> bool {
        self.set(name, value, errors, false)
    }

    /// 用另一个模型实例的导出数据赋值
    pub fn set_model(&mut self, name: &str, model: &dyn Model, errors: &mut ErrorTree, import: bool) -> bool {
        self.set(name, model.to_data_value(), errors, import)
    }

    fn set_nested(&mut self, field: &Field, value: DataValue, errors: &mut ErrorTree) -> bool {
        if value.is_null() {
            if field.nullable {
                self.values[field.position] = FieldValue::Nested(None);
                return true;
            }
            errors.append(&field.name, NESTED_INVALID);
            return false;
        }
        if !(value.is_container() || matches!(value, DataValue::String(_))) {
            errors.append(&field.name, NESTED_INVALID);
            return false;
        }
        let Some(type_name) = field.model_type() else {
            errors.append(&field.name, NESTED_INVALID);
            return false;
        };

        let mut nested = match self.catalog.instantiate(type_name) {
            Ok(nested) => nested,
            Err(e) => {
                error!("嵌套字段 '{}' 无法实例化 '{}': {}", field.name, type_name, e);
                errors.append(&field.name, format!("Could not build nested DataPoint: {}", e));
                return false;
            }
        };

        let mut nested_errors = ErrorTree::new();
        if !nested.from_data(item_input(&value), &mut nested_errors) {
            if nested_errors.is_empty() {
                errors.append(&field.name, NESTED_INVALID);
            } else {
                errors.append_nested(&field.name, nested_errors);
            }
            return false;
        }

        self.values[field.position] = FieldValue::Nested(Some(nested));
        true
    }

    /// 读取字段值
    ///
    /// # 参数
    /// * `name` - 字段名（可以是 extra 字段名）
    /// * `export` - 为真时不可导出的字段返回 `None`
    pub fn get(&self, name: &str, export: bool) -> Option<DataValue> {
        let view = self.view()?;
        let registry = view.registry.as_ref()?;
        if let Some(field) = registry.field(name) {
            if export && !field.export {
                return None;
            }
            return Some(view.values[field.position].to_data_value());
        }
        match registry.extra() {
            Some(extra) if extra.name == name && (!export || extra.export) => {
                Some(DataValue::Object(view.extra.clone()))
            }
            _ => None,
        }
    }

    /// 读取字段的原始值（含嵌套实例）
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        let registry = self.registry.as_ref()?;
        registry
            .field(name)
            .and_then(|field| self.values.get(field.position))
    }

    /// extra 字段收集到的键值
    pub fn extra_values(&self) -> &DataMap {
        &self.extra
    }

    /// 字段是否存在并满足导出/导入条件
    pub fn has(&self, name: &str, export: bool, import: bool) -> bool {
        let Some(registry) = self.resolved_registry() else {
            return false;
        };
        registry
            .field(name)
            .map(|field| (!export || field.export) && (!import || field.import))
            .unwrap_or(false)
    }

    /// 将指定字段恢复为默认值
    ///
    /// 名称列表为空或没有可识别的名称时恢复全部字段
    pub fn revert(&mut self, names: &[&str]) {
        let Some(registry) = self.registry.clone() else {
            self.try_initialize();
            return;
        };
        let mut reverted = false;
        for name in names {
            if let Some(field) = registry.field(name) {
                let value = self.default_for(field);
                self.values[field.position] = value;
                reverted = true;
            } else if registry.extra().map(|f| f.name == *name).unwrap_or(false) {
                self.extra = Self::default_extra(&registry);
                reverted = true;
            }
        }
        if !reverted {
            self.revert_all();
        }
    }

    /// 嵌套数据模型
    pub fn nested_model(&self, name: &str) -> Option<&DataModel> {
        self.value(name)?.as_model()?.downcast_ref::<DataModel>()
    }

    pub fn nested_model_mut(&mut self, name: &str) -> Option<&mut DataModel> {
        let position = self.registry.as_ref()?.field(name)?.position;
        match self.values.get_mut(position)? {
            FieldValue::Nested(Some(model)) => model.downcast_mut::<DataModel>(),
            _ => None,
        }
    }

    /// 嵌套集合
    pub fn nested_collection(&self, name: &str) -> Option<&Collection> {
        self.value(name)?.as_model()?.downcast_ref::<Collection>()
    }

    pub fn nested_collection_mut(&mut self, name: &str) -> Option<&mut Collection> {
        let position = self.registry.as_ref()?.field(name)?.position;
        match self.values.get_mut(position)? {
            FieldValue::Nested(Some(model)) => model.downcast_mut::<Collection>(),
            _ => None,
        }
    }

    /// 按字段序号遍历 `(字段名, 当前值)`
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.registry
            .iter()
            .flat_map(|registry| registry.fields().iter())
            .map(|field| (field.name.as_str(), &self.values[field.position]))
    }

    /// 重置后导入数据
    pub fn from_data<'a>(&mut self, data: impl Into<Input<'a>>, errors: &mut ErrorTree) -> bool {
        self.revert_all();
        self.extend(data, errors)
    }

    /// 在当前状态上导入数据：已声明的键按导入模式赋值，其余转交 extra 字段
    pub fn extend<'a>(&mut self, data: impl Into<Input<'a>>, errors: &mut ErrorTree) -> bool {
        if !self.ensure_initialized(errors) {
            return false;
        }
        let Some(registry) = self.registry.clone() else {
            return false;
        };

        let map = match data.into().into_map() {
            Ok(map) => map,
            Err(message) => {
                errors.append_general(message);
                return false;
            }
        };

        let mut valid = true;
        for (key, value) in map {
            if registry.field(&key).is_some() {
                valid &= self.set(&key, value, errors, true);
            } else {
                self.save_extra(&registry, &key, value, true);
            }
        }
        valid
    }

    /// 按引擎配置的格式导出 JSON
    pub fn export_json(&self) -> ModelResult<String> {
        self.to_json(self.catalog.config().pretty_json)
    }

    fn describe_field(&self, registry: &FieldRegistry, field: &Field, seen: &mut Vec<String>) -> DataValue {
        let nested = match field.model_type() {
            Some(type_name) if seen.iter().any(|t| t == type_name) => {
                DataValue::from(CIRCULAR_REFERENCE)
            }
            Some(type_name) => match self.catalog.instantiate(type_name) {
                Ok(nested) => nested.describe_with(seen),
                Err(_) => DataValue::from(CANNOT_DESCRIBE),
            },
            None => DataValue::Null,
        };

        let (filters, checks) = if field.is_extra {
            (DataValue::Null, DataValue::Null)
        } else {
            let filters: Vec<DataValue> = registry
                .filters(field.position)
                .iter()
                .map(|f| DataValue::String(f.describe()))
                .collect();
            let checks: Vec<DataValue> = registry
                .checks(field.position)
                .iter()
                .map(|c| DataValue::String(c.describe()))
                .collect();
            (non_empty(filters), non_empty(checks))
        };

        let mut out = DataMap::new();
        out.insert("name".to_string(), DataValue::from(field.name.as_str()));
        out.insert("types".to_string(), DataValue::String(field.types_str()));
        out.insert("flags".to_string(), DataValue::String(field.flags()));
        out.insert("nested".to_string(), nested);
        out.insert("filters".to_string(), filters);
        out.insert("checks".to_string(), checks);
        DataValue::Object(out)
    }
}

impl fmt::Display for DataModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.export_json() {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{}", self.to_data_value()),
        }
    }
}

fn non_empty(items: Vec<DataValue>) -> DataValue {
    if items.is_empty() {
        DataValue::Null
    } else {
        DataValue::Array(items)
    }
}

/// 嵌套/集合元素的输入：字符串按 JSON 解析，其余按容器处理
pub(crate) fn item_input(value: &DataValue) -> Input<'_> {
    match value {
        DataValue::String(text) => Input::Json(text),
        other => Input::Data(other.clone()),
    }
}

impl Model for DataModel {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn is_initialized(&self) -> bool {
        self.registry.is_some()
    }

    fn initialize(&mut self) -> ModelResult<()> {
        if self.registry.is_some() {
            return Ok(());
        }
        let registry = self.catalog.registry(&self.type_name)?;
        if registry.type_name() != self.type_name {
            return Err(ModelError::UnknownModel {
                type_name: self.type_name.clone(),
            });
        }
        let values = registry.fields().iter().map(|f| self.default_for(f)).collect();
        self.values = values;
        self.extra = Self::default_extra(&registry);
        self.registry = Some(registry);
        Ok(())
    }

    fn from_data(&mut self, data: Input<'_>, errors: &mut ErrorTree) -> bool {
        DataModel::from_data(self, data, errors)
    }

    fn extend(&mut self, data: Input<'_>, errors: &mut ErrorTree) -> bool {
        DataModel::extend(self, data, errors)
    }

    fn revert_all(&mut self) {
        let Some(registry) = self.registry.clone() else {
            self.try_initialize();
            return;
        };
        let values = registry.fields().iter().map(|f| self.default_for(f)).collect();
        self.values = values;
        self.extra = Self::default_extra(&registry);
    }

    /// 重新检查必填、嵌套实例与校验链（不重复类型检查）
    fn validate(&self, errors: &mut ErrorTree) -> bool {
        let Some(view) = self.view() else {
            errors.append_general(INIT_FAILED);
            return false;
        };
        let Some(registry) = view.registry.clone() else {
            return false;
        };

        let mut valid = true;
        for field in registry.fields() {
            let value = &view.values[field.position];
            if field.required && value.is_null() {
                errors.append(&field.name, REQUIRED_NULL);
                valid = false;
            }
            match value {
                FieldValue::Nested(Some(nested)) => {
                    let mut nested_errors = ErrorTree::new();
                    if !nested.validate(&mut nested_errors) {
                        errors.append_nested(&field.name, nested_errors);
                        valid = false;
                    }
                }
                FieldValue::Nested(None) => {}
                FieldValue::Data(data) => {
                    if !apply_checks(&field.name, data, registry.checks(field.position), errors) {
                        valid = false;
                    }
                }
            }
        }
        valid
    }

    /// 按字段序号导出可导出字段，嵌套实例递归导出，extra 字段最后
    fn to_data_value(&self) -> DataValue {
        let Some(view) = self.view() else {
            return DataValue::Object(DataMap::new());
        };
        let Some(registry) = view.registry.as_ref() else {
            return DataValue::Object(DataMap::new());
        };

        let mut out = DataMap::new();
        for field in registry.fields() {
            if field.export {
                out.insert(field.name.clone(), view.values[field.position].to_data_value());
            }
        }
        if let Some(extra) = registry.extra() {
            if extra.export {
                out.insert(extra.name.clone(), DataValue::Object(view.extra.clone()));
            }
        }
        DataValue::Object(out)
    }

    fn describe_with(&self, seen: &mut Vec<String>) -> DataValue {
        let Some(registry) = self.resolved_registry() else {
            return DataValue::from(CANNOT_DESCRIBE);
        };

        let pushed = !seen.contains(&self.type_name);
        if pushed {
            seen.push(self.type_name.clone());
        }

        let mut out = DataMap::new();
        for field in registry.fields() {
            out.insert(field.name.clone(), self.describe_field(&registry, field, seen));
        }
        if let Some(extra) = registry.extra() {
            out.insert(extra.name.clone(), self.describe_field(&registry, extra, seen));
        }

        if pushed {
            seen.pop();
        }
        DataValue::Object(out)
    }

    fn clone_model(&self) -> Box<dyn Model> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field_types::{Access, FieldDefinition};
    use crate::model::filter::FilterDef;
    use crate::model::schema::ModelSchema;
    use serde_json::json;

    fn catalog() -> Arc<Catalog> {
        let catalog = Arc::new(Catalog::new());
        catalog
            .register_model(
                ModelSchema::new("Person")
                    .field("name", FieldDefinition::new("string").default_value("anon"))
                    .field("age", FieldDefinition::new("?int"))
                    .field("nickname", FieldDefinition::new("string").default_value(""))
                    .field(
                        "secret",
                        FieldDefinition::new("string").access(Access::Protected),
                    ),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_defaults_after_initialize() {
        let catalog = catalog();
        let person = DataModel::new(&catalog, "Person").unwrap();
        assert_eq!(person.get("name", true), Some(DataValue::from("anon")));
        assert_eq!(person.get("age", true), Some(DataValue::Null));
        assert!(person.is_initialized());
    }

    #[test]
    fn test_declared_instance_initializes_lazily() {
        let catalog = catalog();
        let mut person = DataModel::declare(&catalog, "Person");
        assert!(!person.is_initialized());
        assert_eq!(person.get("name", true), Some(DataValue::from("anon")));

        let mut errors = ErrorTree::new();
        assert!(person.set("age", 3, &mut errors, true));
        assert!(person.is_initialized());
    }

    #[test]
    fn test_unknown_field_without_extras() {
        let catalog = catalog();
        let mut person = DataModel::new(&catalog, "Person").unwrap();
        let mut errors = ErrorTree::new();
        assert!(!person.set_direct("height", 180, &mut errors));
        assert_eq!(
            errors.messages("errors"),
            vec!["DataPoint 'height' does not exist"]
        );
    }

    #[test]
    fn test_type_mismatch_message() {
        let catalog = catalog();
        let mut person = DataModel::new(&catalog, "Person").unwrap();
        let mut errors = ErrorTree::new();
        assert!(!person.set("age", "old", &mut errors, true));
        assert_eq!(
            errors.messages("age"),
            vec!["Value for DataPoint 'age' must be of type 'integer' -> Got 'string'"]
        );
        assert_eq!(person.get("age", true), Some(DataValue::Null));
    }

    #[test]
    fn test_protected_field_hidden_from_export() {
        let catalog = catalog();
        let mut person = DataModel::new(&catalog, "Person").unwrap();
        let mut errors = ErrorTree::new();
        assert!(person.from_data(json!({"name": "A", "secret": "s"}), &mut errors));
        assert_eq!(person.get("secret", true), None);
        assert_eq!(person.get("secret", false), Some(DataValue::from("s")));
        assert!(person.has("secret", false, true));
        assert!(!person.has("secret", true, false));
        assert_eq!(
            person.to_data_value(),
            DataValue::from(json!({"name": "A", "age": null, "nickname": ""}))
        );
    }

    #[test]
    fn test_revert_named_fields() {
        let catalog = catalog();
        let mut person = DataModel::new(&catalog, "Person").unwrap();
        let mut errors = ErrorTree::new();
        person.from_data(json!({"name": "A", "age": 2}), &mut errors);
        person.revert(&["age", "missing"]);
        assert_eq!(person.get("name", true), Some(DataValue::from("A")));
        assert_eq!(person.get("age", true), Some(DataValue::Null));
    }

    #[test]
    fn test_revert_without_known_names_restores_everything() {
        let catalog = catalog();
        let mut person = DataModel::new(&catalog, "Person").unwrap();
        let mut errors = ErrorTree::new();
        person.from_data(json!({"name": "A", "age": 2}), &mut errors);

        person.revert(&["missing"]);
        assert_eq!(person.get("name", true), Some(DataValue::from("anon")));
        assert_eq!(person.get("age", true), Some(DataValue::Null));

        person.extend(json!({"age": 5}), &mut errors);
        person.revert(&[]);
        assert_eq!(person.get("age", true), Some(DataValue::Null));
    }

    #[test]
    fn test_display_is_exported_json() {
        let catalog = catalog();
        let mut person = DataModel::new(&catalog, "Person").unwrap();
        let mut errors = ErrorTree::new();
        person.from_data(json!({"name": "A", "age": 2, "secret": "s"}), &mut errors);
        assert_eq!(
            person.to_string(),
            r#"{"name":"A","age":2,"nickname":""}"#
        );
    }

    #[test]
    fn test_self_nested_default_stops_at_cycle() {
        let catalog = Arc::new(Catalog::new());
        catalog
            .register_model(
                ModelSchema::new("Node")
                    .field("label", FieldDefinition::new("string").default_value("n"))
                    .field("next", FieldDefinition::new("?Node").default_value(json!({}))),
            )
            .unwrap();
        let node = DataModel::new(&catalog, "Node").unwrap();
        assert_eq!(
            node.to_data_value(),
            DataValue::from(json!({"label": "n", "next": {"label": "n", "next": null}}))
        );
    }

    #[test]
    fn test_filter_rescues_null_for_required_field() {
        let catalog = Arc::new(Catalog::new());
        catalog
            .register_model(
                ModelSchema::new("Tagged").field(
                    "tag",
                    FieldDefinition::new("string")
                        .required()
                        .filter(FilterDef::call("default").args(["none"])),
                ),
            )
            .unwrap();
        let mut tagged = DataModel::new(&catalog, "Tagged").unwrap();
        let mut errors = ErrorTree::new();
        assert!(tagged.set("tag", DataValue::Null, &mut errors, true));
        assert_eq!(tagged.get("tag", true), Some(DataValue::from("none")));
    }

    #[test]
    fn test_unregistered_type() {
        let catalog = Arc::new(Catalog::new());
        assert!(DataModel::new(&catalog, "Ghost").is_err());

        let mut ghost = DataModel::declare(&catalog, "Ghost");
        let mut errors = ErrorTree::new();
        assert!(!ghost.extend(json!({"a": 1}), &mut errors));
        assert_eq!(errors.messages("errors"), vec![INIT_FAILED]);
        assert_eq!(ghost.to_data_value(), DataValue::Object(DataMap::new()));
    }
}
