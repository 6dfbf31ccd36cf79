//! 模型集合
//!
//! 有序的键值容器，元素为模型实例。声明单一元素类型时可以直接用映射、
//! 列表或 JSON 字符串构建元素；多类型集合只接受已构建的实例。
//! 列表形态（键为 0..n 连续整数）在删除元素后按配置自动重建索引。

use crate::debug_log;
use crate::error::ModelResult;
use crate::model::catalog::Catalog;
use crate::model::data_model::item_input;
use crate::model::errors::ErrorTree;
use crate::model::input::Input;
use crate::model::traits::Model;
use crate::types::{DataMap, DataValue};
use indexmap::IndexMap;
use rat_logger::{error, warn};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 集合键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    Index(i64),
    Name(String),
}

impl CollectionKey {
    /// 解析键；规范整数字符串（如 `"3"`，不含 `"03"`）视为整数键
    pub fn parse(key: &str) -> Self {
        match key.parse::<i64>() {
            Ok(index) if index.to_string() == key => CollectionKey::Index(index),
            _ => CollectionKey::Name(key.to_string()),
        }
    }

    pub fn as_index(&self) -> Option<i64> {
        match self {
            CollectionKey::Index(index) => Some(*index),
            CollectionKey::Name(_) => None,
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKey::Index(index) => write!(f, "{}", index),
            CollectionKey::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<i64> for CollectionKey {
    fn from(value: i64) -> Self {
        CollectionKey::Index(value)
    }
}

impl From<i32> for CollectionKey {
    fn from(value: i32) -> Self {
        CollectionKey::Index(value as i64)
    }
}

impl From<usize> for CollectionKey {
    fn from(value: usize) -> Self {
        CollectionKey::Index(value as i64)
    }
}

impl From<&str> for CollectionKey {
    fn from(value: &str) -> Self {
        CollectionKey::parse(value)
    }
}

impl From<String> for CollectionKey {
    fn from(value: String) -> Self {
        CollectionKey::parse(&value)
    }
}

/// 待放入集合的元素来源
enum ItemSource<'a> {
    Input(Input<'a>),
    Owned(Box<dyn Model>),
}

/// 模型集合
#[derive(Debug, Clone)]
pub struct Collection {
    catalog: Arc<Catalog>,
    type_name: String,
    /// 允许的元素类型；空表示任意模型
    types: Option<Arc<Vec<String>>>,
    items: IndexMap<CollectionKey, Box<dyn Model>>,
    re_indexing: bool,
    clone_items: bool,
}

impl Collection {
    /// 声明未初始化的集合；重建索引与克隆策略取自目录配置
    pub fn declare(catalog: &Arc<Catalog>, type_name: impl Into<String>) -> Self {
        let config = catalog.config();
        Self {
            catalog: catalog.clone(),
            type_name: type_name.into(),
            types: None,
            items: IndexMap::new(),
            re_indexing: config.auto_reindex,
            clone_items: config.clone_items,
        }
    }

    /// 创建并初始化集合
    ///
    /// # 返回值
    /// 类型未注册或元素类型声明错误时返回 `Err`
    pub fn new(catalog: &Arc<Catalog>, type_name: &str) -> ModelResult<Self> {
        let mut collection = Self::declare(catalog, type_name);
        collection.initialize()?;
        Ok(collection)
    }

    /// 创建集合并导入数据
    pub fn with_data<'a>(
        catalog: &Arc<Catalog>,
        type_name: &str,
        data: impl Into<Input<'a>>,
        errors: &mut ErrorTree,
    ) -> ModelResult<Self> {
        let mut collection = Self::new(catalog, type_name)?;
        collection.from_data(data, errors);
        Ok(collection)
    }

    /// 允许的元素类型；空表示任意模型
    pub fn item_types(&self) -> &[String] {
        self.types.as_deref().map(Vec::as_slice).unwrap_or(&[])
    }

    fn ensure_initialized(&mut self, errors: &mut ErrorTree) -> bool {
        if self.types.is_some() || self.try_initialize() {
            return true;
        }
        errors.append_general("Collection could not be initialized declaration error");
        false
    }

    fn accepts(&self, type_name: &str) -> bool {
        let types = self.item_types();
        types.is_empty() || types.iter().any(|t| t == type_name)
    }

    /// 下一个追加键：最大整数键 + 1，没有整数键时为 0
    fn next_index(&self) -> i64 {
        self.items
            .keys()
            .filter_map(CollectionKey::as_index)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    /// 以指定类型构建新元素
    fn build_item(&self, type_name: &str, data: Input<'_>, errors: &mut ErrorTree) -> Option<Box<dyn Model>> {
        let mut item = match self.catalog.instantiate(type_name) {
            Ok(item) => item,
            Err(e) => {
                warn!("无法构建集合元素 '{}': {}", type_name, e);
                return None;
            }
        };
        if item.from_data(data, errors) {
            Some(item)
        } else {
            None
        }
    }

    fn put(
        &mut self,
        source: ItemSource<'_>,
        key: Option<CollectionKey>,
        errors: &mut ErrorTree,
        clone: bool,
    ) -> bool {
        if !self.ensure_initialized(errors) {
            return false;
        }
        let key_label = key
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| self.next_index().to_string());

        let source_type = match &source {
            ItemSource::Owned(model) => Some(model.type_name().to_string()),
            ItemSource::Input(Input::Model(model)) => Some(model.type_name().to_string()),
            ItemSource::Input(_) => None,
        };

        let mut item_errors = ErrorTree::new();
        let item = match source_type {
            Some(type_name) => {
                if !self.accepts(&type_name) {
                    errors.append_general(format!(
                        "Value of '{}' is not supported by this collection type",
                        key_label
                    ));
                    return false;
                }
                match source {
                    ItemSource::Owned(model) if clone => {
                        self.build_item(&type_name, Input::Model(model.as_ref()), &mut item_errors)
                    }
                    ItemSource::Owned(model) => Some(model),
                    ItemSource::Input(input) if clone => {
                        self.build_item(&type_name, input, &mut item_errors)
                    }
                    ItemSource::Input(Input::Model(model)) => Some(model.clone_model()),
                    ItemSource::Input(_) => None,
                }
            }
            None => {
                let types = self.item_types();
                if types.len() != 1 {
                    errors.append_general("Collection has multiple types and only objects are allowed");
                    return false;
                }
                let type_name = types[0].clone();
                match source {
                    ItemSource::Input(input) => self.build_item(&type_name, input, &mut item_errors),
                    ItemSource::Owned(model) => Some(model),
                }
            }
        };

        let Some(item) = item else {
            if !item_errors.is_empty() {
                errors.append_nested(key_label, item_errors);
            }
            errors.append_general("Could not build collection item");
            return false;
        };

        let key = key.unwrap_or_else(|| CollectionKey::Index(self.next_index()));
        debug_log!("集合 {} 写入键 {}", self.type_name, key);
        self.items.insert(key, item);
        true
    }

    /// 添加元素；键已存在时失败，键为 `None` 时追加
    ///
    /// # 参数
    /// * `value` - 模型实例，或单一类型集合可用的映射/列表/JSON 字符串
    /// * `key` - 元素键
    /// * `errors` - 错误输出
    pub fn add<'a>(
        &mut self,
        value: impl Into<Input<'a>>,
        key: Option<CollectionKey>,
        errors: &mut ErrorTree,
    ) -> bool {
        if !self.check_vacant(key.as_ref(), errors) {
            return false;
        }
        let clone = self.clone_items;
        self.put(ItemSource::Input(value.into()), key, errors, clone)
    }

    /// 写入元素；覆盖同键元素，键为 `None` 时追加
    pub fn set<'a>(
        &mut self,
        value: impl Into<Input<'a>>,
        key: Option<CollectionKey>,
        errors: &mut ErrorTree,
    ) -> bool {
        let clone = self.clone_items;
        self.put(ItemSource::Input(value.into()), key, errors, clone)
    }

    /// 添加已构建的实例；不克隆时原样保存
    pub fn add_item(&mut self, item: Box<dyn Model>, key: Option<CollectionKey>, errors: &mut ErrorTree) -> bool {
        if !self.check_vacant(key.as_ref(), errors) {
            return false;
        }
        let clone = self.clone_items;
        self.put(ItemSource::Owned(item), key, errors, clone)
    }

    pub fn set_item(&mut self, item: Box<dyn Model>, key: Option<CollectionKey>, errors: &mut ErrorTree) -> bool {
        let clone = self.clone_items;
        self.put(ItemSource::Owned(item), key, errors, clone)
    }

    fn check_vacant(&self, key: Option<&CollectionKey>, errors: &mut ErrorTree) -> bool {
        match key {
            Some(key) if self.items.contains_key(key) => {
                errors.append_general(format!("Key '{}' already exists", key));
                false
            }
            _ => true,
        }
    }

    /// 写入实例时是否重新构建（克隆）
    pub fn set_clone_items(&mut self, clone: bool) {
        self.clone_items = clone;
    }

    pub fn clone_items(&self) -> bool {
        self.clone_items
    }

    pub fn get(&self, key: impl Into<CollectionKey>) -> Option<&(dyn Model + 'static)> {
        self.items.get(&key.into()).map(|item| item.as_ref())
    }

    pub fn get_mut(&mut self, key: impl Into<CollectionKey>) -> Option<&mut Box<dyn Model>> {
        self.items.get_mut(&key.into())
    }

    /// 读取元素并向下转型
    pub fn get_as<T: Model + 'static>(&self, key: impl Into<CollectionKey>) -> Option<&T> {
        self.get(key)?.downcast_ref::<T>()
    }

    pub fn has(&self, key: impl Into<CollectionKey>) -> bool {
        self.items.contains_key(&key.into())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CollectionKey> {
        self.items.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &(dyn Model + 'static)> {
        self.items.values().map(|item| item.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CollectionKey, &(dyn Model + 'static))> {
        self.items.iter().map(|(key, item)| (key, item.as_ref()))
    }

    /// 删除元素；`keys` 为空时删除全部
    ///
    /// 删除前为列表形态且开启自动重建索引时，删除后重新编号为连续整数键。
    pub fn clear(&mut self, keys: &[CollectionKey]) {
        if keys.is_empty() {
            self.clear_all();
            return;
        }
        let was_list = self.is_list();
        let mut removed = false;
        for key in keys {
            removed |= self.items.shift_remove(key).is_some();
        }
        if self.re_indexing && was_list && removed {
            self.convert_to_list();
        }
    }

    pub fn clear_all(&mut self) {
        self.items.clear();
    }

    /// 将元素恢复为默认状态（不改变集合本身）；`keys` 为空时恢复全部
    pub fn revert(&mut self, keys: &[CollectionKey]) {
        if keys.is_empty() {
            self.items.values_mut().for_each(|item| item.revert_all());
            return;
        }
        for key in keys {
            if let Some(item) = self.items.get_mut(key) {
                item.revert_all();
            }
        }
    }

    /// 设置（`Some`）或读取（`None`）自动重建索引
    pub fn auto_reindexing(&mut self, auto: Option<bool>) -> bool {
        if let Some(auto) = auto {
            self.re_indexing = auto;
        }
        self.re_indexing
    }

    /// 键是否为 0..n 的连续整数
    pub fn is_list(&self) -> bool {
        self.items
            .keys()
            .enumerate()
            .all(|(i, key)| key.as_index() == Some(i as i64))
    }

    pub fn is_map(&self) -> bool {
        !self.is_list()
    }

    /// 按当前顺序重新编号为 0..n
    pub fn convert_to_list(&mut self) {
        let items = std::mem::take(&mut self.items);
        self.items = items
            .into_values()
            .enumerate()
            .map(|(i, item)| (CollectionKey::Index(i as i64), item))
            .collect();
    }

    /// 为每个键加上前缀，如 `"num_"` 得到 `num_0`、`num_1`
    pub fn convert_to_map(&mut self, prefix: &str) {
        let items = std::mem::take(&mut self.items);
        self.items = items
            .into_iter()
            .map(|(key, item)| (CollectionKey::parse(&format!("{}{}", prefix, key)), item))
            .collect();
    }

    /// 清空后导入数据
    pub fn from_data<'a>(&mut self, data: impl Into<Input<'a>>, errors: &mut ErrorTree) -> bool {
        self.clear_all();
        self.extend(data, errors)
    }

    /// 合并数据
    ///
    /// 来源为集合时按源键克隆全部元素（覆盖同键）；来源为列表时逐个追加，
    /// 映射的字符串键保留。
    pub fn extend<'a>(&mut self, data: impl Into<Input<'a>>, errors: &mut ErrorTree) -> bool {
        if !self.ensure_initialized(errors) {
            return false;
        }
        let data = data.into();

        if let Input::Model(model) = data {
            let Some(source) = model.downcast_ref::<Collection>() else {
                errors.append_general("Collection item is not of a valid type");
                return false;
            };
            let mut valid = true;
            for (key, item) in source.iter() {
                valid &= self.put(ItemSource::Input(Input::Model(item)), Some(key.clone()), errors, true);
            }
            return valid;
        }

        let map = match data.into_value() {
            Ok(value) if value.is_container() => value.into_map().unwrap_or_default(),
            Ok(_) => {
                errors.append_general("Collection item is not of a valid type");
                return false;
            }
            Err(message) => {
                errors.append_general(message);
                return false;
            }
        };
        self.extend_map(map, errors)
    }

    fn extend_map(&mut self, map: DataMap, errors: &mut ErrorTree) -> bool {
        let clone = self.clone_items;
        let mut valid = true;
        for (key, value) in map {
            let key = match CollectionKey::parse(&key) {
                CollectionKey::Index(_) => None,
                name => Some(name),
            };
            valid &= self.put(ItemSource::Input(item_input(&value)), key, errors, clone);
        }
        valid
    }

    /// 按配置格式导出 JSON
    pub fn export_json(&self) -> ModelResult<String> {
        self.to_json(self.catalog.config().pretty_json)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.export_json() {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{}", self.to_data_value()),
        }
    }
}

impl Model for Collection {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn is_initialized(&self) -> bool {
        self.types.is_some()
    }

    fn initialize(&mut self) -> ModelResult<()> {
        if self.types.is_some() {
            return Ok(());
        }
        match self.catalog.collection_types(&self.type_name) {
            Ok(types) => {
                self.types = Some(types);
                Ok(())
            }
            Err(e) => {
                error!("集合 '{}' 声明错误: {}", self.type_name, e);
                Err(e)
            }
        }
    }

    fn from_data(&mut self, data: Input<'_>, errors: &mut ErrorTree) -> bool {
        Collection::from_data(self, data, errors)
    }

    fn extend(&mut self, data: Input<'_>, errors: &mut ErrorTree) -> bool {
        Collection::extend(self, data, errors)
    }

    fn revert_all(&mut self) {
        self.revert(&[]);
    }

    fn validate(&self, errors: &mut ErrorTree) -> bool {
        let mut valid = true;
        for (key, item) in &self.items {
            let mut item_errors = ErrorTree::new();
            if !item.validate(&mut item_errors) {
                errors.append_nested(key.to_string(), item_errors);
                valid = false;
            }
        }
        valid
    }

    /// 列表形态导出为数组，否则导出为映射
    fn to_data_value(&self) -> DataValue {
        if self.is_list() {
            return DataValue::Array(self.items.values().map(|item| item.to_data_value()).collect());
        }
        DataValue::Object(
            self.items
                .iter()
                .map(|(key, item)| (key.to_string(), item.to_data_value()))
                .collect(),
        )
    }

    fn describe_with(&self, _seen: &mut Vec<String>) -> DataValue {
        let types = match &self.types {
            Some(types) => Some(types.clone()),
            None => self.catalog.collection_types(&self.type_name).ok(),
        };
        let items = match types {
            Some(types) if !types.is_empty() => types.join("|"),
            _ => "any".to_string(),
        };

        let mut out = DataMap::new();
        out.insert("name".to_string(), DataValue::from(self.type_name.as_str()));
        out.insert("items".to_string(), DataValue::String(items));
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
    use crate::config::EngineConfig;
    use crate::model::data_model::DataModel;
    use crate::model::field_types::FieldDefinition;
    use crate::model::schema::{CollectionSchema, ModelSchema};
    use serde_json::json;

    fn catalog() -> Arc<Catalog> {
        let catalog = Arc::new(Catalog::new());
        catalog
            .register_model(ModelSchema::new("Book").field("title", FieldDefinition::new("string")))
            .unwrap();
        catalog
            .register_model(ModelSchema::new("Pen").field("color", FieldDefinition::new("string")))
            .unwrap();
        catalog
            .register_collection(CollectionSchema::new("Shelf").models("Book"))
            .unwrap();
        catalog
            .register_collection(CollectionSchema::new("Drawer").models("Book|Pen"))
            .unwrap();
        catalog
    }

    fn shelf(catalog: &Arc<Catalog>, titles: &[&str]) -> Collection {
        let mut shelf = Collection::new(catalog, "Shelf").unwrap();
        let mut errors = ErrorTree::new();
        for title in titles {
            assert!(shelf.add(json!({ "title": title }), None, &mut errors));
        }
        shelf
    }

    #[test]
    fn test_key_parse() {
        assert_eq!(CollectionKey::parse("3"), CollectionKey::Index(3));
        assert_eq!(CollectionKey::parse("03"), CollectionKey::Name("03".into()));
        assert_eq!(CollectionKey::parse("a"), CollectionKey::Name("a".into()));
    }

    #[test]
    fn test_add_builds_items_and_rejects_duplicates() {
        let catalog = catalog();
        let mut shelf = shelf(&catalog, &["A", "B"]);
        assert_eq!(shelf.len(), 2);
        assert!(shelf.is_list());

        let mut errors = ErrorTree::new();
        assert!(!shelf.add(json!({"title": "C"}), Some(1.into()), &mut errors));
        assert_eq!(errors.messages("errors"), vec!["Key '1' already exists"]);

        assert!(shelf.set(r#"{"title": "C"}"#, Some(1.into()), &mut errors));
        let book = shelf.get_as::<DataModel>(1).unwrap();
        assert_eq!(book.get("title", true), Some(DataValue::from("C")));
    }

    #[test]
    fn test_append_uses_next_integer_key() {
        let catalog = catalog();
        let mut shelf = shelf(&catalog, &["A"]);
        let mut errors = ErrorTree::new();
        assert!(shelf.set(json!({"title": "B"}), Some(5.into()), &mut errors));
        assert!(shelf.add(json!({"title": "C"}), None, &mut errors));
        assert!(shelf.has(6));
    }

    #[test]
    fn test_clear_reindexes_lists() {
        let catalog = catalog();
        let mut shelf = shelf(&catalog, &["A", "B", "C"]);
        shelf.clear(&[1.into()]);
        assert_eq!(shelf.keys().cloned().collect::<Vec<_>>(), vec![CollectionKey::Index(0), CollectionKey::Index(1)]);

        let mut shelf = self::shelf(&catalog, &["A", "B", "C"]);
        assert!(!shelf.auto_reindexing(Some(false)));
        shelf.clear(&[1.into()]);
        assert_eq!(shelf.keys().cloned().collect::<Vec<_>>(), vec![CollectionKey::Index(0), CollectionKey::Index(2)]);
        assert!(shelf.is_map());
    }

    #[test]
    fn test_multi_type_collection_requires_instances() {
        let catalog = catalog();
        let mut drawer = Collection::new(&catalog, "Drawer").unwrap();
        let mut errors = ErrorTree::new();
        assert!(!drawer.add(json!({"color": "red"}), None, &mut errors));
        assert_eq!(
            errors.messages("errors"),
            vec!["Collection has multiple types and only objects are allowed"]
        );

        let mut pen_errors = ErrorTree::new();
        let pen = DataModel::with_data(&catalog, "Pen", json!({"color": "red"}), &mut pen_errors).unwrap();
        assert!(drawer.add(&pen, None, &mut errors));
        assert_eq!(drawer.to_data_value(), DataValue::from(json!([{"color": "red"}])));
    }

    #[test]
    fn test_rejects_wrong_item_type() {
        let catalog = catalog();
        let mut shelf = Collection::new(&catalog, "Shelf").unwrap();
        let pen = DataModel::new(&catalog, "Pen").unwrap();
        let mut errors = ErrorTree::new();
        assert!(!shelf.add_item(Box::new(pen), Some("x".into()), &mut errors));
        assert_eq!(
            errors.messages("errors"),
            vec!["Value of 'x' is not supported by this collection type"]
        );
    }

    #[test]
    fn test_item_errors_nested_under_key() {
        let catalog = catalog();
        let mut shelf = Collection::new(&catalog, "Shelf").unwrap();
        let mut errors = ErrorTree::new();
        assert!(!shelf.set(json!({"title": 5}), Some("first".into()), &mut errors));
        assert!(errors.nested("first").unwrap().contains("title"));
        assert_eq!(errors.messages("errors"), vec!["Could not build collection item"]);
    }

    #[test]
    fn test_extend_from_collection_keeps_keys() {
        let catalog = catalog();
        let mut source = shelf(&catalog, &["A"]);
        let mut errors = ErrorTree::new();
        source.set(json!({"title": "B"}), Some("named".into()), &mut errors);

        let mut target = shelf(&catalog, &["Z"]);
        assert!(target.extend(&source, &mut errors));
        assert_eq!(
            target.to_data_value(),
            DataValue::from(json!({"0": {"title": "A"}, "named": {"title": "B"}}))
        );
    }

    #[test]
    fn test_convert_shapes() {
        let catalog = catalog();
        let mut shelf = shelf(&catalog, &["A", "B"]);
        shelf.convert_to_map("num_");
        assert_eq!(
            shelf.keys().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["num_0", "num_1"]
        );
        shelf.convert_to_list();
        assert!(shelf.is_list());
    }

    #[test]
    fn test_config_controls_reindexing() {
        let catalog = catalog();
        catalog.set_config(EngineConfig {
            auto_reindex: false,
            clone_items: false,
            pretty_json: false,
        });
        let mut shelf = Collection::new(&catalog, "Shelf").unwrap();
        assert!(!shelf.auto_reindexing(None));
        assert!(!shelf.clone_items());
    }

    #[test]
    fn test_display_follows_shape() {
        let catalog = catalog();
        let mut shelf = shelf(&catalog, &["a", "b"]);
        assert_eq!(shelf.to_string(), r#"[{"title":"a"},{"title":"b"}]"#);

        let mut errors = ErrorTree::new();
        assert!(shelf.add(json!({"title": "c"}), Some("top".into()), &mut errors));
        assert_eq!(
            shelf.to_string(),
            r#"{"0":{"title":"a"},"1":{"title":"b"},"top":{"title":"c"}}"#
        );
    }

    #[test]
    fn test_describe() {
        let catalog = catalog();
        let drawer = Collection::declare(&catalog, "Drawer");
        assert_eq!(
            drawer.describe(),
            DataValue::from(json!({"name": "Drawer", "items": "Book|Pen"}))
        );
    }
}
