//! 模型与集合的声明描述
//!
//! 模型类型通过 [`ModelSchema`] 声明字段与模型作用域函数，
//! 集合类型通过 [`CollectionSchema`] 声明允许的元素模型类型。

use crate::model::field_types::FieldDefinition;
use crate::model::function::{Callable, callable};
use crate::types::DataValue;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// 模型声明
#[derive(Clone)]
pub struct ModelSchema {
    name: String,
    fields: IndexMap<String, FieldDefinition>,
    functions: IndexMap<String, Callable>,
}

impl fmt::Debug for ModelSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSchema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModelSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            functions: IndexMap::new(),
        }
    }

    /// 声明字段；同名字段原位替换
    pub fn field(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.fields.insert(name.into(), definition);
        self
    }

    /// 声明模型作用域函数（可通过 `Model::name` 或 `::name` 引用）
    pub fn function<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[DataValue]) -> anyhow::Result<DataValue> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), callable(f));
        self
    }

    /// 继承父模型的字段与函数
    ///
    /// 父模型字段排在前面；本模型重新声明的字段替换父字段但保留其位置
    pub fn extends(mut self, parent: &ModelSchema) -> Self {
        let mut fields = parent.fields.clone();
        for (name, definition) in self.fields.drain(..) {
            fields.insert(name, definition);
        }
        self.fields = fields;

        let mut functions = parent.functions.clone();
        for (name, f) in self.functions.drain(..) {
            functions.insert(name, f);
        }
        self.functions = functions;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 按声明顺序遍历字段
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get_function(&self, name: &str) -> Option<Callable> {
        self.functions.get(name).cloned()
    }
}

/// 集合声明
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSchema {
    name: String,
    models: String,
}

impl CollectionSchema {
    /// 创建集合声明，默认接受任意模型
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            models: String::new(),
        }
    }

    /// 允许的元素模型类型，如 `"Car|Bike"`；`"any"` 表示任意模型
    pub fn models(mut self, models: impl Into<String>) -> Self {
        self.models = models.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 元素类型表达式
    pub fn model_types(&self) -> &str {
        &self.models
    }
}

/// 已注册的声明
#[derive(Debug, Clone)]
pub enum Schema {
    Model(Arc<ModelSchema>),
    Collection(Arc<CollectionSchema>),
}

impl Schema {
    pub fn name(&self) -> &str {
        match self {
            Schema::Model(s) => s.name(),
            Schema::Collection(s) => s.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extends_keeps_parent_positions() {
        let parent = ModelSchema::new("Vehicle")
            .field("brand", FieldDefinition::new("string"))
            .field("wheels", FieldDefinition::new("int").default_value(4));
        let child = ModelSchema::new("Bike")
            .field("wheels", FieldDefinition::new("int").default_value(2))
            .field("bell", FieldDefinition::new("bool"))
            .extends(&parent);

        let names: Vec<&str> = child.fields().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["brand", "wheels", "bell"]);
        assert_eq!(
            child.get_field("wheels").unwrap().default,
            DataValue::from(2)
        );
        assert_eq!(child.name(), "Bike");
    }

    #[test]
    fn test_functions() {
        let schema = ModelSchema::new("Book").function("is_isbn", |_| Ok(DataValue::Bool(true)));
        assert!(schema.get_function("is_isbn").is_some());
        assert!(schema.get_function("missing").is_none());
    }

    #[test]
    fn test_collection_schema() {
        let schema = CollectionSchema::new("Garage").models("Car|Bike");
        assert_eq!(schema.model_types(), "Car|Bike");
        assert_eq!(Schema::Collection(Arc::new(schema)).name(), "Garage");
    }
}
