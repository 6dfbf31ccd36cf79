//! 集成测试共用的模型声明

#![allow(dead_code)]

use rat_quickdm::model::{
    Access, Catalog, CheckDef, CollectionSchema, FieldDefinition, FilterDef, ModelSchema, With,
    extra_field, integer_field, model_field, string_field,
};
use std::sync::Arc;

/// 作者、图书、书架三种类型
pub fn library_catalog() -> Arc<Catalog> {
    let catalog = Arc::new(Catalog::new());

    catalog
        .register_model(
            ModelSchema::new("Author")
                .field(
                    "name",
                    string_field()
                        .required()
                        .default_value("unknown")
                        .filter(FilterDef::call("trim"))
                        .check(CheckDef::with(With::MinLength).args([2])),
                )
                .field("email", FieldDefinition::new("?string")),
        )
        .unwrap();

    catalog
        .register_model(
            ModelSchema::new("Book")
                .function("positive", |args| {
                    let ok = args[0].as_i64().map(|n| n > 0).unwrap_or(false);
                    Ok(if ok {
                        true.into()
                    } else {
                        "Pages must be positive".into()
                    })
                })
                .field(
                    "title",
                    string_field()
                        .default_value("")
                        .filter(FilterDef::call("trim"))
                        .filter(FilterDef::call("strtoupper")),
                )
                .field(
                    "pages",
                    integer_field()
                        .default_value(1)
                        .check(CheckDef::call("::positive"))
                        .check(CheckDef::with(With::LessThan).args([1000])),
                )
                .field("author", model_field("?Author"))
                .field("isbn", string_field().default_value("").access(Access::Protected))
                .field("rating", FieldDefinition::new("?float").import(false))
                .field("meta", extra_field().export(false)),
        )
        .unwrap();

    catalog
        .register_collection(CollectionSchema::new("Shelf").models("Book"))
        .unwrap();

    catalog
        .register_model(
            ModelSchema::new("Library")
                .field("name", string_field().default_value(""))
                .field("shelf", model_field("Shelf").default_value("[]")),
        )
        .unwrap();

    catalog
}
