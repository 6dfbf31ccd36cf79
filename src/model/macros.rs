//! 模型声明相关的宏定义

/// 便捷宏：声明模型
///
/// ```
/// use rat_quickdm::model::{integer_field, string_field};
///
/// let schema = rat_quickdm::model_schema! {
///     "Book" {
///         title: string_field().required(),
///         pages: integer_field().default_value(0),
///     }
/// };
/// assert!(schema.has_field("pages"));
/// ```
#[macro_export]
macro_rules! model_schema {
    (
        $name:literal $( extends $parent:ident )? {
            $( $field:ident : $def:expr ),* $(,)?
        }
    ) => {{
        let schema = $crate::model::schema::ModelSchema::new($name);
        $( let schema = schema.extends(&$parent); )?
        $( let schema = schema.field(stringify!($field), $def); )*
        schema
    }};
}

/// 便捷宏：声明集合
///
/// `collection_schema!("Shelf" => "Book|Magazine")`
#[macro_export]
macro_rules! collection_schema {
    ($name:literal => $models:expr) => {
        $crate::model::schema::CollectionSchema::new($name).models($models)
    };
    ($name:literal) => {
        $crate::model::schema::CollectionSchema::new($name).models($crate::model::types::ANY_TYPE)
    };
}
