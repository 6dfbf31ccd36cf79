//! 过滤器：赋值前按顺序变换字段值
//!
//! 声明阶段使用 [`FilterDef`]，注册表构建时解析为可直接调用的 [`Filter`]。

use crate::error::ModelResult;
use crate::model::catalog::Catalog;
use crate::model::function::{Callable, invoke};
use crate::model::reference::SpecRef;
use crate::model::schema::ModelSchema;
use crate::model::spec::{SpecArg, SpecKind, apply_value, describe_args, place_marker};
use crate::model::types::{is_any, types_from_str, value_matches_any};
use crate::types::DataValue;
use std::fmt;

/// 过滤器声明目标
#[derive(Debug, Clone, PartialEq)]
pub enum FilterTarget {
    /// 函数名：全局函数、`Model::name` 或 `::name`
    Call(String),
    /// 引用其他字段的过滤器链
    Reference(SpecRef),
}

/// 过滤器声明
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDef {
    pub target: FilterTarget,
    pub args: Vec<DataValue>,
    pub value_pos: i64,
    /// 期望的返回类型表达式，空表示任意
    pub returns: String,
}

impl FilterDef {
    /// 按函数名声明过滤器
    pub fn call(name: impl Into<String>) -> Self {
        Self {
            target: FilterTarget::Call(name.into()),
            args: Vec::new(),
            value_pos: 0,
            returns: String::new(),
        }
    }

    /// 引用其他字段的过滤器链
    pub fn reference(reference: impl Into<SpecRef>) -> Self {
        Self {
            target: FilterTarget::Reference(reference.into()),
            args: Vec::new(),
            value_pos: 0,
            returns: String::new(),
        }
    }

    /// 附加字面量参数
    pub fn args<I, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DataValue>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// 值在参数列表中的位置
    pub fn value_pos(mut self, pos: i64) -> Self {
        self.value_pos = pos;
        self
    }

    /// 限定返回类型，如 `"int|float"`
    pub fn returns(mut self, types: impl Into<String>) -> Self {
        self.returns = types.into();
        self
    }

    pub(crate) fn as_reference(&self) -> Option<&SpecRef> {
        match &self.target {
            FilterTarget::Reference(r) => Some(r),
            FilterTarget::Call(_) => None,
        }
    }
}

/// 已解析的过滤器
#[derive(Clone)]
pub struct Filter {
    name: String,
    call: Callable,
    args: Vec<SpecArg>,
    types: Vec<String>,
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("types", &self.types)
            .finish()
    }
}

impl Filter {
    /// 直接构造过滤器
    ///
    /// # 参数
    /// * `name` - 描述中显示的名称
    /// * `call` - 可调用对象
    /// * `args` - 字面量参数
    /// * `value_pos` - 值占位符位置
    /// * `returns` - 期望返回类型，空字符串表示任意
    pub fn new(
        name: impl Into<String>,
        call: Callable,
        args: Vec<DataValue>,
        value_pos: i64,
        returns: &str,
    ) -> Self {
        let types = types_from_str(returns);
        Self {
            name: name.into(),
            call,
            args: place_marker(args, value_pos),
            types: if is_any(&types) { Vec::new() } else { types },
        }
    }

    /// 从声明解析（引用声明由解析器展开，不会到达这里）
    pub(crate) fn build(def: &FilterDef, owner: &ModelSchema, catalog: &Catalog) -> ModelResult<Self> {
        let name = match &def.target {
            FilterTarget::Call(name) => name,
            FilterTarget::Reference(r) => {
                return Err(crate::error::ModelError::NotCallable {
                    kind: SpecKind::Filter,
                    name: r.to_string(),
                });
            }
        };
        let call = catalog.resolve_callable(owner, name, SpecKind::Filter)?;
        Ok(Filter::new(name.clone(), call, def.args.clone(), def.value_pos, &def.returns))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[SpecArg] {
        &self.args
    }

    /// 执行过滤器
    ///
    /// # 返回值
    /// 新值；调用失败或返回类型不符时返回错误消息
    pub fn apply(&self, value: &DataValue) -> Result<DataValue, String> {
        let args = apply_value(&self.args, value);
        let result = invoke(&self.call, &args)
            .map_err(|detail| format!("Filter failed with error '{}'", detail))?;
        if !value_matches_any(&self.types, &result) {
            return Err(format!("Invalid return type '{}' from filter", result.type_name()));
        }
        Ok(result)
    }

    /// 描述：`name(@V, arg…)`，限定返回类型时附加 ` -> t1|t2`
    pub fn describe(&self) -> String {
        let mut out = format!("{}({})", self.name, describe_args(&self.args));
        if !self.types.is_empty() {
            out.push_str(" -> ");
            out.push_str(&self.types.join("|"));
        }
        out
    }
}

/// 依次执行过滤器链，遇到第一个失败即停止
pub fn apply_filters(value: DataValue, filters: &[Filter]) -> Result<DataValue, String> {
    filters.iter().try_fold(value, |current, filter| filter.apply(&current))
}
