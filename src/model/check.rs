//! 校验器：导入时与 `validate()` 中检查字段值
//!
//! 同一字段的所有校验器都会执行，失败消息全部写入错误树。

use crate::error::{ModelError, ModelResult};
use crate::model::catalog::Catalog;
use crate::model::errors::ErrorTree;
use crate::model::function::{Callable, invoke};
use crate::model::reference::SpecRef;
use crate::model::schema::ModelSchema;
use crate::model::spec::{SpecArg, SpecKind, apply_value, describe_args, place_marker};
use crate::model::with::With;
use crate::types::DataValue;
use rat_logger::warn;
use std::fmt;

/// 可调用校验器返回非 `true`、非字符串时的消息
pub const NOT_VALID: &str = "Not valid";

/// 校验器内部失败时报告给字段的消息
pub const INTERNAL_ERROR: &str = "Check failed with internal error";

/// 校验器声明目标
#[derive(Debug, Clone, PartialEq)]
pub enum CheckDefTarget {
    /// 内置操作符
    With(With),
    /// 函数名：全局函数、`Model::name` 或 `::name`
    Call(String),
    /// 引用其他字段的校验链
    Reference(SpecRef),
}

/// 校验器声明
#[derive(Debug, Clone, PartialEq)]
pub struct CheckDef {
    pub target: CheckDefTarget,
    pub args: Vec<DataValue>,
    pub value_pos: i64,
}

impl CheckDef {
    /// 使用内置操作符
    pub fn with(op: With) -> Self {
        Self {
            target: CheckDefTarget::With(op),
            args: Vec::new(),
            value_pos: 0,
        }
    }

    /// 按名称声明；名称是内置操作符标签时视为内置操作符
    pub fn call(name: impl Into<String>) -> Self {
        let name = name.into();
        let target = match With::from_tag(&name) {
            Some(op) => CheckDefTarget::With(op),
            None => CheckDefTarget::Call(name),
        };
        Self {
            target,
            args: Vec::new(),
            value_pos: 0,
        }
    }

    /// 引用其他字段的校验链
    pub fn reference(reference: impl Into<SpecRef>) -> Self {
        Self {
            target: CheckDefTarget::Reference(reference.into()),
            args: Vec::new(),
            value_pos: 0,
        }
    }

    pub fn args<I, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DataValue>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn value_pos(mut self, pos: i64) -> Self {
        self.value_pos = pos;
        self
    }

    pub(crate) fn as_reference(&self) -> Option<&SpecRef> {
        match &self.target {
            CheckDefTarget::Reference(r) => Some(r),
            _ => None,
        }
    }
}

/// 已解析的校验目标
#[derive(Clone)]
pub enum CheckTarget {
    With(With),
    Call { name: String, call: Callable },
}

/// 已解析的校验器
#[derive(Clone)]
pub struct Check {
    target: CheckTarget,
    args: Vec<SpecArg>,
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl Check {
    /// 内置操作符校验
    pub fn builtin(op: With, args: Vec<DataValue>, value_pos: i64) -> Self {
        Self {
            target: CheckTarget::With(op),
            args: place_marker(args, value_pos),
        }
    }

    /// 可调用校验：返回 `true` 通过，返回字符串作为失败消息
    pub fn callable(name: impl Into<String>, call: Callable, args: Vec<DataValue>, value_pos: i64) -> Self {
        Self {
            target: CheckTarget::Call {
                name: name.into(),
                call,
            },
            args: place_marker(args, value_pos),
        }
    }

    pub(crate) fn build(def: &CheckDef, owner: &ModelSchema, catalog: &Catalog) -> ModelResult<Self> {
        match &def.target {
            CheckDefTarget::With(op) => Ok(Check::builtin(*op, def.args.clone(), def.value_pos)),
            CheckDefTarget::Call(name) => {
                let call = catalog.resolve_callable(owner, name, SpecKind::Check)?;
                Ok(Check::callable(name.clone(), call, def.args.clone(), def.value_pos))
            }
            CheckDefTarget::Reference(r) => Err(ModelError::NotCallable {
                kind: SpecKind::Check,
                name: r.to_string(),
            }),
        }
    }

    pub fn target(&self) -> &CheckTarget {
        &self.target
    }

    /// 执行校验
    ///
    /// # 返回值
    /// `Ok((是否通过, 失败消息))`；内部失败返回 `Err(详情)`
    pub fn evaluate(&self, value: &DataValue) -> Result<(bool, String), String> {
        match &self.target {
            CheckTarget::With(op) => {
                let operands: Vec<DataValue> = self
                    .args
                    .iter()
                    .filter_map(|arg| match arg {
                        SpecArg::Literal(v) => Some(v.clone()),
                        SpecArg::Value => None,
                    })
                    .collect();
                op.evaluate(value, &operands)
            }
            CheckTarget::Call { call, .. } => {
                let args = apply_value(&self.args, value);
                Ok(match invoke(call, &args)? {
                    DataValue::Bool(true) => (true, String::new()),
                    DataValue::String(message) => (false, message),
                    _ => (false, NOT_VALID.to_string()),
                })
            }
        }
    }

    /// 描述：内置操作符为 `@V op 操作数`，可调用为 `name(@V, …) is true`
    pub fn describe(&self) -> String {
        match &self.target {
            CheckTarget::With(op) => {
                let operands: Vec<DataValue> = self
                    .args
                    .iter()
                    .filter_map(|arg| match arg {
                        SpecArg::Literal(v) => Some(v.clone()),
                        SpecArg::Value => None,
                    })
                    .collect();
                if operands.is_empty() {
                    format!("@V {}", op.tag())
                } else {
                    format!("@V {} {}", op.tag(), With::render_operands(&operands))
                }
            }
            CheckTarget::Call { name, .. } => {
                format!("{}({}) is true", name, describe_args(&self.args))
            }
        }
    }
}

/// 执行字段的全部校验器，失败消息写入 `errors[field]`
///
/// # 返回值
/// 全部通过时返回 `true`
pub fn apply_checks(field: &str, value: &DataValue, checks: &[Check], errors: &mut ErrorTree) -> bool {
    let mut valid = true;
    for check in checks {
        match check.evaluate(value) {
            Ok((true, _)) => {}
            Ok((false, message)) => {
                errors.append(field, message);
                valid = false;
            }
            Err(detail) => {
                warn!("字段 '{}' 的校验 {} 内部失败: {}", field, check.describe(), detail);
                errors.append(field, INTERNAL_ERROR);
                valid = false;
            }
        }
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::function::callable;

    #[test]
    fn test_all_checks_run() {
        let checks = vec![
            Check::builtin(With::MinLength, vec![5.into()], 0),
            Check::builtin(With::IsUpper, vec![], 0),
        ];
        let mut errors = ErrorTree::new();
        assert!(!apply_checks("code", &DataValue::from("ab"), &checks, &mut errors));
        assert_eq!(
            errors.messages("code"),
            vec!["Must have a minimum length of 5", "Must be uppercase"]
        );
    }

    #[test]
    fn test_callable_results() {
        let message = callable(|args| {
            Ok(if args[0] == DataValue::from("ok") {
                DataValue::Bool(true)
            } else {
                DataValue::from("Must be ok")
            })
        });
        let falsy = callable(|_| Ok(DataValue::Bool(false)));
        let failing = callable(|_| anyhow::bail!("database gone"));

        let check = Check::callable("is_ok", message, vec![], 0);
        assert_eq!(check.evaluate(&"ok".into()).unwrap(), (true, String::new()));
        assert_eq!(
            check.evaluate(&"no".into()).unwrap(),
            (false, "Must be ok".to_string())
        );

        let checks = vec![
            Check::callable("falsy", falsy, vec![], 0),
            Check::callable("failing", failing, vec![], 0),
        ];
        let mut errors = ErrorTree::new();
        assert!(!apply_checks("f", &DataValue::Null, &checks, &mut errors));
        assert_eq!(errors.messages("f"), vec![NOT_VALID, INTERNAL_ERROR]);
    }

    #[test]
    fn test_operands_follow_marker() {
        let check = Check::builtin(With::InRange, vec![1.into(), 10.into()], 0);
        assert!(check.evaluate(&DataValue::from(5)).unwrap().0);
        assert_eq!(check.describe(), "@V in_range [1,10]");

        let callable_check = Check::callable("between", callable(|_| Ok(true.into())), vec![1.into()], 1);
        assert_eq!(callable_check.describe(), "between(1, @V) is true");
    }

    #[test]
    fn test_call_by_tag_is_builtin() {
        assert_eq!(
            CheckDef::call("min_length").target,
            CheckDefTarget::With(With::MinLength)
        );
        assert_eq!(
            CheckDef::call("::is_isbn").target,
            CheckDefTarget::Call("::is_isbn".to_string())
        );
    }
}
