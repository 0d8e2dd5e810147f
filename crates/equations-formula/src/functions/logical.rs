//! Logical functions

use super::arg_boolean;
use crate::ast::StaticKind;
use crate::error::FunctionResult;
use equations_core::{coerce, Value};

/// IF(condition, if_true, if_false)
///
/// Both branches have already been evaluated; this only selects one.
pub fn fn_if(args: &[Value]) -> FunctionResult<Value> {
    let condition = arg_boolean(args, 0)?;
    let index = if condition { 1 } else { 2 };
    Ok(super::arg(args, index)?.clone())
}

/// IF has a known kind only when both branches agree
pub fn resolve_if(arg_kinds: &[StaticKind]) -> StaticKind {
    match (arg_kinds.get(1), arg_kinds.get(2)) {
        (Some(StaticKind::Known(a)), Some(StaticKind::Known(b))) if a == b => {
            StaticKind::Known(*a)
        }
        _ => StaticKind::Dynamic,
    }
}

/// AND(conditions...)
pub fn fn_and(args: &[Value]) -> FunctionResult<Value> {
    let conditions = coerce::flatten_booleans(args)?;
    Ok(Value::Boolean(conditions.iter().all(|c| *c)))
}

/// OR(conditions...)
pub fn fn_or(args: &[Value]) -> FunctionResult<Value> {
    let conditions = coerce::flatten_booleans(args)?;
    Ok(Value::Boolean(conditions.iter().any(|c| *c)))
}

/// NOT(condition)
pub fn fn_not(args: &[Value]) -> FunctionResult<Value> {
    Ok(Value::Boolean(!arg_boolean(args, 0)?))
}
