//! List functions
//!
//! Constructors build a homogeneous list from any mix of scalars and
//! lists; accessors return one element, so their result kind is the
//! element kind of the list argument.

use super::{arg, arg_integer, arg_text};
use crate::ast::StaticKind;
use crate::error::{FunctionError, FunctionResult};
use equations_core::{coerce, Kind, List, Value};

fn build(args: &[Value], kind: Kind) -> FunctionResult<Value> {
    Ok(Value::List(coerce::flatten(args, kind)?))
}

/// FLIST([values...])
pub fn fn_flist(args: &[Value]) -> FunctionResult<Value> {
    build(args, Kind::FloatList)
}

/// ILIST([values...])
pub fn fn_ilist(args: &[Value]) -> FunctionResult<Value> {
    build(args, Kind::IntegerList)
}

/// SLIST([values...])
pub fn fn_slist(args: &[Value]) -> FunctionResult<Value> {
    build(args, Kind::StringList)
}

/// BLIST([values...])
pub fn fn_blist(args: &[Value]) -> FunctionResult<Value> {
    build(args, Kind::BooleanList)
}

fn list_arg(args: &[Value], index: usize) -> FunctionResult<&List> {
    arg(args, index)?
        .as_list()
        .ok_or_else(|| FunctionError::argument(index + 1, "expected a list"))
}

/// FIRST(list)
pub fn fn_first(args: &[Value]) -> FunctionResult<Value> {
    list_arg(args, 0)?
        .get(0)
        .ok_or_else(|| FunctionError::argument(1, "list is empty"))
}

/// LAST(list)
pub fn fn_last(args: &[Value]) -> FunctionResult<Value> {
    let list = list_arg(args, 0)?;
    list.len()
        .checked_sub(1)
        .and_then(|last| list.get(last))
        .ok_or_else(|| FunctionError::argument(1, "list is empty"))
}

/// NTH(list, position) - position is 1-based
pub fn fn_nth(args: &[Value]) -> FunctionResult<Value> {
    let list = list_arg(args, 0)?;
    let position = arg_integer(args, 1)?;
    if position < 1 {
        return Err(FunctionError::argument(2, "position must be at least 1"));
    }
    list.get((position - 1) as usize).ok_or_else(|| {
        FunctionError::argument(
            2,
            format!("position {position} is past the end of a list of {}", list.len()),
        )
    })
}

/// LISTTOSTRING(list, separator)
pub fn fn_list_to_string(args: &[Value]) -> FunctionResult<Value> {
    let list = list_arg(args, 0)?;
    let separator = arg_text(args, 1)?;
    let parts: Vec<String> = list.values().map(|v| coerce::scalar_text(&v)).collect();
    Ok(Value::String(parts.join(&separator)))
}

/// Element accessors return the element kind of their list argument
pub fn resolve_element(arg_kinds: &[StaticKind]) -> StaticKind {
    match arg_kinds.first() {
        Some(StaticKind::Known(kind)) if kind.is_list() => StaticKind::Known(kind.element()),
        _ => StaticKind::Dynamic,
    }
}
