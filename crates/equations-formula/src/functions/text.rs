//! Text functions
//!
//! Positions and counts are in characters, not bytes.

use super::{arg, arg_integer, arg_text};
use crate::error::{FunctionError, FunctionResult};
use equations_core::{coerce, Value};

fn take_left(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn take_right(s: &str, n: usize) -> String {
    let len = s.chars().count();
    if n >= len {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

/// Optional non-negative count at `index`, 1 when absent
fn count_arg(args: &[Value], index: usize) -> FunctionResult<usize> {
    if args.len() <= index {
        return Ok(1);
    }
    let count = arg_integer(args, index)?;
    usize::try_from(count)
        .map_err(|_| FunctionError::argument(index + 1, "count must not be negative"))
}

/// CONCATENATE(values...)
pub fn fn_concatenate(args: &[Value]) -> FunctionResult<Value> {
    let mut result = String::new();
    for index in 0..args.len() {
        result.push_str(&arg_text(args, index)?);
    }
    Ok(Value::String(result))
}

/// LEFT(text, [count])
pub fn fn_left(args: &[Value]) -> FunctionResult<Value> {
    let text = arg_text(args, 0)?;
    let count = count_arg(args, 1)?;
    Ok(Value::String(take_left(&text, count)))
}

/// RIGHT(text, [count])
pub fn fn_right(args: &[Value]) -> FunctionResult<Value> {
    let text = arg_text(args, 0)?;
    let count = count_arg(args, 1)?;
    Ok(Value::String(take_right(&text, count)))
}

/// LEN(text)
pub fn fn_len(args: &[Value]) -> FunctionResult<Value> {
    let text = arg_text(args, 0)?;
    Ok(Value::Integer(text.chars().count() as i64))
}

/// LOWER(text)
pub fn fn_lower(args: &[Value]) -> FunctionResult<Value> {
    Ok(Value::String(arg_text(args, 0)?.to_lowercase()))
}

/// UPPER(text)
pub fn fn_upper(args: &[Value]) -> FunctionResult<Value> {
    Ok(Value::String(arg_text(args, 0)?.to_uppercase()))
}

/// MID(text, start, count)
///
/// `start` is 1-based. A count running past the end returns the rest of
/// the text.
pub fn fn_mid(args: &[Value]) -> FunctionResult<Value> {
    let text = arg_text(args, 0)?;
    let start = arg_integer(args, 1)?;
    let count = arg_integer(args, 2)?;

    if start < 1 {
        return Err(FunctionError::argument(2, "start must be at least 1"));
    }
    if count < 0 {
        return Err(FunctionError::argument(3, "count must not be negative"));
    }

    let skip = usize::try_from(start - 1).unwrap_or(usize::MAX);
    let take = usize::try_from(count).unwrap_or(usize::MAX);
    Ok(Value::String(text.chars().skip(skip).take(take).collect()))
}

/// SUBSTITUTE(text, old, new, [instance])
///
/// Without `instance` every occurrence is replaced; with it only the
/// nth (1-based) one.
pub fn fn_substitute(args: &[Value]) -> FunctionResult<Value> {
    let text = arg_text(args, 0)?;
    let old = arg_text(args, 1)?;
    let new = arg_text(args, 2)?;

    let instance = if args.len() > 3 {
        let instance = arg_integer(args, 3)?;
        if instance < 1 {
            return Err(FunctionError::argument(4, "instance must be at least 1"));
        }
        Some(instance as usize)
    } else {
        None
    };

    if old.is_empty() {
        return Ok(Value::String(text));
    }

    let result = match instance {
        None => text.replace(&old, &new),
        Some(n) => match text.match_indices(&old).nth(n - 1) {
            Some((pos, _)) => {
                let mut result = String::with_capacity(text.len());
                result.push_str(&text[..pos]);
                result.push_str(&new);
                result.push_str(&text[pos + old.len()..]);
                result
            }
            None => text,
        },
    };
    Ok(Value::String(result))
}

/// VALUE(text)
pub fn fn_value(args: &[Value]) -> FunctionResult<Value> {
    let value = arg(args, 0)?;
    coerce::to_float(value)
        .map(Value::Float)
        .map_err(|source| FunctionError::Conversion { ordinal: 1, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn s(text: &str) -> Value {
        Value::string(text)
    }

    #[test]
    fn test_left_right() {
        assert_eq!(fn_left(&[s("hello")]).unwrap(), s("h"));
        assert_eq!(fn_left(&[s("hello"), Value::Float(3.0)]).unwrap(), s("hel"));
        assert_eq!(fn_right(&[s("hello"), Value::Integer(2)]).unwrap(), s("lo"));
        assert_eq!(fn_right(&[s("hi"), Value::Integer(10)]).unwrap(), s("hi"));
        assert_eq!(
            fn_left(&[s("hello"), Value::Integer(-1)])
                .unwrap_err()
                .ordinal(),
            Some(2)
        );
    }

    #[test]
    fn test_mid() {
        let args = [s("abcdef"), Value::Float(2.0), Value::Float(3.0)];
        assert_eq!(fn_mid(&args).unwrap(), s("bcd"));

        let past_end = [s("abc"), Value::Integer(2), Value::Integer(10)];
        assert_eq!(fn_mid(&past_end).unwrap(), s("bc"));

        let bad_start = [s("abc"), Value::Integer(0), Value::Integer(1)];
        assert_eq!(fn_mid(&bad_start).unwrap_err().ordinal(), Some(2));

        let bad_count = [s("abc"), Value::Integer(1), Value::Integer(-1)];
        assert_eq!(fn_mid(&bad_count).unwrap_err().ordinal(), Some(3));
    }

    #[test]
    fn test_len_counts_characters() {
        assert_eq!(fn_len(&[s("héllo")]).unwrap(), Value::Integer(5));
        assert_eq!(fn_len(&[Value::Float(12.5)]).unwrap(), Value::Integer(4));
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(fn_upper(&[s("MiXed")]).unwrap(), s("MIXED"));
        assert_eq!(fn_lower(&[s("MiXed")]).unwrap(), s("mixed"));
    }

    #[test]
    fn test_substitute() {
        assert_eq!(
            fn_substitute(&[s("a-b-c"), s("-"), s("+")]).unwrap(),
            s("a+b+c")
        );
        assert_eq!(
            fn_substitute(&[s("a-b-c"), s("-"), s("+"), Value::Integer(2)]).unwrap(),
            s("a-b+c")
        );
        assert_eq!(
            fn_substitute(&[s("a-b-c"), s("-"), s("+"), Value::Integer(5)]).unwrap(),
            s("a-b-c")
        );
        assert_eq!(fn_substitute(&[s("abc"), s(""), s("x")]).unwrap(), s("abc"));
    }

    #[test]
    fn test_concatenate_and_value() {
        let args = [s("x"), Value::Float(1.0), Value::Boolean(true)];
        assert_eq!(fn_concatenate(&args).unwrap(), s("x1TRUE"));
        assert_eq!(fn_value(&[s(" 2.5")]).unwrap(), Value::Float(2.5));
        assert_eq!(fn_value(&[s("two")]).unwrap_err().ordinal(), Some(1));
        assert_eq!(fn_value(&[s("nan")]).unwrap_err().ordinal(), Some(1));
        assert_eq!(fn_value(&[s("inf")]).unwrap_err().ordinal(), Some(1));
    }
}
