//! Math functions

use super::{arg_float, arg_integer, finite};
use crate::error::{FunctionError, FunctionResult};
use equations_core::{coerce, Value};

/// ABS(number)
pub fn fn_abs(args: &[Value]) -> FunctionResult<Value> {
    Ok(Value::Float(arg_float(args, 0)?.abs()))
}

/// EXP(number)
pub fn fn_exp(args: &[Value]) -> FunctionResult<Value> {
    finite(arg_float(args, 0)?.exp(), "EXP result")
}

/// LN(number) - natural logarithm, number must be positive
pub fn fn_ln(args: &[Value]) -> FunctionResult<Value> {
    let number = arg_float(args, 0)?;
    if number <= 0.0 {
        return Err(FunctionError::arithmetic(
            "logarithm of a non-positive number",
        ));
    }
    Ok(Value::Float(number.ln()))
}

/// LOG(number, [base])
pub fn fn_log(args: &[Value]) -> FunctionResult<Value> {
    let number = arg_float(args, 0)?;
    let base = if args.len() > 1 {
        arg_float(args, 1)?
    } else {
        10.0
    };

    if number <= 0.0 {
        return Err(FunctionError::arithmetic(
            "logarithm of a non-positive number",
        ));
    }
    if base <= 0.0 || base == 1.0 {
        return Err(FunctionError::argument(
            2,
            "base must be positive and not 1",
        ));
    }
    let result = if base == 10.0 {
        number.log10()
    } else {
        number.log(base)
    };
    Ok(Value::Float(result))
}

/// MOD(dividend, divisor)
///
/// The result has the sign of the divisor: `MOD(-3, 2)` is 1.
pub fn fn_mod(args: &[Value]) -> FunctionResult<Value> {
    let dividend = arg_float(args, 0)?;
    let divisor = arg_float(args, 1)?;
    if divisor == 0.0 {
        return Err(FunctionError::arithmetic("division by zero"));
    }
    finite(dividend - divisor * (dividend / divisor).floor(), "MOD result")
}

/// PI()
pub fn fn_pi(_args: &[Value]) -> FunctionResult<Value> {
    Ok(Value::Float(std::f64::consts::PI))
}

/// PRODUCT(numbers...)
pub fn fn_product(args: &[Value]) -> FunctionResult<Value> {
    let numbers = coerce::flatten_floats(args)?;
    finite(numbers.iter().product(), "PRODUCT result")
}

/// ROUND(number, [digits])
///
/// Rounds half away from zero. Negative `digits` round to the left of the
/// decimal point.
pub fn fn_round(args: &[Value]) -> FunctionResult<Value> {
    let number = arg_float(args, 0)?;
    let digits = if args.len() > 1 {
        arg_integer(args, 1)?
    } else {
        0
    };

    if !(-308..=308).contains(&digits) {
        return Err(FunctionError::argument(2, "digits out of range"));
    }

    let factor = 10f64.powi(digits.unsigned_abs() as i32);
    if digits >= 0 {
        let scaled = number * factor;
        if !scaled.is_finite() {
            // f64 has no digits left at this scale
            return Ok(Value::Float(number));
        }
        Ok(Value::Float(scaled.round() / factor))
    } else {
        Ok(Value::Float((number / factor).round() * factor))
    }
}

/// SIGN(number)
pub fn fn_sign(args: &[Value]) -> FunctionResult<Value> {
    let number = arg_float(args, 0)?;
    let sign = if number > 0.0 {
        1.0
    } else if number < 0.0 {
        -1.0
    } else {
        0.0
    };
    Ok(Value::Float(sign))
}

/// SQRT(number)
pub fn fn_sqrt(args: &[Value]) -> FunctionResult<Value> {
    let number = arg_float(args, 0)?;
    if number < 0.0 {
        return Err(FunctionError::arithmetic(
            "square root of a negative number",
        ));
    }
    Ok(Value::Float(number.sqrt()))
}

/// SUM(numbers...)
pub fn fn_sum(args: &[Value]) -> FunctionResult<Value> {
    let numbers = coerce::flatten_floats(args)?;
    finite(coerce::numerically_safe_sum(&numbers), "SUM result")
}

/// TRUNC(number)
pub fn fn_trunc(args: &[Value]) -> FunctionResult<Value> {
    Ok(Value::Float(arg_float(args, 0)?.trunc()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_mixes_scalars_and_lists() {
        let args = vec![
            Value::Float(1.0),
            Value::Integer(2),
            Value::from(vec![3.0, 4.0]),
            Value::Boolean(true),
        ];
        assert_eq!(fn_sum(&args).unwrap(), Value::Float(11.0));
    }

    #[test]
    fn test_sum_is_precise() {
        let args = vec![Value::from(vec![1e16, 1.0, -1e16])];
        assert_eq!(fn_sum(&args).unwrap(), Value::Float(1.0));
    }

    #[test]
    fn test_round() {
        assert_eq!(fn_round(&[Value::Float(2.5)]).unwrap(), Value::Float(3.0));
        assert_eq!(fn_round(&[Value::Float(-2.5)]).unwrap(), Value::Float(-3.0));
        assert_eq!(
            fn_round(&[Value::Float(3.14159), Value::Integer(2)]).unwrap(),
            Value::Float(3.14)
        );
        assert_eq!(
            fn_round(&[Value::Float(1234.0), Value::Float(-2.0)]).unwrap(),
            Value::Float(1200.0)
        );
    }

    #[test]
    fn test_mod_sign_follows_divisor() {
        assert_eq!(
            fn_mod(&[Value::Float(-3.0), Value::Float(2.0)]).unwrap(),
            Value::Float(1.0)
        );
        assert_eq!(
            fn_mod(&[Value::Float(3.0), Value::Float(-2.0)]).unwrap(),
            Value::Float(-1.0)
        );
        assert!(matches!(
            fn_mod(&[Value::Float(3.0), Value::Float(0.0)]),
            Err(FunctionError::Arithmetic(_))
        ));
    }

    #[test]
    fn test_domain_errors() {
        assert!(matches!(
            fn_ln(&[Value::Float(-1.0)]),
            Err(FunctionError::Arithmetic(_))
        ));
        assert!(matches!(
            fn_sqrt(&[Value::Float(-4.0)]),
            Err(FunctionError::Arithmetic(_))
        ));
        assert_eq!(
            fn_log(&[Value::Float(8.0), Value::Float(1.0)])
                .unwrap_err()
                .ordinal(),
            Some(2)
        );
    }

    #[test]
    fn test_log_defaults_to_base_ten() {
        assert_eq!(fn_log(&[Value::Float(1000.0)]).unwrap(), Value::Float(3.0));
        let Value::Float(log2) = fn_log(&[Value::Float(8.0), Value::Float(2.0)]).unwrap() else {
            panic!("Expected Float");
        };
        assert!((log2 - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_sign_and_trunc() {
        assert_eq!(fn_sign(&[Value::Integer(-7)]).unwrap(), Value::Float(-1.0));
        assert_eq!(fn_sign(&[Value::Float(0.0)]).unwrap(), Value::Float(0.0));
        assert_eq!(fn_trunc(&[Value::Float(-2.7)]).unwrap(), Value::Float(-2.0));
    }
}
