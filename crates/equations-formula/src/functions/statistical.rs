//! Statistical functions
//!
//! Every function here flattens its arguments into one float array first,
//! so `AVERAGE(1, FLIST(2, 3))` averages three numbers.

use super::finite;
use crate::error::{FunctionError, FunctionResult};
use equations_core::{coerce, Value};

fn non_empty(args: &[Value], what: &str) -> FunctionResult<Vec<f64>> {
    let numbers = coerce::flatten_floats(args)?;
    if numbers.is_empty() {
        return Err(FunctionError::arithmetic(format!("{what} of no numbers")));
    }
    Ok(numbers)
}

fn mean(numbers: &[f64]) -> f64 {
    coerce::numerically_safe_sum(numbers) / numbers.len() as f64
}

/// Sample variance, needs at least two numbers
fn sample_variance(numbers: &[f64]) -> FunctionResult<f64> {
    if numbers.len() < 2 {
        return Err(FunctionError::arithmetic(
            "sample variance needs at least two numbers",
        ));
    }
    let mean = mean(numbers);
    let squares: Vec<f64> = numbers.iter().map(|x| (x - mean) * (x - mean)).collect();
    Ok(coerce::numerically_safe_sum(&squares) / (numbers.len() - 1) as f64)
}

/// AVERAGE(numbers...)
pub fn fn_average(args: &[Value]) -> FunctionResult<Value> {
    let numbers = non_empty(args, "average")?;
    finite(mean(&numbers), "AVERAGE result")
}

/// COUNT(numbers...)
pub fn fn_count(args: &[Value]) -> FunctionResult<Value> {
    let numbers = coerce::flatten_floats(args)?;
    Ok(Value::Integer(numbers.len() as i64))
}

/// MAX(numbers...)
pub fn fn_max(args: &[Value]) -> FunctionResult<Value> {
    let numbers = non_empty(args, "maximum")?;
    Ok(Value::Float(
        numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    ))
}

/// MIN(numbers...)
pub fn fn_min(args: &[Value]) -> FunctionResult<Value> {
    let numbers = non_empty(args, "minimum")?;
    Ok(Value::Float(
        numbers.iter().copied().fold(f64::INFINITY, f64::min),
    ))
}

/// MEDIAN(numbers...)
///
/// The mean of the two middle values when the count is even.
pub fn fn_median(args: &[Value]) -> FunctionResult<Value> {
    let mut numbers = non_empty(args, "median")?;
    numbers.sort_by(f64::total_cmp);

    let mid = numbers.len() / 2;
    let median = if numbers.len() % 2 == 0 {
        (numbers[mid - 1] + numbers[mid]) / 2.0
    } else {
        numbers[mid]
    };
    Ok(Value::Float(median))
}

/// STDEV(numbers...) - sample standard deviation
pub fn fn_stdev(args: &[Value]) -> FunctionResult<Value> {
    let numbers = coerce::flatten_floats(args)?;
    finite(sample_variance(&numbers)?.sqrt(), "STDEV result")
}

/// VAR(numbers...) - sample variance
pub fn fn_var(args: &[Value]) -> FunctionResult<Value> {
    let numbers = coerce::flatten_floats(args)?;
    finite(sample_variance(&numbers)?, "VAR result")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> Vec<Value> {
        vec![Value::from(values.to_vec())]
    }

    #[test]
    fn test_average() {
        let args = vec![Value::Integer(1), Value::from(vec![2.0, 3.0])];
        assert_eq!(fn_average(&args).unwrap(), Value::Float(2.0));
        assert!(matches!(
            fn_average(&numbers(&[])),
            Err(FunctionError::Arithmetic(_))
        ));
    }

    #[test]
    fn test_count_returns_integer() {
        let args = vec![Value::Float(1.0), Value::from(vec![1_i64, 2, 3])];
        assert_eq!(fn_count(&args).unwrap(), Value::Integer(4));
        assert_eq!(fn_count(&numbers(&[])).unwrap(), Value::Integer(0));
    }

    #[test]
    fn test_min_max() {
        let args = numbers(&[3.0, -1.5, 7.25, 0.0]);
        assert_eq!(fn_max(&args).unwrap(), Value::Float(7.25));
        assert_eq!(fn_min(&args).unwrap(), Value::Float(-1.5));
        assert!(fn_max(&[]).is_err());
    }

    #[test]
    fn test_median() {
        assert_eq!(
            fn_median(&numbers(&[5.0, 1.0, 3.0])).unwrap(),
            Value::Float(3.0)
        );
        assert_eq!(
            fn_median(&numbers(&[4.0, 1.0, 3.0, 2.0])).unwrap(),
            Value::Float(2.5)
        );
    }

    #[test]
    fn test_sample_variance_and_stdev() {
        let args = numbers(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        // mean 5, squared deviations sum to 32, n - 1 = 7
        assert_eq!(fn_var(&args).unwrap(), Value::Float(32.0 / 7.0));
        assert_eq!(
            fn_stdev(&args).unwrap(),
            Value::Float((32.0f64 / 7.0).sqrt())
        );
        assert!(matches!(
            fn_var(&numbers(&[1.0])),
            Err(FunctionError::Arithmetic(_))
        ));
    }

    #[test]
    fn test_conversion_error_reports_argument() {
        let args = vec![Value::Float(1.0), Value::string("many")];
        assert_eq!(fn_average(&args).unwrap_err().ordinal(), Some(2));
    }
}
