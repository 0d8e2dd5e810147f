//! Equation interpreter
//!
//! Runs an [`Equation`]'s instructions on an operand stack. A run reads
//! only the equation, the bindings and the registry, so the same
//! equation can be evaluated concurrently with separate bindings.

use crate::ast::{BinaryOperator, StaticKind, UnaryOperator};
use crate::compiler::{CodeUnit, Equation, Instruction};
use crate::error::{EvalError, EvalResult};
use crate::functions::{builtin_registry, mismatch_message, FunctionRegistry};
use ahash::AHashMap;
use equations_core::{coerce, ConversionError, Kind, List, Value};
use std::cmp::Ordering;

/// Variable values for one evaluation
///
/// A name mapped to `None` is a known variable that currently has no
/// value; it behaves the same as a name that is absent.
#[derive(Debug, Clone, Default)]
pub struct RuntimeBinding {
    values: AHashMap<String, Option<Value>>,
}

impl RuntimeBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable's value
    pub fn set<S: Into<String>, V: Into<Value>>(&mut self, name: S, value: V) {
        self.values.insert(name.into(), Some(value.into()));
    }

    /// Mark a variable as known but not set
    pub fn unset<S: Into<String>>(&mut self, name: S) {
        self.values.insert(name.into(), None);
    }

    /// Builder form of [`set`](Self::set)
    pub fn with<S: Into<String>, V: Into<Value>>(mut self, name: S, value: V) -> Self {
        self.set(name, value);
        self
    }

    /// The value of a variable, if it is set
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).and_then(Option::as_ref)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Evaluate against the built-in registry
pub fn evaluate(equation: &Equation, bindings: &RuntimeBinding) -> EvalResult<Value> {
    Interpreter::new(builtin_registry()).run(equation, bindings)
}

/// Runs equations against a function registry
pub struct Interpreter<'r> {
    registry: &'r FunctionRegistry,
}

impl<'r> Interpreter<'r> {
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Run `equation` to completion and return its single result
    pub fn run(&self, equation: &Equation, bindings: &RuntimeBinding) -> EvalResult<Value> {
        let mut machine = Machine {
            registry: self.registry,
            equation,
            bindings,
            ip: 0,
            stack: Vec::with_capacity(8),
        };
        machine.run()
    }
}

/// Execution state of one run
struct Machine<'a> {
    registry: &'a FunctionRegistry,
    equation: &'a Equation,
    bindings: &'a RuntimeBinding,
    ip: usize,
    stack: Vec<Value>,
}

impl<'a> Machine<'a> {
    fn run(&mut self) -> EvalResult<Value> {
        let code = self.equation.code();
        while let Some(unit) = code.get(self.ip) {
            tracing::trace!(
                ip = self.ip,
                depth = self.stack.len(),
                instruction = %unit.instruction,
                "step"
            );
            self.step(unit)?;
            self.ip += 1;
        }

        let result = self.pop()?;
        if !self.stack.is_empty() {
            return Err(EvalError::MalformedProgram(format!(
                "{} values left on the stack",
                self.stack.len() + 1
            )));
        }
        Ok(result)
    }

    fn step(&mut self, unit: &CodeUnit) -> EvalResult<()> {
        let offset = unit.offset;
        let value = match &unit.instruction {
            Instruction::PushLiteral(value) => value.clone(),
            Instruction::LoadVariable { name, kind } => self.load(name, *kind, offset)?,
            Instruction::Unary(op) => {
                let operand = self.pop()?;
                unary(*op, &operand, offset)?
            }
            Instruction::Binary(op) => {
                let right = self.pop()?;
                let left = self.pop()?;
                binary(*op, &left, &right, offset)?
            }
            Instruction::Call { name, arity } => self.call(name, *arity, offset)?,
        };
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> EvalResult<Value> {
        self.stack
            .pop()
            .ok_or_else(|| EvalError::MalformedProgram(format!("stack underflow at {}", self.ip)))
    }

    fn load(&self, name: &str, kind: Kind, offset: usize) -> EvalResult<Value> {
        match self.bindings.get(name) {
            Some(value) => bind(name, value, kind, offset),
            None => self.equation.default_value(name).cloned().ok_or_else(|| {
                EvalError::UndefinedVariable {
                    name: name.to_string(),
                    offset,
                }
            }),
        }
    }

    fn call(&mut self, name: &str, arity: usize, offset: usize) -> EvalResult<Value> {
        let start = self.stack.len().checked_sub(arity).ok_or_else(|| {
            EvalError::MalformedProgram(format!("{name} needs {arity} arguments on the stack"))
        })?;
        let args = self.stack.split_off(start);

        let function = self
            .registry
            .lookup(name)
            .ok_or_else(|| EvalError::UnknownFunction {
                name: name.to_string(),
                offset,
            })?;

        // Argument kinds may only be known now (Dynamic at compile time)
        let kinds: Vec<StaticKind> = args.iter().map(|arg| arg.kind().into()).collect();
        let expected = function
            .check_args(&kinds)
            .map_err(|mismatch| EvalError::TypeMismatch {
                message: mismatch_message(function, &mismatch),
                offset,
            })?;

        let result = function
            .evaluate(&args)
            .map_err(|source| EvalError::Function {
                function: name.to_string(),
                source,
                offset,
            })?;

        if let StaticKind::Known(declared) = expected {
            if result.kind() != declared {
                return Err(EvalError::InternalConsistency {
                    function: name.to_string(),
                    declared,
                    actual: result.kind(),
                    offset,
                });
            }
        }
        Ok(result)
    }
}

/// Bring a bound value to the variable's declared kind. Only integer to
/// float widening is implicit.
fn bind(name: &str, value: &Value, kind: Kind, offset: usize) -> EvalResult<Value> {
    match (value, kind) {
        (value, kind) if value.kind() == kind => Ok(value.clone()),
        (Value::Integer(n), Kind::Float) => Ok(Value::Float(*n as f64)),
        (Value::List(list @ List::Integer(_)), Kind::FloatList) => {
            Ok(Value::List(list.clone().widen()))
        }
        _ => Err(EvalError::TypeMismatch {
            message: format!(
                "${{{name}}} is declared {kind} but is bound to a {}",
                value.kind()
            ),
            offset,
        }),
    }
}

fn reject_list(symbol: &str, operand: &Value, offset: usize) -> EvalResult<()> {
    if operand.is_list() {
        return Err(EvalError::TypeMismatch {
            message: format!("Operator {symbol} cannot be applied to a {}", operand.kind()),
            offset,
        });
    }
    Ok(())
}

fn number(value: &Value, offset: usize) -> EvalResult<f64> {
    coerce::to_float(value).map_err(|source| conversion(source, offset))
}

fn conversion(source: ConversionError, offset: usize) -> EvalError {
    EvalError::Conversion { source, offset }
}

fn unary(op: UnaryOperator, operand: &Value, offset: usize) -> EvalResult<Value> {
    reject_list(op.symbol(), operand, offset)?;
    let n = number(operand, offset)?;
    Ok(Value::Float(match op {
        UnaryOperator::Plus => n,
        UnaryOperator::Negate => -n,
    }))
}

fn binary(op: BinaryOperator, left: &Value, right: &Value, offset: usize) -> EvalResult<Value> {
    reject_list(op.symbol(), left, offset)?;
    reject_list(op.symbol(), right, offset)?;

    if op.is_arithmetic() {
        let l = number(left, offset)?;
        let r = number(right, offset)?;
        let result = match op {
            BinaryOperator::Add => l + r,
            BinaryOperator::Subtract => l - r,
            BinaryOperator::Multiply => l * r,
            BinaryOperator::Divide => {
                if r == 0.0 {
                    return Err(EvalError::Arithmetic {
                        message: "division by zero".to_string(),
                        offset,
                    });
                }
                l / r
            }
            _ => l.powf(r),
        };
        if !result.is_finite() {
            return Err(EvalError::Arithmetic {
                message: format!("{} {op} {} is not a finite number", left, right),
                offset,
            });
        }
        return Ok(Value::Float(result));
    }

    if op == BinaryOperator::Concat {
        let mut text = coerce::to_text(left).map_err(|e| conversion(e, offset))?;
        text.push_str(&coerce::to_text(right).map_err(|e| conversion(e, offset))?);
        return Ok(Value::String(text));
    }

    // Unordered (NaN) operands are only ever "not equal"
    let ordering = coerce::compare_values(left, right);
    let result = match (op, ordering) {
        (BinaryOperator::NotEqual, None) => true,
        (_, None) => false,
        (BinaryOperator::Equal, Some(o)) => o == Ordering::Equal,
        (BinaryOperator::NotEqual, Some(o)) => o != Ordering::Equal,
        (BinaryOperator::LessThan, Some(o)) => o == Ordering::Less,
        (BinaryOperator::LessEqual, Some(o)) => o != Ordering::Greater,
        (BinaryOperator::GreaterThan, Some(o)) => o == Ordering::Greater,
        (_, Some(o)) => o != Ordering::Less,
    };
    Ok(Value::Boolean(result))
}
