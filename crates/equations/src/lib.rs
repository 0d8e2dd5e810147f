//! # equations
//!
//! A small typed formula language for computing values from named
//! variables.
//!
//! Equations are text such as `=MID(${name}, 2, 3) & "!"`. They are
//! compiled once against the kinds of the variables they reference and
//! then evaluated any number of times against runtime bindings.
//!
//! ## Features
//!
//! - Static typing: kind errors are reported at compile time with an offset
//! - 40 built-in functions (math, statistics, text, logic, lists)
//! - Pluggable functions through the [`Function`] trait
//! - A thread-safe [`EquationCache`] for repeated evaluation
//!
//! ## Example
//!
//! ```rust
//! use equations::prelude::*;
//!
//! let mut types = VariableTypes::new();
//! types.insert("BOB".to_string(), Kind::Float);
//!
//! let cache = EquationCache::default();
//! let bindings = RuntimeBinding::new().with("BOB", -10.0);
//! let value = cache
//!     .evaluate("=42 - 12 + 3*(4-2) + ${BOB:12}", &types, &bindings)
//!     .unwrap();
//! assert_eq!(value, Value::Float(26.0));
//! ```

mod cache;
mod error;
pub mod prelude;

pub use cache::{CacheOptions, CacheStats, EquationCache};
pub use error::{Error, Result};

// Re-export core types
pub use equations_core::{coerce, ConversionError, FlattenError, Kind, KindSet, List, Value};

// Re-export formula types
pub use equations_formula::{
    builtin_registry, compile, evaluate, ArgDescriptor, Builtin, CompileError, CompileResult,
    Compiler, Equation, EvalError, EvalResult, Function, FunctionError, FunctionRegistry,
    FunctionResult, Instruction, Interpreter, RegistryError, RuntimeBinding, StaticKind,
    VariableTypes, MAX_NESTING,
};

/// Compile `text` against the built-in functions and evaluate it once
///
/// Use an [`EquationCache`] when the same text is evaluated repeatedly.
pub fn compile_and_evaluate(
    text: &str,
    var_types: &VariableTypes,
    bindings: &RuntimeBinding,
) -> Result<Value> {
    let equation = compile(text, var_types)?;
    Ok(evaluate(&equation, bindings)?)
}
