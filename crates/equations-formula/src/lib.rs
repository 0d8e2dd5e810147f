//! # equations-formula
//!
//! Equation compiler and interpreter.
//!
//! This crate provides:
//! - Equation parsing with static typing (text → typed AST)
//! - Compilation to a linear stack program ([`Equation`])
//! - A stack-machine interpreter (equation + bindings → value)
//! - The [`Function`] contract, a case-insensitive registry and the
//!   built-in function library
//!
//! ## Example
//!
//! ```rust
//! use equations_core::{Kind, Value};
//! use equations_formula::{compile, evaluate, RuntimeBinding, VariableTypes};
//!
//! let mut types = VariableTypes::new();
//! types.insert("s1".to_string(), Kind::String);
//!
//! let equation = compile("=\"Fred\"&${s1}", &types).unwrap();
//! let bindings = RuntimeBinding::new().with("s1", "Bob");
//! assert_eq!(evaluate(&equation, &bindings).unwrap(), Value::string("FredBob"));
//! ```

pub mod ast;
pub mod compiler;
pub mod error;
pub mod functions;
pub mod interpreter;
pub mod parser;

pub use ast::{BinaryOperator, Expr, Node, StaticKind, UnaryOperator};
pub use compiler::{compile, CodeUnit, Compiler, Equation, Instruction};
pub use error::{
    ArgMismatch, CompileError, CompileResult, EvalError, EvalResult, FunctionError,
    FunctionResult, RegistryError,
};
pub use functions::{builtin_registry, ArgDescriptor, Builtin, Function, FunctionRegistry};
pub use interpreter::{evaluate, Interpreter, RuntimeBinding};
pub use parser::{parse_equation, VariableTypes, MAX_NESTING};
