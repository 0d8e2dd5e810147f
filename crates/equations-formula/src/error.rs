//! Equation error types
//!
//! Compile-time and run-time failures are disjoint: [`CompileError`] is
//! produced before any code exists, [`EvalError`] only while running an
//! [`Equation`](crate::Equation).

use crate::ast::StaticKind;
use equations_core::{ConversionError, FlattenError, Kind};
use thiserror::Error;

/// Result type for compilation
pub type CompileResult<T> = std::result::Result<T, CompileError>;

/// Result type for evaluation
pub type EvalResult<T> = std::result::Result<T, EvalError>;

/// Result type for built-in function bodies
pub type FunctionResult<T> = std::result::Result<T, FunctionError>;

/// Syntax, reference or type error found while compiling
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (at offset {offset})")]
pub struct CompileError {
    /// Human-readable description
    pub message: String,
    /// Byte offset into the equation text
    pub offset: usize,
}

impl CompileError {
    pub fn new<S: Into<String>>(message: S, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Errors that can occur while running an equation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Variable is not set and has no default
    #[error("Undefined variable: ${{{name}}}")]
    UndefinedVariable { name: String, offset: usize },

    /// A value of the wrong kind reached an operator, variable or call
    #[error("Type error: {message}")]
    TypeMismatch { message: String, offset: usize },

    /// A value could not be converted
    #[error("{source}")]
    Conversion {
        #[source]
        source: ConversionError,
        offset: usize,
    },

    /// Division by zero, domain error, overflow
    #[error("Arithmetic error: {message}")]
    Arithmetic { message: String, offset: usize },

    /// Function name no longer resolves in the registry in use
    #[error("Unknown function: {name}")]
    UnknownFunction { name: String, offset: usize },

    /// A built-in function rejected its arguments
    #[error("{function}: {source}")]
    Function {
        function: String,
        #[source]
        source: FunctionError,
        offset: usize,
    },

    /// A function produced a value of a different kind than it declared.
    /// This is a defect in the function, not in the equation.
    #[error("Internal error: {function} should return {declared} but produced {actual}")]
    InternalConsistency {
        function: String,
        declared: Kind,
        actual: Kind,
        offset: usize,
    },

    /// The instruction sequence left the operand stack in an invalid state
    #[error("Malformed program: {0}")]
    MalformedProgram(String),
}

impl EvalError {
    /// Byte offset of the construct that failed, if known
    pub fn offset(&self) -> Option<usize> {
        match self {
            EvalError::UndefinedVariable { offset, .. }
            | EvalError::TypeMismatch { offset, .. }
            | EvalError::Conversion { offset, .. }
            | EvalError::Arithmetic { offset, .. }
            | EvalError::UnknownFunction { offset, .. }
            | EvalError::Function { offset, .. }
            | EvalError::InternalConsistency { offset, .. } => Some(*offset),
            EvalError::MalformedProgram(_) => None,
        }
    }

    /// Check if this error indicates a defect rather than bad input
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            EvalError::InternalConsistency { .. } | EvalError::MalformedProgram(_)
        )
    }
}

/// Failure reported by a function body
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    /// Division by zero, domain error, empty input
    #[error("{0}")]
    Arithmetic(String),

    /// An argument has an unusable value (not a wrong type)
    #[error("argument {ordinal}: {message}")]
    Argument { ordinal: usize, message: String },

    /// An argument could not be converted
    #[error("argument {ordinal}: {source}")]
    Conversion {
        ordinal: usize,
        #[source]
        source: ConversionError,
    },
}

impl FunctionError {
    pub fn arithmetic<S: Into<String>>(message: S) -> Self {
        FunctionError::Arithmetic(message.into())
    }

    /// `ordinal` is 1-based
    pub fn argument<S: Into<String>>(ordinal: usize, message: S) -> Self {
        FunctionError::Argument {
            ordinal,
            message: message.into(),
        }
    }

    /// 1-based ordinal of the offending argument, if any
    pub fn ordinal(&self) -> Option<usize> {
        match self {
            FunctionError::Arithmetic(_) => None,
            FunctionError::Argument { ordinal, .. } | FunctionError::Conversion { ordinal, .. } => {
                Some(*ordinal)
            }
        }
    }
}

impl From<FlattenError> for FunctionError {
    fn from(err: FlattenError) -> Self {
        FunctionError::Conversion {
            ordinal: err.index + 1,
            source: err.source,
        }
    }
}

/// Actual argument kinds do not fit a function's descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArgMismatch {
    #[error("expected at least {expected} argument(s), got {actual}")]
    TooFew { expected: usize, actual: usize },

    #[error("expected at most {max} argument(s), got {actual}")]
    TooMany { max: usize, actual: usize },

    #[error("argument {ordinal} has the wrong type ({found})")]
    WrongKind { ordinal: usize, found: StaticKind },
}

/// A function could not be registered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Invalid signature for {function}: {message}")]
    InvalidSignature { function: String, message: String },
}
