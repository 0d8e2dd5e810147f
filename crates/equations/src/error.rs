//! Error type for the one-call compile-and-evaluate API

use equations_formula::{CompileError, EvalError};
use thiserror::Error;

/// Result type for equations operations
pub type Result<T> = std::result::Result<T, Error>;

/// Either stage of compile-then-evaluate failed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The text did not compile
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// The equation compiled but could not be evaluated
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

impl Error {
    /// Byte offset into the equation text, if known
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Compile(err) => Some(err.offset),
            Error::Eval(err) => err.offset(),
        }
    }
}
