//! Prelude module - common imports for equations users
//!
//! ```rust
//! use equations::prelude::*;
//! ```

pub use crate::{
    // Cache
    CacheOptions,
    CacheStats,
    // Errors
    CompileError,
    Equation,
    EquationCache,
    Error,
    EvalError,
    // Functions
    Function,
    FunctionError,
    FunctionRegistry,
    // Values
    Kind,
    List,
    Result,
    // Compile and run
    RuntimeBinding,
    Value,
    VariableTypes,
};
