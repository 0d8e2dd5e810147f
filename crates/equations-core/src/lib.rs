//! # equations-core
//!
//! Value types and coercion rules for the equations formula engine.
//!
//! This crate provides:
//! - [`Kind`] and [`KindSet`] - the closed set of value shapes
//! - [`Value`] and [`List`] - scalar and homogeneous list values
//! - [`coerce`] - conversions between kinds, flattening, ordering and
//!   precision-preserving summation
//!
//! ## Example
//!
//! ```rust
//! use equations_core::{coerce, Value};
//!
//! let args = vec![Value::Float(1.0), Value::from(vec![2_i64, 3])];
//! let numbers = coerce::flatten_floats(&args).unwrap();
//! assert_eq!(coerce::numerically_safe_sum(&numbers), 6.0);
//! ```

pub mod coerce;
pub mod error;
pub mod kind;
pub mod value;

// Re-exports for convenience
pub use error::{ConversionError, ConversionResult, FlattenError};
pub use kind::{Kind, KindSet};
pub use value::{List, Value};
