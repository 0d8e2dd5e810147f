//! Error types for equations-core

use crate::kind::Kind;
use thiserror::Error;

/// Result type alias for value conversions
pub type ConversionResult<T> = std::result::Result<T, ConversionError>;

/// A value could not be converted to the requested kind
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Cannot convert {value} to {target}")]
pub struct ConversionError {
    /// Rendering of the original value
    pub value: String,
    /// Kind that was requested
    pub target: Kind,
}

impl ConversionError {
    pub fn new<S: Into<String>>(value: S, target: Kind) -> Self {
        Self {
            value: value.into(),
            target,
        }
    }
}

/// A conversion failed while flattening a list of arguments
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Argument {} cannot be used: {source}", .index + 1)]
pub struct FlattenError {
    /// Zero-based index of the top-level argument that failed
    pub index: usize,
    /// The underlying conversion failure
    #[source]
    pub source: ConversionError,
}
