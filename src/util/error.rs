//! Error types for the FBX object graph.

use thiserror::Error;

use crate::core::{ObjectHandle, ObjectType};

/// Main error type for object-graph operations.
///
/// Only programmatic misuse of the mutation API ends up here. Anomalies found
/// while decoding a file are tolerated and replaced by defaults instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Object belongs to a different scene than the one being mutated
    #[error("Object {0:?} belongs to a different scene")]
    CrossScene(ObjectHandle),

    /// A model cannot be its own child
    #[error("Cannot add a model as a child of itself")]
    SelfReference,

    /// Positional insert or removal outside the valid range
    #[error("Index {index} out of range (count: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Polygon with fewer than three corners
    #[error("Polygon has {count} indices, at least 3 are required")]
    PolygonTooSmall { count: usize },

    /// Polygon size below three for flat index ingestion
    #[error("Minimum number of indices per polygon is 3, got {0}")]
    InvalidArity(usize),

    /// Flat index buffer cannot be split evenly
    #[error("Cannot divide {len} indices into polygons of {arity}")]
    IndexBufferNotDivisible { len: usize, arity: usize },

    /// Node attribute type differs from the model type
    #[error("Node attribute of type {attribute:?} cannot be attached to a {model:?} model")]
    AttributeTypeMismatch { model: ObjectType, attribute: ObjectType },

    /// Model kind has no node attribute slot
    #[error("{0:?} models do not support node attributes")]
    AttributesNotSupported(ObjectType),

    /// Handle is stale or was never part of the scene
    #[error("Object not found: {0:?}")]
    ObjectNotFound(ObjectHandle),

    /// Typed access on an object of another kind
    #[error("Wrong object kind: expected {expected}, got {actual}")]
    WrongKind { expected: &'static str, actual: String },

    /// Material channel without texture
    #[error("Channel {0} cannot have a missing texture")]
    MissingTexture(String),

    /// Invalid data structure
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a range error for a positional operation.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}

/// Result type alias for object-graph operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::out_of_range(5, 3);
        assert!(e.to_string().contains('5'));
        assert!(e.to_string().contains('3'));

        let e = Error::IndexBufferNotDivisible { len: 7, arity: 3 };
        assert!(e.to_string().contains("7"));
    }

    #[test]
    fn test_error_helpers() {
        assert!(matches!(Error::invalid("x"), Error::InvalidStructure(_)));
        assert_eq!(Error::other("boom").to_string(), "boom");
    }
}
