//! Error types for batchmesh

use crate::document::ObjectId;
use thiserror::Error;

/// Result type alias using batchmesh's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in document, meshing and export operations
#[derive(Error, Debug)]
pub enum Error {
    /// No object with this id exists in the document
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// The object exists but is not a group
    #[error("Object '{0}' is not a group")]
    NotAGroup(String),

    /// Adding the object would make a group contain itself
    #[error("Object '{0}' cannot be placed inside itself")]
    CyclicMembership(String),

    /// A sub-object key did not resolve to geometry
    #[error("Cannot resolve sub-object '{0}'")]
    Unresolvable(String),

    /// The document has never been saved, so it has no directory
    #[error("Document has no file path; save it first")]
    UnsavedDocument,

    /// A stored property has a different type than requested
    #[error("Property '{name}' is not of type {expected}")]
    PropertyType {
        name: String,
        expected: &'static str,
    },

    /// The tessellation kernel rejected the shape or parameters
    #[error("Tessellation failed: {0}")]
    Tessellation(String),

    /// Export failed
    #[error("Export failed: {0}")]
    Export(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
