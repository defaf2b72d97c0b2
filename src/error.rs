//! Error types for the container registry

use thiserror::Error;

/// Result type for container operations
pub type Result<T> = std::result::Result<T, ContainerError>;

/// Failures reported by an attribute store (host binding)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Node is invalid or detached: {node}")]
    InvalidNode { node: String },

    #[error("Node path already exists: {path}")]
    DuplicatePath { path: String },

    #[error("Attribute store failure: {0}")]
    Backend(String),
}

/// Failures while resolving a raw record against the schema lineage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unknown schema: {schema}")]
    UnknownSchema { schema: String },

    #[error("Migration gap from {from} to {to}: {reason}")]
    MigrationGap {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Missing field '{field}' required by {schema}")]
    MissingField { schema: String, field: String },

    #[error("Schema {schema} must be newer than {latest} and share its lineage")]
    OutOfOrder { schema: String, latest: String },
}

/// Structural violations of a resolved container record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing field '{field}' required by {schema}")]
    MissingField { schema: String, field: String },

    #[error("Field '{field}' must not be empty")]
    EmptyField { field: String },

    #[error("Unrecognised container id: {id}")]
    UnknownIdentifier { id: String },

    #[error("Container id {id} is not the current id {current}; only the current id may be written")]
    NotCurrentIdentifier { id: String, current: String },

    #[error("Schema {found} is not the current schema {expected}")]
    StaleSchema { found: String, expected: String },
}

/// Container registry errors
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
