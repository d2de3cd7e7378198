//! Error types for the designer core

/// Rejection of a user gesture. Never fatal: state is left untouched and the
/// message is shown inline until dismissed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DesignerError {
    #[error("Relationships between columns of the same table ('{table}') are not supported")]
    SelfRelationship { table: String },

    #[error("A relationship between {source_key} and {target_key} already exists")]
    DuplicateRelationship {
        source_key: String,
        target_key: String,
    },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("No connection is waiting for a relationship type")]
    NoPendingConnection,

    #[error("Invalid connection handle '{0}', expected 'table__column'")]
    InvalidHandle(String),

    #[error("Invalid edge id '{0}'")]
    InvalidEdgeId(String),

    #[error("Table '{0}' is not part of the current selection")]
    UnknownTable(String),

    #[error("Column '{column}' does not exist in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Column types are not compatible: {source_type} and {target_type}")]
    IncompatibleTypes {
        source_type: String,
        target_type: String,
    },

    #[error("Relationship '{0}' not found")]
    RelationshipNotFound(String),
}

/// Failure of the key-value store behind layout persistence
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage is not available: {0}")]
    Unavailable(String),

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored value is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub type DesignerResult<T> = Result<T, DesignerError>;
