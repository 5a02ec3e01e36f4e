//! Engine-level error types.

use thiserror::Error;
use uuid::Uuid;

use crate::resolver::ResourceKind;

/// Errors produced by the playbook engine (validation + persistence).
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Graph validation errors ------

    /// Two or more graph elements share the same id.
    #[error("duplicate element id: '{0}'")]
    DuplicateElementId(String),

    /// A branch or argument references an action that isn't in the workflow.
    #[error("{field} references unknown action '{element_id}'")]
    UnknownElementReference {
        element_id: String,
        field: &'static str,
    },

    /// `start` names an action that isn't in the workflow.
    #[error("start references unknown action '{0}'")]
    UnknownStart(String),

    /// A required body field was absent.
    #[error("\"{0}\" is a required field")]
    MissingField(&'static str),

    /// Malformed or semantically invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // ------ Resource errors ------

    /// An identifier that is not a well-formed UUID.
    #[error("invalid {kind} id: '{raw}'")]
    InvalidIdentifier { kind: ResourceKind, raw: String },

    #[error("{kind} {id} does not exist")]
    NotFound { kind: ResourceKind, id: Uuid },

    /// A uniqueness constraint rejected the write.
    #[error("unique constraint failed: {0}")]
    Conflict(String),

    /// A concurrent writer kept the store locked; the request may be retried.
    #[error("store busy: {0}")]
    Busy(String),

    /// Persistence error from the db crate.
    #[error("database error: {0}")]
    Database(db::DbError),
}

impl EngineError {
    /// True for the graph and body validation family.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::DuplicateElementId(_)
                | Self::UnknownElementReference { .. }
                | Self::UnknownStart(_)
                | Self::MissingField(_)
                | Self::InvalidInput(_)
        )
    }
}

impl From<db::DbError> for EngineError {
    fn from(err: db::DbError) -> Self {
        match err {
            db::DbError::Conflict(msg) => Self::Conflict(msg),
            db::DbError::Busy(msg) => Self::Busy(msg),
            err => Self::Database(err),
        }
    }
}
