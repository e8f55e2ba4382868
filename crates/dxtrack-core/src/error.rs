//! # Engine Errors
//!
//! NotFound and Validation are terminal for the triggering request.
//! Storage and Codec wrap backend failures.

use std::fmt;
use thiserror::Error;

/// The kind of record a lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Evaluator,
    Project,
    Department,
    Evaluation,
    Submission,
}

impl EntityKind {
    /// Prefix used when minting new identifiers of this kind.
    #[must_use]
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::User | Self::Evaluator => "user",
            Self::Project => "proj",
            Self::Department => "dept",
            Self::Evaluation => "eval",
            Self::Submission => "sub",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Evaluator => "evaluator",
            Self::Project => "project",
            Self::Department => "department",
            Self::Evaluation => "evaluation",
            Self::Submission => "submission",
        };
        f.write_str(name)
    }
}

/// Errors produced by the engine and its storage backends.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An id did not resolve to a record.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// Input rejected before any mutation happened.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored record could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

impl EngineError {
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for NotFound errors of any kind.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;

macro_rules! storage_error_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for EngineError {
                fn from(error: $source) -> Self {
                    Self::Storage(error.to_string())
                }
            }
        )*
    };
}

storage_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl From<postcard::Error> for EngineError {
    fn from(error: postcard::Error) -> Self {
        Self::Codec(error.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_kind_and_id() {
        let error = EngineError::not_found(EntityKind::Evaluation, "eval_9");
        assert_eq!(error.to_string(), "evaluation not found: eval_9");
        assert!(error.is_not_found());
    }

    #[test]
    fn evaluator_ids_share_the_user_prefix() {
        assert_eq!(EntityKind::Evaluator.id_prefix(), "user");
        assert_eq!(EntityKind::Project.id_prefix(), "proj");
    }
}
