//! Typed failures returned by the plan and follow services.

use std::fmt;

/// Result type used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of entity a lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Plan,
    Module,
    Task,
    Template,
    User,
    Note,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Plan => "plan",
            Self::Module => "module",
            Self::Task => "task",
            Self::Template => "template",
            Self::User => "user",
            Self::Note => "note",
        };
        f.write_str(s)
    }
}

/// Errors surfaced by the engine. A failed operation never leaves a partial
/// write behind.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A plan, module, task, template or user id did not resolve in the
    /// expected scope.
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: String },

    /// The requester does not own the (non-template) plan or note.
    #[error("user {user:?} is not authorized to {action} {entity} {id}")]
    NotAuthorized {
        user: String,
        action: &'static str,
        entity: Entity,
        id: String,
    },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// The stored record changed since it was read.
    #[error("{entity} {id} was modified concurrently; reload and retry")]
    Conflict { entity: Entity, id: String },

    /// The id generator kept producing ids that are already in use.
    #[error("could not generate a fresh id after {0} attempts")]
    IdExhausted(usize),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(entity: Entity, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn not_authorized(user: &str, action: &'static str, entity: Entity, id: impl ToString) -> Self {
        Self::NotAuthorized {
            user: user.to_owned(),
            action,
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(entity: Entity, id: impl ToString) -> Self {
        Self::Conflict {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_not_authorized(&self) -> bool {
        matches!(self, Self::NotAuthorized { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
