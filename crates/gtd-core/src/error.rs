//! Error types for gtd

use thiserror::Error;

/// Record kind, used to name the missing record in `NotFound`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Project,
    Item,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Project => write!(f, "Project"),
            Entity::Item => write!(f, "Item"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: u64 },

    #[error("Invalid format: {0}")]
    ImportFormat(String),

    #[error("Import failed: {0}")]
    ImportFailed(String),

    #[error("Could not reset items {item_ids:?} of project {project_id}: {reason}")]
    CascadeFailed {
        project_id: u64,
        item_ids: Vec<u64>,
        reason: String,
    },

    #[error("Store not initialized. Run 'gtd init' first.")]
    NotInitialized,

    #[error("Store already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid energy level: {0}")]
    InvalidEnergyLevel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Config(String),
}

impl Error {
    pub fn project_not_found(id: u64) -> Self {
        Error::NotFound {
            entity: Entity::Project,
            id,
        }
    }

    pub fn item_not_found(id: u64) -> Self {
        Error::NotFound {
            entity: Entity::Item,
            id,
        }
    }
}
