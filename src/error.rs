//! Error types for boundary operations, parsing and persistence

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which kind of entity an identifier was expected to name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Base,
    Node,
    Facility,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Base => "base",
            EntityKind::Node => "node",
            EntityKind::Facility => "facility",
        })
    }
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("no {kind} with ID {id}")]
    InvalidIdentifier { kind: EntityKind, id: u32 },

    #[error("no recipe named '{0}'")]
    UnknownRecipe(String),

    #[error("recipe '{recipe}' cannot run in a {building} (it needs a {expected})")]
    RecipeBuildingMismatch {
        recipe: String,
        building: String,
        expected: String,
    },

    #[error("no miner type named '{0}'")]
    UnknownMiner(String),

    #[error("unknown purity '{0}' (expected Impure, Normal or Pure)")]
    UnknownPurity(String),

    #[error("malformed item rate '{0}' (expected ITEM=RATE)")]
    MalformedItemRate(String),

    #[error("{}:{line}: cannot parse '{text}'", .path.display())]
    MalformedCatalogLine {
        path: PathBuf,
        line: usize,
        text: String,
    },

    #[error("saved session is corrupt: {0}")]
    CorruptSave(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

impl TrackerError {
    pub fn invalid(kind: EntityKind, id: u32) -> Self {
        TrackerError::InvalidIdentifier { kind, id }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
