// AMV Notation Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bareme not found: {0}")]
    BaremeNotFound(String),

    #[error("Invalid bareme: {0}")]
    InvalidBareme(String),

    #[error("Project file not found: {0}")]
    ProjectNotFound(String),

    #[error("Invalid project: {0}")]
    InvalidProject(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Import rejected: {0}")]
    ImportRejected(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, NotationError>;
