//! Error types for the Mash Notes core
//!
//! All errors use thiserror for structured error handling.
//! These errors serialize to their display string for the HTTP layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Storage backend failure: connectivity, constraint violation, aborted transaction.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Note not found: {0}")]
    NoteNotFound(i64),

    #[error("Attachment not found: {0}")]
    AttachmentNotFound(String),
}

impl AppError {
    /// True for the `NotFound` family (note or attachment).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoteNotFound(_) | Self::AttachmentNotFound(_))
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
