//! Error types for the store adapters and the relationship engine

use thiserror::Error;

/// Errors raised by a [`crate::PathStore`] adapter
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Another record already occupies the target bucket entry
    #[error("Bucket entry already taken: {0}")]
    KeyConflict(String),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Coarse classification of [`RelationshipStorageError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed relationship, or an identity/record that could not be resolved on save
    IllegalArguments,

    /// A relationship or identity could not be retrieved
    FailedToGetRelationship,

    /// The store or the directory failed
    Storage,
}

/// Errors returned by [`crate::RelationshipStorage`]
#[derive(Error, Debug)]
pub enum RelationshipStorageError {
    /// Malformed relationship, or unresolvable identity or record on save
    #[error("Illegal arguments: {0}")]
    IllegalArguments(String),

    /// Relationship or identity could not be retrieved
    #[error("Failed to get relationship: {0}")]
    FailedToGetRelationship(String),

    /// Store adapter failure
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Identity directory failure
    #[error("Identity directory error: {0}")]
    Directory(String),
}

impl RelationshipStorageError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelationshipStorageError::IllegalArguments(_) => ErrorKind::IllegalArguments,
            RelationshipStorageError::FailedToGetRelationship(_) => {
                ErrorKind::FailedToGetRelationship
            }
            RelationshipStorageError::Store(_) | RelationshipStorageError::Directory(_) => {
                ErrorKind::Storage
            }
        }
    }
}
