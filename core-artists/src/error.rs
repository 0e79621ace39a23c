use thiserror::Error;

use crate::models::ArtistId;

#[derive(Error, Debug)]
pub enum ArtistError {
    #[error("Artist not found: {artist_id}")]
    NotFound { artist_id: ArtistId },

    #[error("Invalid search pattern for {query:?}: {message}")]
    InvalidPattern { query: String, message: String },

    #[error("Invalid artist snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Unknown credit type: {0}")]
    UnknownCreditType(String),

    #[error("Failed to canonicalize record: {0}")]
    Canonicalization(String),
}

pub type Result<T> = std::result::Result<T, ArtistError>;
