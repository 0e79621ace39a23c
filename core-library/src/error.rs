use core_artists::ArtistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Invalid catalog data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Artists(#[from] ArtistError),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
