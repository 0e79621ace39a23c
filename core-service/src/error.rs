use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Artist error: {0}")]
    Artists(#[from] core_artists::ArtistError),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

impl CoreError {
    /// True when a searched artist id is absent from the snapshot.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::Artists(core_artists::ArtistError::NotFound { .. })
                | CoreError::Library(core_library::LibraryError::Artists(
                    core_artists::ArtistError::NotFound { .. }
                ))
                | CoreError::Library(core_library::LibraryError::NotFound { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
