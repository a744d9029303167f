use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayheadError {
    #[error("No playable source for content: {0}")]
    NoPlayableSource(String),

    #[error("Backend failed to load media: {0}")]
    BackendLoadFailure(String),

    #[error("Progress write failed: {0}")]
    PersistenceWriteFailure(String),

    #[error("Player controller disconnected")]
    Disconnected,
}

pub type PlayheadResult<T> = Result<T, PlayheadError>;
