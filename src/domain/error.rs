use thiserror::Error;

use super::model::{Quality, StreamKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid URL")]
    EmptyUrl,

    #[error("Please select an option")]
    NoModeSelected,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Service(String),

    #[error("No {kind} MP4 stream available for quality {quality}")]
    NoMatchingStream { kind: StreamKind, quality: Quality },

    #[error("Playlist contains no videos")]
    EmptyPlaylist,
}
