pub mod error;
pub mod model;

pub use error::{AppError, ValidationError};
pub use model::{
    DownloadMode, DownloadPhase, DownloadReport, DownloadRequest, Quality, StreamHandle,
    StreamKind,
};
