pub mod client;
pub mod models;

pub use client::{ExtractError, Result, YtDlpClient};
pub use models::DownloaderConfig;
