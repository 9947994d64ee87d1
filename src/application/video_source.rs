use std::path::PathBuf;

use async_trait::async_trait;

use crate::api::{self, YtDlpClient};
use crate::domain::StreamHandle;

/// The extraction service the downloader delegates to.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Every stream the service offers for a single video URL.
    async fn video_streams(&self, url: &str) -> api::Result<Vec<StreamHandle>>;

    /// Video URLs of a playlist, in playlist order.
    async fn playlist_video_urls(&self, url: &str) -> api::Result<Vec<String>>;

    /// Downloads one stream, returning where it was written.
    async fn fetch(&self, stream: &StreamHandle) -> api::Result<PathBuf>;
}

#[async_trait]
impl VideoSource for YtDlpClient {
    async fn video_streams(&self, url: &str) -> api::Result<Vec<StreamHandle>> {
        Ok(self.video_info(url).await?.into_streams())
    }

    async fn playlist_video_urls(&self, url: &str) -> api::Result<Vec<String>> {
        YtDlpClient::playlist_video_urls(self, url).await
    }

    async fn fetch(&self, stream: &StreamHandle) -> api::Result<PathBuf> {
        self.download_to_file(stream).await
    }
}
