use std::path::{Path, PathBuf};
use std::process::Stdio;

use futures::stream::BoxStream;
use futures::Stream;
use futures::StreamExt;
use futures::TryStreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::models::{DownloaderConfig, PlaylistEntry, VideoInfo};
use crate::domain::StreamHandle;
use crate::utils::sanitize_filename;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("yt-dlp failed: {0}")]
    ToolFailed(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Resolves metadata through the `yt-dlp` executable and fetches the
/// selected stream over HTTP.
#[derive(Clone)]
pub struct YtDlpClient {
    config: DownloaderConfig,
    http: Client,
}

impl YtDlpClient {
    pub fn new(config: DownloaderConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    async fn run_ytdlp(&self, args: &[&str]) -> Result<Vec<u8>> {
        let program = self.config.ytdlp_path.display().to_string();
        tracing::debug!(%program, ?args, "running yt-dlp");

        let output = Command::new(&self.config.ytdlp_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExtractError::Launch { program, source })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            tracing::warn!(%message, "yt-dlp returned an error");
            return Err(ExtractError::ToolFailed(message));
        }

        Ok(output.stdout)
    }

    /// Metadata and format list for a single video
    pub async fn video_info(&self, url: &str) -> Result<VideoInfo> {
        let stdout = self
            .run_ytdlp(&[
                "--dump-single-json",
                "--no-playlist",
                "--no-warnings",
                "--skip-download",
                url,
            ])
            .await?;

        serde_json::from_slice(&stdout)
            .map_err(|e| ExtractError::InvalidResponse(format!("JSON decode error: {}", e)))
    }

    pub async fn playlist_video_urls(&self, url: &str) -> Result<Vec<String>> {
        let stdout = self
            .run_ytdlp(&["--flat-playlist", "--dump-json", "--no-warnings", url])
            .await?;

        parse_playlist(&String::from_utf8_lossy(&stdout))
    }

    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        stream: &StreamHandle,
    ) -> Result<(Option<u64>, impl Stream<Item = Result<bytes::Bytes>>)> {
        let mut request = self.http.get(&stream.url);
        for (name, value) in &stream.http_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?.error_for_status()?;

        let total_size = response.content_length();
        let body = response
            .bytes_stream()
            .map_err(ExtractError::RequestError);

        Ok((total_size, body))
    }

    /// Streams `stream` into the output directory as `<title> [<id>].<ext>`.
    ///
    /// Bytes land in a `.part` file that is renamed once complete, so a failed
    /// transfer never leaves a truncated file under the final name.
    pub async fn download_to_file(&self, stream: &StreamHandle) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let file_name = file_name_for(stream);
        let path = self.config.output_dir.join(&file_name);
        let part_path = self.config.output_dir.join(format!("{}.part", file_name));

        let (total, body) = self.download_file_stream(stream).await?;

        let downloaded = match write_body(body.boxed(), &part_path).await {
            Ok(downloaded) => downloaded,
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&part_path).await {
                    tracing::warn!(
                        path = %part_path.display(),
                        error = %remove_err,
                        "failed to remove partial download"
                    );
                }
                return Err(e);
            }
        };
        tokio::fs::rename(&part_path, &path).await?;

        tracing::info!(
            path = %path.display(),
            bytes = downloaded,
            expected = ?total,
            "stream saved"
        );
        Ok(path)
    }
}

async fn write_body(
    mut body: BoxStream<'_, Result<bytes::Bytes>>,
    path: &Path,
) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut downloaded: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
    }
    file.sync_all().await?;

    Ok(downloaded)
}

// Same shape as yt-dlp's default `%(title)s [%(id)s].%(ext)s`
fn file_name_for(stream: &StreamHandle) -> String {
    let title = sanitize_filename(&stream.title)
        .trim_matches(|c| c == '.' || c == ' ')
        .to_string();
    let id = sanitize_filename(&stream.video_id);

    let stem = match (title.is_empty(), id.is_empty()) {
        (false, false) => format!("{} [{}]", title, id),
        (false, true) => title,
        (true, false) => id,
        (true, true) => stream.format_id.clone(),
    };
    format!("{}.{}", stem, stream.ext)
}

/// Video URLs from `--flat-playlist --dump-json` output, one JSON object per line.
fn parse_playlist(stdout: &str) -> Result<Vec<String>> {
    let mut urls = Vec::new();

    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let entry: PlaylistEntry = serde_json::from_str(line)
            .map_err(|e| ExtractError::InvalidResponse(format!("playlist entry: {}", e)))?;
        match entry.video_url() {
            Some(url) => urls.push(url),
            None => tracing::warn!(?entry, "skipping playlist entry without id"),
        }
    }

    Ok(urls)
}
