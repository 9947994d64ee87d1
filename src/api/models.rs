use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use url::Url;

use crate::domain::{StreamHandle, StreamKind};

const WATCH_URL: &str = "https://www.youtube.com/watch";

/// Output of `yt-dlp --dump-single-json` for a single video
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub formats: Vec<FormatInfo>,
}

/// One entry of the `formats` array
#[derive(Debug, Clone, Deserialize)]
pub struct FormatInfo {
    pub format_id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub http_headers: HashMap<String, String>,
}

// yt-dlp reports a missing track as the literal codec "none"
fn codec_present(codec: Option<&str>) -> bool {
    codec.map_or(true, |c| c != "none")
}

impl FormatInfo {
    pub fn kind(&self) -> Option<StreamKind> {
        match (
            codec_present(self.vcodec.as_deref()),
            codec_present(self.acodec.as_deref()),
        ) {
            (true, true) => Some(StreamKind::Muxed),
            (false, true) => Some(StreamKind::AudioOnly),
            (true, false) => Some(StreamKind::VideoOnly),
            // storyboards and other image tracks
            (false, false) => None,
        }
    }

    /// Fetchable with a single GET (no HLS/DASH manifests).
    pub fn is_direct_http(&self) -> bool {
        match self.protocol.as_deref() {
            Some(protocol) => protocol == "https" || protocol == "http",
            None => self
                .url
                .as_deref()
                .and_then(|u| Url::parse(u).ok())
                .is_some_and(|u| u.scheme() == "https" || u.scheme() == "http"),
        }
    }

    pub fn into_stream_handle(self, video_id: &str, title: &str) -> Option<StreamHandle> {
        if !self.is_direct_http() {
            return None;
        }
        let kind = self.kind()?;
        let url = self.url?;

        Some(StreamHandle {
            video_id: video_id.to_string(),
            format_id: self.format_id,
            url,
            ext: self.ext,
            kind,
            height: self.height,
            audio_bitrate: self.abr,
            title: title.to_string(),
            http_headers: self.http_headers,
        })
    }
}

impl VideoInfo {
    /// Directly fetchable streams, in the order yt-dlp listed them.
    pub fn into_streams(self) -> Vec<StreamHandle> {
        let title = if self.title.is_empty() {
            self.id.clone()
        } else {
            self.title
        };

        self.formats
            .into_iter()
            .filter_map(|format| format.into_stream_handle(&self.id, &title))
            .collect()
    }
}

/// One line of `yt-dlp --flat-playlist --dump-json`
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl PlaylistEntry {
    pub fn video_url(&self) -> Option<String> {
        if let Some(url) = self.url.as_deref().filter(|u| u.starts_with("http")) {
            return Some(url.to_string());
        }
        let id = self.id.as_deref().filter(|id| !id.is_empty())?;
        Url::parse_with_params(WATCH_URL, &[("v", id)])
            .ok()
            .map(String::from)
    }
}

/// Runtime configuration for the extractor and output location
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    pub ytdlp_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            output_dir: PathBuf::from("."),
        }
    }
}

impl DownloaderConfig {
    /// Defaults overridden by `YTDLP_PATH` and `YTDL_OUTPUT_DIR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(path) = std::env::var_os("YTDLP_PATH").filter(|p| !p.is_empty()) {
            config.ytdlp_path = PathBuf::from(path);
        }

        match std::env::var_os("YTDL_OUTPUT_DIR").filter(|p| !p.is_empty()) {
            Some(dir) => config.output_dir = PathBuf::from(dir),
            None => {
                if let Ok(cwd) = std::env::current_dir() {
                    config.output_dir = cwd;
                }
            }
        }

        config
    }
}
