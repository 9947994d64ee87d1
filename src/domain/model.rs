use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    SingleVideo,
    Playlist,
}

/// Requested quality as offered by the form's quality selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Highest,
    P720,
    P480,
    P360,
    P240,
    P144,
}

impl Quality {
    pub const ALL: [Quality; 6] = [
        Quality::Highest,
        Quality::P720,
        Quality::P480,
        Quality::P360,
        Quality::P240,
        Quality::P144,
    ];

    /// Pixel height for fixed labels, `None` for `Highest`.
    pub fn height(self) -> Option<u32> {
        match self {
            Quality::Highest => None,
            Quality::P720 => Some(720),
            Quality::P480 => Some(480),
            Quality::P360 => Some(360),
            Quality::P240 => Some(240),
            Quality::P144 => Some(144),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.height() {
            Some(height) => write!(f, "{}p", height),
            None => f.write_str("Highest Resolution"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub mode: DownloadMode,
    pub quality: Quality,
    pub audio_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Muxed,
    AudioOnly,
    VideoOnly,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamKind::Muxed => "audio+video",
            StreamKind::AudioOnly => "audio-only",
            StreamKind::VideoOnly => "video-only",
        };
        f.write_str(name)
    }
}

/// One fetchable media stream resolved by the extraction service.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamHandle {
    pub video_id: String,
    pub format_id: String,
    pub url: String,
    pub ext: String,
    pub kind: StreamKind,
    pub height: Option<u32>,
    pub audio_bitrate: Option<f64>,
    pub title: String,
    pub http_headers: HashMap<String, String>,
}

impl StreamHandle {
    pub fn resolution(&self) -> Option<String> {
        self.height.map(|h| format!("{}p", h))
    }

    /// Whether the stream is packaged in the MP4 family (`m4a` for bare audio).
    pub fn is_mp4(&self) -> bool {
        match self.kind {
            StreamKind::AudioOnly => self.ext == "m4a" || self.ext == "mp4",
            _ => self.ext == "mp4",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub mode: DownloadMode,
    pub files: Vec<PathBuf>,
}

impl DownloadReport {
    pub fn success_message(&self) -> &'static str {
        match self.mode {
            DownloadMode::SingleVideo => "Video has been downloaded successfully",
            DownloadMode::Playlist => "Playlist has been downloaded successfully",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Downloading,
    Completed,
    Failed,
}
