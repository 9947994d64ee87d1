use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::{
    AppError, DownloadMode, DownloadReport, DownloadRequest, Quality, StreamHandle, StreamKind,
};

use super::VideoSource;

/// Turns a validated request into resolve+fetch calls against a [`VideoSource`].
pub struct DownloadCoordinator<S> {
    source: Arc<S>,
}

impl<S> Clone for DownloadCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: VideoSource> DownloadCoordinator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub async fn resolve_stream(
        &self,
        url: &str,
        quality: Quality,
        audio_only: bool,
    ) -> Result<StreamHandle, AppError> {
        let streams = self
            .source
            .video_streams(url)
            .await
            .map_err(|e| AppError::Service(e.to_string()))?;

        match select_stream(&streams, quality, audio_only) {
            Some(stream) => {
                tracing::debug!(
                    url,
                    format_id = %stream.format_id,
                    resolution = ?stream.resolution(),
                    "stream selected"
                );
                Ok(stream.clone())
            }
            None => Err(AppError::NoMatchingStream {
                kind: wanted_kind(audio_only),
                quality,
            }),
        }
    }

    async fn download_one(
        &self,
        url: &str,
        quality: Quality,
        audio_only: bool,
    ) -> Result<PathBuf, AppError> {
        let stream = self.resolve_stream(url, quality, audio_only).await?;
        self.source
            .fetch(&stream)
            .await
            .map_err(|e| AppError::Service(e.to_string()))
    }

    /// Runs one request to completion. Playlist items are fetched in order
    /// and the first failure aborts the rest.
    pub async fn execute(&self, request: DownloadRequest) -> Result<DownloadReport, AppError> {
        let DownloadRequest {
            url,
            mode,
            quality,
            audio_only,
        } = request;

        tracing::info!(%url, ?mode, %quality, audio_only, "download started");

        let files = match mode {
            DownloadMode::SingleVideo => vec![self.download_one(&url, quality, audio_only).await?],
            DownloadMode::Playlist => {
                let video_urls = self
                    .source
                    .playlist_video_urls(&url)
                    .await
                    .map_err(|e| AppError::Service(e.to_string()))?;

                if video_urls.is_empty() {
                    return Err(AppError::EmptyPlaylist);
                }

                let total = video_urls.len();
                let mut files = Vec::with_capacity(total);
                for (index, video_url) in video_urls.iter().enumerate() {
                    tracing::info!(item = index + 1, total, url = %video_url, "playlist item");
                    files.push(self.download_one(video_url, quality, audio_only).await?);
                }
                files
            }
        };

        tracing::info!(count = files.len(), "download finished");
        Ok(DownloadReport { mode, files })
    }
}

fn wanted_kind(audio_only: bool) -> StreamKind {
    if audio_only {
        StreamKind::AudioOnly
    } else {
        StreamKind::Muxed
    }
}

fn rank(a: &StreamHandle, b: &StreamHandle) -> Ordering {
    a.height.unwrap_or(0).cmp(&b.height.unwrap_or(0)).then_with(|| {
        a.audio_bitrate
            .unwrap_or(0.0)
            .partial_cmp(&b.audio_bitrate.unwrap_or(0.0))
            .unwrap_or(Ordering::Equal)
    })
}

/// Picks the stream matching `quality` among the MP4 streams of the wanted kind.
///
/// `Highest` takes the tallest stream (audio bitrate breaks ties, which is what
/// orders audio-only streams); earlier streams win full ties. A fixed label takes
/// the first stream of exactly that height, with no fallback.
pub fn select_stream(
    streams: &[StreamHandle],
    quality: Quality,
    audio_only: bool,
) -> Option<&StreamHandle> {
    let kind = wanted_kind(audio_only);
    let mut candidates = streams.iter().filter(|s| s.kind == kind && s.is_mp4());

    match quality.height() {
        None => candidates.fold(None, |best, stream| match best {
            Some(best) if rank(stream, best) != Ordering::Greater => Some(best),
            _ => Some(stream),
        }),
        Some(height) => candidates.find(|s| s.height == Some(height)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{self, ExtractError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn stream(format_id: &str, kind: StreamKind, ext: &str, height: Option<u32>) -> StreamHandle {
        StreamHandle {
            video_id: "abc".to_string(),
            format_id: format_id.to_string(),
            url: format!("https://cdn.example/{}", format_id),
            ext: ext.to_string(),
            kind,
            height,
            audio_bitrate: None,
            title: "video".to_string(),
            http_headers: HashMap::new(),
        }
    }

    fn audio(format_id: &str, ext: &str, abr: f64) -> StreamHandle {
        StreamHandle {
            audio_bitrate: Some(abr),
            ..stream(format_id, StreamKind::AudioOnly, ext, None)
        }
    }

    fn sample_streams() -> Vec<StreamHandle> {
        vec![
            audio("139", "m4a", 48.0),
            audio("251", "webm", 160.0),
            audio("140", "m4a", 129.0),
            stream("160", StreamKind::VideoOnly, "mp4", Some(144)),
            stream("18", StreamKind::Muxed, "mp4", Some(360)),
            stream("43", StreamKind::Muxed, "webm", Some(720)),
            stream("22", StreamKind::Muxed, "mp4", Some(720)),
            stream("22b", StreamKind::Muxed, "mp4", Some(720)),
            stream("137", StreamKind::VideoOnly, "mp4", Some(1080)),
        ]
    }

    #[derive(Default)]
    struct FakeSource {
        streams: HashMap<String, Vec<StreamHandle>>,
        playlist: Vec<String>,
        fail_fetch_for: Option<String>,
        resolved: Mutex<Vec<String>>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with_video(mut self, url: &str, title: &str) -> Self {
            let streams = sample_streams()
                .into_iter()
                .map(|s| StreamHandle {
                    url: format!("{}#{}", url, s.format_id),
                    title: title.to_string(),
                    ..s
                })
                .collect();
            self.streams.insert(url.to_string(), streams);
            self
        }
    }

    #[async_trait]
    impl VideoSource for FakeSource {
        async fn video_streams(&self, url: &str) -> api::Result<Vec<StreamHandle>> {
            self.resolved.lock().unwrap().push(url.to_string());
            self.streams
                .get(url)
                .cloned()
                .ok_or_else(|| ExtractError::ToolFailed(format!("ERROR: Video unavailable: {}", url)))
        }

        async fn playlist_video_urls(&self, _url: &str) -> api::Result<Vec<String>> {
            Ok(self.playlist.clone())
        }

        async fn fetch(&self, stream: &StreamHandle) -> api::Result<PathBuf> {
            if self.fail_fetch_for.as_deref() == Some(stream.title.as_str()) {
                return Err(ExtractError::InvalidResponse("connection reset".to_string()));
            }
            self.fetched.lock().unwrap().push(stream.url.clone());
            Ok(PathBuf::from(format!("{}.{}", stream.title, stream.ext)))
        }
    }

    fn request(url: &str, mode: DownloadMode, quality: Quality, audio_only: bool) -> DownloadRequest {
        DownloadRequest {
            url: url.to_string(),
            mode,
            quality,
            audio_only,
        }
    }

    #[test]
    fn test_highest_picks_tallest_muxed_mp4() {
        let streams = sample_streams();
        let picked = select_stream(&streams, Quality::Highest, false).unwrap();
        assert_eq!(picked.format_id, "22");
    }

    #[test]
    fn test_fixed_label_picks_first_match() {
        let streams = sample_streams();
        assert_eq!(
            select_stream(&streams, Quality::P720, false).unwrap().format_id,
            "22"
        );
        assert_eq!(
            select_stream(&streams, Quality::P360, false).unwrap().format_id,
            "18"
        );
    }

    #[test]
    fn test_fixed_label_has_no_fallback() {
        let streams = sample_streams();
        // 144p only exists as video-only
        assert!(select_stream(&streams, Quality::P144, false).is_none());
        assert!(select_stream(&streams, Quality::P480, false).is_none());
    }

    #[test]
    fn test_audio_only_restricts_to_audio_streams() {
        let streams = sample_streams();
        let picked = select_stream(&streams, Quality::Highest, true).unwrap();
        assert_eq!(picked.kind, StreamKind::AudioOnly);
        // webm audio has the higher bitrate but is outside the mp4 family
        assert_eq!(picked.format_id, "140");
        assert!(select_stream(&streams, Quality::P720, true).is_none());
    }

    #[test]
    fn test_muxed_never_selects_audio_or_video_only() {
        let streams = sample_streams();
        for quality in Quality::ALL {
            if let Some(picked) = select_stream(&streams, quality, false) {
                assert_eq!(picked.kind, StreamKind::Muxed);
            }
        }
    }

    #[tokio::test]
    async fn test_single_video_720p() {
        let source = FakeSource::default().with_video("https://youtu.be/abc", "abc");
        let coordinator = DownloadCoordinator::new(source);

        let report = coordinator
            .execute(request(
                "https://youtu.be/abc",
                DownloadMode::SingleVideo,
                Quality::P720,
                false,
            ))
            .await
            .unwrap();

        assert_eq!(report.files, [PathBuf::from("abc.mp4")]);
        assert_eq!(
            report.success_message(),
            "Video has been downloaded successfully"
        );
        let fetched = coordinator.source.fetched.lock().unwrap();
        assert_eq!(*fetched, ["https://youtu.be/abc#22"]);
    }

    #[tokio::test]
    async fn test_missing_resolution_is_reported() {
        let source = FakeSource::default().with_video("https://youtu.be/abc", "abc");
        let coordinator = DownloadCoordinator::new(source);

        let err = coordinator
            .execute(request(
                "https://youtu.be/abc",
                DownloadMode::SingleVideo,
                Quality::P480,
                false,
            ))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AppError::NoMatchingStream {
                kind: StreamKind::Muxed,
                quality: Quality::P480,
            }
        );
        assert_eq!(
            err.to_string(),
            "No audio+video MP4 stream available for quality 480p"
        );
        assert!(coordinator.source.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_playlist_fetches_every_item_in_order() {
        let urls = ["https://youtu.be/a", "https://youtu.be/b", "https://youtu.be/c"];
        let mut source = FakeSource::default()
            .with_video(urls[0], "a")
            .with_video(urls[1], "b")
            .with_video(urls[2], "c");
        source.playlist = urls.iter().map(|u| u.to_string()).collect();
        let coordinator = DownloadCoordinator::new(source);

        let report = coordinator
            .execute(request(
                "https://youtube.com/playlist?list=PL1",
                DownloadMode::Playlist,
                Quality::Highest,
                true,
            ))
            .await
            .unwrap();

        assert_eq!(report.mode, DownloadMode::Playlist);
        assert_eq!(
            report.files,
            [
                PathBuf::from("a.m4a"),
                PathBuf::from("b.m4a"),
                PathBuf::from("c.m4a")
            ]
        );
        assert_eq!(*coordinator.source.resolved.lock().unwrap(), urls);
        assert_eq!(coordinator.source.fetched.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_playlist_stops_at_first_failure() {
        let urls = ["https://youtu.be/a", "https://youtu.be/b", "https://youtu.be/c"];
        let mut source = FakeSource::default()
            .with_video(urls[0], "a")
            .with_video(urls[1], "b")
            .with_video(urls[2], "c");
        source.playlist = urls.iter().map(|u| u.to_string()).collect();
        source.fail_fetch_for = Some("b".to_string());
        let coordinator = DownloadCoordinator::new(source);

        let err = coordinator
            .execute(request(
                "https://youtube.com/playlist?list=PL1",
                DownloadMode::Playlist,
                Quality::P360,
                false,
            ))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AppError::Service("Invalid response format: connection reset".to_string())
        );
        assert_eq!(
            *coordinator.source.fetched.lock().unwrap(),
            ["https://youtu.be/a#18"]
        );
        assert_eq!(*coordinator.source.resolved.lock().unwrap(), &urls[..2]);
    }

    #[tokio::test]
    async fn test_service_error_is_surfaced_verbatim() {
        let coordinator = DownloadCoordinator::new(FakeSource::default());
        let err = coordinator
            .execute(request(
                "https://youtu.be/gone",
                DownloadMode::SingleVideo,
                Quality::Highest,
                false,
            ))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "yt-dlp failed: ERROR: Video unavailable: https://youtu.be/gone"
        );
    }

    #[tokio::test]
    async fn test_empty_playlist() {
        let coordinator = DownloadCoordinator::new(FakeSource::default());
        let err = coordinator
            .execute(request(
                "https://youtube.com/playlist?list=EMPTY",
                DownloadMode::Playlist,
                Quality::Highest,
                false,
            ))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::EmptyPlaylist);
        assert!(coordinator.source.fetched.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    const FAKE_YTDLP: &str = r##"#!/bin/sh
for arg in "$@"; do last="$arg"; done
case "$*" in
  *--flat-playlist*)
    echo '{"id": "a1"}'
    echo '{"id": "b2"}'
    ;;
  *)
    id="${last##*v=}"
    printf '{"id": "%s", "title": "Same", "formats": [{"format_id": "18", "ext": "mp4", "vcodec": "avc1", "acodec": "mp4a", "height": 360, "protocol": "http", "url": "%s/media/%s"}]}\n' "$id" "BASE_URL" "$id"
    ;;
esac
"##;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_playlist_items_with_same_title_keep_separate_files() {
        use crate::api::{DownloaderConfig, YtDlpClient};
        use std::os::unix::fs::PermissionsExt;

        let mut server = mockito::Server::new_async().await;
        let _first = server
            .mock("GET", "/media/a1")
            .with_body("AAAA")
            .create_async()
            .await;
        let _second = server
            .mock("GET", "/media/b2")
            .with_body("BB")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("yt-dlp");
        std::fs::write(&script, FAKE_YTDLP.replace("BASE_URL", &server.url())).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let output_dir = dir.path().join("out");

        let coordinator = DownloadCoordinator::new(YtDlpClient::new(DownloaderConfig {
            ytdlp_path: script,
            output_dir: output_dir.clone(),
        }));

        let report = coordinator
            .execute(request(
                "https://youtube.com/playlist?list=PL2",
                DownloadMode::Playlist,
                Quality::P360,
                false,
            ))
            .await
            .unwrap();

        let first = output_dir.join("Same [a1].mp4");
        let second = output_dir.join("Same [b2].mp4");
        assert_eq!(report.files, [first.clone(), second.clone()]);
        assert_eq!(std::fs::read(&first).unwrap(), b"AAAA");
        assert_eq!(std::fs::read(&second).unwrap(), b"BB");
        assert_eq!(std::fs::read_dir(&output_dir).unwrap().count(), 2);
    }
}
