use iced::{
    widget::{button, checkbox, column, pick_list, radio, row, text, text_input, Space},
    Element, Length,
};

use crate::domain::{DownloadMode, DownloadPhase, DownloadRequest, Quality, ValidationError};

/// Form state: the values the user has entered plus the status line.
pub struct DownloadView {
    pub url: String,
    pub mode: Option<DownloadMode>,
    pub quality: Quality,
    pub audio_only: bool,
    pub phase: DownloadPhase,
    pub status_message: String,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            url: String::new(),
            mode: Some(DownloadMode::SingleVideo),
            quality: Quality::Highest,
            audio_only: false,
            phase: DownloadPhase::Idle,
            status_message: "Ready".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    ModeSelected(DownloadMode),
    QualitySelected(Quality),
    AudioOnlyToggled(bool),
    DownloadPressed,
}

impl DownloadView {
    pub fn is_downloading(&self) -> bool {
        self.phase == DownloadPhase::Downloading
    }

    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => {
                self.url = url;
            }
            DownloadMessage::ModeSelected(mode) => {
                self.mode = Some(mode);
            }
            DownloadMessage::QualitySelected(quality) => {
                self.quality = quality;
            }
            DownloadMessage::AudioOnlyToggled(audio_only) => {
                self.audio_only = audio_only;
            }
            DownloadMessage::DownloadPressed => {
                // Will be handled by the app
            }
        }
    }

    /// Validates the form and builds the request for this click.
    pub fn submit(&self) -> Result<DownloadRequest, ValidationError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        let mode = self.mode.ok_or(ValidationError::NoModeSelected)?;

        Ok(DownloadRequest {
            url: url.to_string(),
            mode,
            quality: self.quality,
            audio_only: self.audio_only,
        })
    }

    pub fn set_phase(&mut self, phase: DownloadPhase, status: impl Into<String>) {
        self.phase = phase;
        self.status_message = status.into();
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let download_button = button("Download")
            .on_press_maybe((!self.is_downloading()).then_some(DownloadMessage::DownloadPressed))
            .padding([10, 20]);

        column![
            text("Enter the URL of the YouTube video or playlist:").size(16),
            text_input("https://www.youtube.com/watch?v=...", &self.url)
                .on_input(DownloadMessage::UrlChanged)
                .on_submit(DownloadMessage::DownloadPressed)
                .padding(10),
            row![
                radio(
                    "Single Video",
                    DownloadMode::SingleVideo,
                    self.mode,
                    DownloadMessage::ModeSelected
                ),
                radio(
                    "Playlist",
                    DownloadMode::Playlist,
                    self.mode,
                    DownloadMessage::ModeSelected
                ),
            ]
            .spacing(20),
            Space::new().height(Length::Fixed(10.0)),
            text("Select video quality:").size(16),
            pick_list(
                &Quality::ALL[..],
                Some(self.quality),
                DownloadMessage::QualitySelected
            ),
            checkbox(self.audio_only)
                .label("Audio-only")
                .on_toggle(DownloadMessage::AudioOnlyToggled),
            Space::new().height(Length::Fixed(20.0)),
            download_button,
            text(&self.status_message).size(14),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}
