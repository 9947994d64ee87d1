use iced::{Task, Theme};
use rfd::{AsyncMessageDialog, MessageButtons, MessageLevel};

use crate::api::{DownloaderConfig, YtDlpClient};
use crate::application::DownloadCoordinator;
use crate::domain::{AppError, DownloadPhase, DownloadReport};
use crate::ui::{DownloadMessage, DownloadView};

pub struct DownloadApp {
    view: DownloadView,
    coordinator: DownloadCoordinator<YtDlpClient>,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new(DownloaderConfig::from_env())
    }
}

impl DownloadApp {
    pub fn new(config: DownloaderConfig) -> Self {
        tracing::info!(
            ytdlp = %config.ytdlp_path.display(),
            output_dir = %config.output_dir.display(),
            "downloader configured"
        );

        Self {
            view: DownloadView::default(),
            coordinator: DownloadCoordinator::new(YtDlpClient::new(config)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    /// Outcome of the whole request (every playlist item, or the first failure)
    DownloadCompleted(Result<DownloadReport, AppError>),
    NoticeClosed,
}

/// Shows a modal message box; the task resolves once it is dismissed.
fn notify(level: MessageLevel, title: &'static str, description: String) -> Task<Message> {
    Task::perform(
        async move {
            AsyncMessageDialog::new()
                .set_level(level)
                .set_title(title)
                .set_description(description)
                .set_buttons(MessageButtons::Ok)
                .show()
                .await;
        },
        |_| Message::NoticeClosed,
    )
}

fn notify_error(error: &AppError) -> Task<Message> {
    notify(MessageLevel::Warning, "Error", error.to_string())
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            if let DownloadMessage::DownloadPressed = ui_msg {
                if app.view.is_downloading() {
                    return Task::none();
                }

                match app.view.submit() {
                    Ok(request) => {
                        let coordinator = app.coordinator.clone();
                        app.view.set_phase(
                            DownloadPhase::Downloading,
                            format!("Downloading {}...", request.url),
                        );

                        return Task::perform(
                            async move { coordinator.execute(request).await },
                            Message::DownloadCompleted,
                        );
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "form rejected");
                        return notify_error(&AppError::Validation(e));
                    }
                }
            }
        }
        Message::DownloadCompleted(result) => match result {
            Ok(report) => {
                app.view.set_phase(
                    DownloadPhase::Completed,
                    format!("Saved {} file(s)", report.files.len()),
                );
                return notify(
                    MessageLevel::Info,
                    "Download complete",
                    report.success_message().to_string(),
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "download failed");
                app.view
                    .set_phase(DownloadPhase::Failed, format!("Download failed: {}", e));
                return notify_error(&e);
            }
        },
        Message::NoticeClosed => {}
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

pub fn theme(_app: &DownloadApp) -> Theme {
    Theme::Dark
}
