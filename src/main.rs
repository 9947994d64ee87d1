mod api;
mod app;
mod application;
mod domain;
mod ui;
mod utils;

use iced::{window, Size};

fn main() -> iced::Result {
    utils::init_tracing();

    iced::application(app::DownloadApp::default, app::update, app::view)
        .title("YouTube Downloader")
        .theme(app::theme)
        .window(window::Settings {
            size: Size::new(480.0, 460.0),
            ..Default::default()
        })
        .run()
}
