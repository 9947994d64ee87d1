pub mod download_coordinator;
pub mod video_source;

pub use download_coordinator::DownloadCoordinator;
pub use video_source::VideoSource;
