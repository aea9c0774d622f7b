pub mod config;
pub mod events;
pub mod export;
pub mod model;
pub mod playback;
pub mod report;
pub mod session;

/// Frame rate of the analyzed footage; frame-unit timestamps divide by this.
pub const FPS: f64 = 30.0;

/// Application name for XDG paths
pub const APP_NAME: &str = "courtside";
