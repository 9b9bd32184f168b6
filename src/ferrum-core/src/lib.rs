pub mod config;
pub mod logging;
pub mod models;
pub mod paths;

pub use config::{Config, ConfigError, LogLevel, LoggingConfig, PlaybackConfig, ValidationError};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use models::TrackId;
pub use paths::{AppDirs, DirsError};

pub const APP_NAME: &str = "ferrum";
pub const APP_AUTHOR: &str = "Ferrum";
pub const APP_QUALIFIER: &str = "io";
