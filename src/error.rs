// Error types for route-snapshot

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Routing source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot task failed: {0}")]
    Task(String),
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Convert error to user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::SourceUnavailable(_) => {
                "Failed to read the kernel routing table. Please ensure you have proper permissions.".to_string()
            }
            AppError::UnsupportedPlatform(platform) => {
                format!("Routing table snapshots are not supported on {}.", platform)
            }
            AppError::MalformedRecord(_) => {
                "The kernel returned a record that could not be decoded.".to_string()
            }
            AppError::Io(_) => {
                "File system error. Check that the table file exists and is readable.".to_string()
            }
            AppError::Config(_) => {
                "Configuration error. Check your config file or command-line arguments.".to_string()
            }
            AppError::Serialization(_) => {
                "Data format error. This might be a bug, please report it.".to_string()
            }
            AppError::Task(_) => {
                "The snapshot could not be completed. Please try again.".to_string()
            }
        }
    }
}
