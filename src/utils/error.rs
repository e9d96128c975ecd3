use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Download error: {0}")]
    Download(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
