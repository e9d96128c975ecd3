pub mod config;
pub mod download;
pub mod element_finder;
pub mod export;
pub mod extractors;
pub mod models;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use models::ProductRecord;
pub use session::{ExtractionSession, RunSummary};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
