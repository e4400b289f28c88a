pub mod config;
pub mod error;
pub mod logger;

// Re-export commonly used types
pub use config::{AppConfig, MismatchPolicy, SearchDefaults, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K};
pub use error::{ErrorKind, VecSearchError};
pub type Result<T> = std::result::Result<T, VecSearchError>;
