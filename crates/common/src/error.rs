/// vecsearch error types
#[derive(Debug, thiserror::Error)]
pub enum VecSearchError {
    /// Two vectors of different length were compared
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding provider failed, timed out or was unreachable
    #[error("Embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Embedding provider answered with an unusable vector
    #[error("Malformed embedding: {0}")]
    EmbeddingMalformed(String),

    /// Document store unreachable or rejected the operation
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Operation cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Payload-free discriminant of [`VecSearchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DimensionMismatch,
    EmbeddingUnavailable,
    EmbeddingMalformed,
    Persistence,
    Cancelled,
    Config,
    InvalidInput,
    Io,
    Json,
    Other,
}

impl VecSearchError {
    /// Create dimension mismatch error
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create embedding unavailable error
    pub fn embedding_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::EmbeddingUnavailable(msg.into())
    }

    /// Create malformed embedding error
    pub fn embedding_malformed<S: Into<String>>(msg: S) -> Self {
        Self::EmbeddingMalformed(msg.into())
    }

    /// Create persistence error
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::EmbeddingUnavailable(_) => ErrorKind::EmbeddingUnavailable,
            Self::EmbeddingMalformed(_) => ErrorKind::EmbeddingMalformed,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Json,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether a caller may sensibly retry the failed operation.
    ///
    /// The engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingUnavailable(_) | Self::Persistence(_)
        )
    }
}
