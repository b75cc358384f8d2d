//! Error types for the `menu-rag` crate.

use thiserror::Error;

/// Errors that can occur while loading a catalog or answering a query.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding collaborator failed or returned something unusable.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The completion collaborator failed or returned something unusable.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The catalog arrays are inconsistent or could not be ingested.
    #[error("Catalog error: {0}")]
    CatalogError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the retrieval orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// Reading a catalog or config file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A catalog file was not valid JSON of the expected shape.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RagError {
    /// Whether this error means an external capability (embedding or
    /// generation) was unavailable. Callers decide whether to retry.
    pub fn is_upstream(&self) -> bool {
        matches!(self, RagError::EmbeddingError { .. } | RagError::GenerationError { .. })
    }
}

/// A convenience result type for menu-rag operations.
pub type Result<T> = std::result::Result<T, RagError>;
