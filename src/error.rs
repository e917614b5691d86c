use thiserror::Error;

/// Main error type for Lorekeeper operations.
///
/// Every external call site tags its failures with one of these variants and
/// propagates them to the caller; nothing is swallowed into a success path.
#[derive(Error, Debug)]
pub enum LoreError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// YAML (de)serialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Relational source connection failures
    #[error("Data source connection error: {0}")]
    DataSourceConnection(#[from] diesel::result::ConnectionError),

    /// Relational source query failures
    #[error("Data source error: {0}")]
    DataSource(#[from] diesel::result::Error),

    /// Embedding model failures (load, tokenization, or inference)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector store operation against a collection that does not exist
    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    /// Vector length does not match the collection's fixed dimension
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// ANN index failures
    #[error("Index error: {0}")]
    Index(String),

    /// Language model invocation failures
    #[error("LLM invocation error: {0}")]
    Llm(#[from] async_openai::error::OpenAIError),

    /// The model answered with no textual content
    #[error("LLM returned an empty completion")]
    EmptyCompletion,
}

impl LoreError {
    pub fn io(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            source,
            context: context.into(),
        }
    }
}

/// Result type for Lorekeeper operations
pub type Result<T> = std::result::Result<T, LoreError>;
