use std::path::PathBuf;
use thiserror::Error;

/// Main error type for hybridrank
#[derive(Error, Debug)]
pub enum HybridError {
    /// Requested lexical language is not supported by the store
    #[error("Invalid language: '{lang}' (supported: en, es)")]
    InvalidLanguage { lang: String },

    /// Query embedding does not match the corpus dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A request parameter is out of range or malformed
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    /// The lexical or vector ranker failed or timed out
    #[error("{ranker} ranker failed: {message}")]
    RankerFailure { ranker: String, message: String },

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Corpus index errors (building or committing the store)
    #[error("Index error: {0}")]
    Index(String),
}

impl HybridError {
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn ranker_failure(ranker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RankerFailure {
            ranker: ranker.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable error kind.
    ///
    /// Transport layers pass this through verbatim so callers can tell
    /// "no matches" apart from "a ranker errored".
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidLanguage { .. } => "invalid_language",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::RankerFailure { .. } => "ranker_failure",
            Self::Config(_)
            | Self::ConfigValidation { .. }
            | Self::ConfigNotFound { .. }
            | Self::InvalidConfigValue { .. }
            | Self::Toml(_)
            | Self::TomlSerialization(_) => "config",
            Self::Io { .. } => "io",
            Self::Json { .. } => "json",
            Self::Index(_) => "index",
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for hybridrank operations
pub type Result<T> = std::result::Result<T, HybridError>;
