use thiserror::Error;

use crate::language::LanguageCode;

#[derive(Error, Debug)]
pub enum TarjumaError {
    #[error("Unsupported language pair: {src} → {tgt}")]
    UnsupportedPair {
        src: LanguageCode,
        tgt: LanguageCode,
        /// Direct targets reachable from `src`, for diagnostics
        available: Vec<LanguageCode>,
    },

    #[error("Multi-step translation not available: {src} → {tgt} (no path via {pivot})")]
    NoPivotPath {
        src: LanguageCode,
        tgt: LanguageCode,
        pivot: LanguageCode,
    },

    #[error("Backend '{backend}' failed: {cause}")]
    BackendFailure {
        backend: String,
        #[source]
        cause: anyhow::Error,
    },

    #[error("Router configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl TarjumaError {
    pub fn backend(backend: impl Into<String>, cause: anyhow::Error) -> Self {
        Self::BackendFailure {
            backend: backend.into(),
            cause,
        }
    }

    /// Short machine-friendly name of the error kind, used by the front ends.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedPair { .. } => "UnsupportedPair",
            Self::NoPivotPath { .. } => "NoPivotPath",
            Self::BackendFailure { .. } => "BackendFailure",
            Self::Configuration(_) => "ConfigurationError",
            Self::Io(_) => "Io",
            Self::Json(_) => "Json",
            Self::Csv(_) => "Csv",
            Self::Http(_) => "Http",
            Self::Config(_) => "Config",
            Self::FileNotFound(_) => "FileNotFound",
            Self::UnsupportedFormat(_) => "UnsupportedFormat",
        }
    }

    /// Whether retrying with multi-step translation could succeed.
    pub fn suggests_multi_step(&self) -> bool {
        matches!(self, Self::UnsupportedPair { .. })
    }
}

pub type Result<T> = std::result::Result<T, TarjumaError>;
