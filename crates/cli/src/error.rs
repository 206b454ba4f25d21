//! CLI error type.

use creator_storefront_core::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid argument {0}: {1}")]
    InvalidArgument(&'static str, String),

    #[error("Cart file {path}: {source}")]
    CartFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cart file {path} is not valid JSON: {source}")]
    CorruptCartFile {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
