use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatelogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Recognition error: {0}")]
    Recognition(#[from] crate::recognition::RecognitionError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Errors surfaced synchronously by the intake pipeline.
///
/// Enrichment-time failures never appear here; they end up as
/// `status = failed` on the record instead.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Invalid upload: {0}")]
    Validation(String),

    #[error("Intake record '{0}' not found")]
    NotFound(String),

    #[error("Failed to store image: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to persist intake record: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Failed to schedule enrichment: {0}")]
    Worker(#[from] WorkerError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Invalid image key: {0}")]
    InvalidKey(String),

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, PlatelogError>;
