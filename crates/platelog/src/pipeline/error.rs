use thiserror::Error;

use crate::error::StorageError;
use crate::recognition::RecognitionError;

/// Why an enrichment attempt resolved to `failed`.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("Failed to read image: {0}")]
    Image(#[from] StorageError),

    #[error("Image read task failed: {0}")]
    ImageTask(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Recognition(#[from] RecognitionError),
}
