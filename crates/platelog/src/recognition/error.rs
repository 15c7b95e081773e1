use thiserror::Error;

/// Failures talking to the food-recognition endpoint.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecognitionError {
    #[error("Failed to build recognition request: {0}")]
    Build(String),

    #[error("Recognition endpoint unreachable: {0}")]
    Transport(String),

    #[error("Recognition endpoint returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Malformed recognition response: {0}")]
    MalformedResponse(String),
}

impl RecognitionError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        RecognitionError::MalformedResponse(reason.into())
    }
}
