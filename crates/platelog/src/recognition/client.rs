use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client};
use tracing::instrument::WithSubscriber;
use tracing::{debug, Dispatch};

use crate::config::RecognitionConfig;
use crate::sanitize;

use super::error::RecognitionError;
use super::types::RawResult;

/// Content type sent for the image part when nothing better is known.
pub const FALLBACK_IMAGE_CONTENT_TYPE: &str = "image/webp";

/// Error bodies are cut to this many characters before they reach logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
        Some((cut, _)) => format!("{}... (truncated)", &body[..cut]),
        None => body.to_string(),
    }
}

/// Sends a stored image to the recognition service and returns its raw answer.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn analyze(&self, image: Vec<u8>, filename: &str) -> Result<RawResult, RecognitionError>;
}

/// HTTP client for the food-recognition endpoint.
///
/// Each call is a single multipart POST; there is no retry. Diagnostics go
/// to the dispatcher given to [`RecognitionClient::with_dispatch`], or to the
/// current default one.
pub struct RecognitionClient {
    client: Client,
    endpoint: String,
    field_name: String,
    image_content_type: Option<String>,
    dispatch: Option<Dispatch>,
}

impl RecognitionClient {
    pub fn new(config: &RecognitionConfig) -> Result<Self, RecognitionError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RecognitionError::Build(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            field_name: config.field_name.clone(),
            image_content_type: config.image_content_type.clone(),
            dispatch: None,
        })
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Content type for the image part: the configured one, else guessed
    /// from the file extension.
    pub fn part_content_type(&self, filename: &str) -> String {
        if let Some(configured) = &self.image_content_type {
            return configured.clone();
        }
        mime_guess::from_path(filename)
            .first()
            .filter(|m| m.type_() == mime_guess::mime::IMAGE)
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| FALLBACK_IMAGE_CONTENT_TYPE.to_string())
    }

    fn build_form(&self, image: Vec<u8>, filename: &str) -> Result<Form, RecognitionError> {
        let part = Part::bytes(image)
            .file_name(filename.to_string())
            .mime_str(&self.part_content_type(filename))
            .map_err(|e| RecognitionError::Build(format!("Invalid image content type: {}", e)))?;

        Ok(Form::new().part(self.field_name.clone(), part))
    }

    async fn send(&self, image: Vec<u8>, filename: &str) -> Result<RawResult, RecognitionError> {
        debug!(
            endpoint = %sanitize::redact_endpoint(&self.endpoint),
            bytes = image.len(),
            "Sending image to recognition endpoint"
        );

        let form = self.build_form(image, filename)?;
        let response = self
            .client
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), "Recognition endpoint answered");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecognitionError::BadStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;

        serde_json::from_slice::<RawResult>(&body)
            .map_err(|e| RecognitionError::malformed(e.to_string()))
    }
}

#[async_trait]
impl Recognizer for RecognitionClient {
    async fn analyze(&self, image: Vec<u8>, filename: &str) -> Result<RawResult, RecognitionError> {
        match &self.dispatch {
            Some(dispatch) => {
                self.send(image, filename)
                    .with_subscriber(dispatch.clone())
                    .await
            }
            None => self.send(image, filename).await,
        }
    }
}
