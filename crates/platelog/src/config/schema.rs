use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            storage: StorageConfig::default(),
            recognition: RecognitionConfig::default(),
            workers: WorkersConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Directory uploaded food images are written to.
    #[serde(default = "default_upload_directory")]
    pub upload_directory: PathBuf,
    /// SQLite database file. Falls back to `~/.platelog/data/platelog.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

fn default_upload_directory() -> PathBuf {
    PathBuf::from("uploads/food_images")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_directory: default_upload_directory(),
            database_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Multipart field name the image part is sent under.
    #[serde(default = "default_field_name")]
    pub field_name: String,
    /// Content type of the image part. Derived from the file extension when unset.
    #[serde(default)]
    pub image_content_type: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:8000/analyze-food".to_string()
}

fn default_field_name() -> String {
    "file".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            field_name: default_field_name(),
            image_content_type: None,
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkersConfig {
    #[serde(default = "default_worker_count")]
    pub count: usize,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
