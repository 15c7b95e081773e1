use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;

pub const ENV_RECOGNITION_ENDPOINT: &str = "PLATELOG_RECOGNITION_ENDPOINT";
pub const ENV_UPLOAD_DIR: &str = "PLATELOG_UPLOAD_DIR";
pub const ENV_DATABASE_PATH: &str = "PLATELOG_DATABASE_PATH";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let mut config: Config = serde_json::from_str(content)?;

    apply_env_overrides(&mut config);

    validate_config(&config)?;

    Ok(config)
}

/// Overlays deployment-specific values from the environment.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(endpoint) = non_empty_env(ENV_RECOGNITION_ENDPOINT) {
        log::info!("Recognition endpoint overridden by {}", ENV_RECOGNITION_ENDPOINT);
        config.recognition.endpoint = endpoint;
    }
    if let Some(dir) = non_empty_env(ENV_UPLOAD_DIR) {
        config.storage.upload_directory = PathBuf::from(dir);
    }
    if let Some(path) = non_empty_env(ENV_DATABASE_PATH) {
        config.storage.database_path = Some(PathBuf::from(path));
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    let endpoint =
        reqwest::Url::parse(&config.recognition.endpoint).map_err(|e| ConfigError::Validation {
            message: format!(
                "Invalid recognition endpoint '{}': {}",
                config.recognition.endpoint, e
            ),
        })?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            message: format!(
                "Recognition endpoint must use http or https, got '{}'",
                endpoint.scheme()
            ),
        });
    }

    if config.recognition.field_name.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "Recognition field name must not be empty".to_string(),
        });
    }

    if let Some(content_type) = &config.recognition.image_content_type {
        if !content_type.starts_with("image/") {
            return Err(ConfigError::Validation {
                message: format!("Image content type must be image/*, got '{}'", content_type),
            });
        }
    }

    if config.recognition.connect_timeout_secs == 0 || config.recognition.request_timeout_secs == 0
    {
        return Err(ConfigError::Validation {
            message: "Recognition timeouts must be greater than zero".to_string(),
        });
    }

    if config.workers.count == 0 {
        return Err(ConfigError::Validation {
            message: "Worker count must be greater than zero".to_string(),
        });
    }

    Ok(())
}
