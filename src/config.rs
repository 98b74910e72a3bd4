// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::backend::memory::InMemoryBackend;
use crate::backend::s3::S3Backend;
use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};

/// Backend type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// AWS S3 (or an S3-compatible endpoint)
    S3,
    /// In-process memory backend
    Memory,
}

/// Generic configuration for storage backends
///
/// This configuration uses a HashMap to store backend-specific options,
/// which are applied to the underlying client builders. Retry and timeout
/// policy configured here is enforced by the backend client, not by the
/// stream layer.
///
/// # Examples
///
/// ## AWS S3
/// ```
/// use bucket_stream::BackendConfig;
///
/// let config = BackendConfig::s3()
///     .with_option("region", "us-east-1")
///     .with_option("access_key_id", "ACCESS_KEY")
///     .with_option("secret_access_key", "SECRET_ACCESS_KEY");
/// ```
///
/// ## Memory
/// ```
/// use bucket_stream::BackendConfig;
///
/// let config = BackendConfig::memory().with_option("page_size", "100");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend type
    #[serde(rename = "type")]
    pub backend_type: BackendType,

    /// Backend-specific configuration options
    ///
    /// S3:
    /// - region: AWS region (e.g., "us-east-1")
    /// - access_key_id / secret_access_key: static credentials
    /// - session_token: session token for temporary credentials
    /// - endpoint: custom endpoint URL (for S3-compatible services)
    /// - force_path_style: "true" for path-style addressing
    /// - timeout / connect_timeout: seconds, enforced by the SDK
    /// - max_retries: retry attempts, enforced by the SDK
    ///
    /// Memory:
    /// - page_size: entries per listing page
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl BackendConfig {
    /// Create a configuration from a backend type name ("s3" or "memory").
    pub fn new(backend_type: impl Into<String>) -> Self {
        let type_str = backend_type.into();
        let backend_type = match type_str.to_lowercase().as_str() {
            "s3" | "aws" => BackendType::S3,
            "memory" | "mem" => BackendType::Memory,
            _ => panic!("Unknown backend type: {}", type_str),
        };

        Self {
            backend_type,
            options: HashMap::new(),
        }
    }

    /// Create an S3 backend configuration.
    pub fn s3() -> Self {
        Self {
            backend_type: BackendType::S3,
            options: HashMap::new(),
        }
    }

    /// Create a memory backend configuration.
    pub fn memory() -> Self {
        Self {
            backend_type: BackendType::Memory,
            options: HashMap::new(),
        }
    }

    /// Add a configuration option (for method chaining).
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add multiple configuration options (for method chaining).
    pub fn with_options(mut self, options: HashMap<String, String>) -> Self {
        self.options.extend(options);
        self
    }

    /// Get a configuration option.
    pub fn get_option(&self, key: &str) -> Option<&String> {
        self.options.get(key)
    }

    /// Get the backend type as a string.
    pub fn backend_type_str(&self) -> &str {
        match self.backend_type {
            BackendType::S3 => "s3",
            BackendType::Memory => "memory",
        }
    }
}

/// Factory for creating storage backends from configuration
pub struct BackendFactory;

impl BackendFactory {
    /// Build a shared backend from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required options are missing or malformed, e.g.
    /// an endpoint URL that does not parse.
    pub async fn from_config(config: BackendConfig) -> StorageResult<Arc<dyn StorageBackend>> {
        match config.backend_type {
            BackendType::Memory => Self::build_memory(&config),
            BackendType::S3 => Self::build_s3(&config).await,
        }
    }

    fn build_memory(config: &BackendConfig) -> StorageResult<Arc<dyn StorageBackend>> {
        let mut backend = InMemoryBackend::new();
        if let Some(page_size) = config.get_option("page_size") {
            let page_size = page_size.parse::<usize>().map_err(|_| {
                StorageError::Config(format!("Invalid page_size option: {page_size}"))
            })?;
            backend = backend.with_page_size(page_size);
        }
        info!("Created memory backend");
        Ok(Arc::new(backend))
    }

    async fn build_s3(config: &BackendConfig) -> StorageResult<Arc<dyn StorageBackend>> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        let mut endpoint: Option<&String> = None;
        let mut force_path_style = false;
        let mut timeouts = TimeoutConfig::builder();

        for (key, value) in &config.options {
            match key.as_str() {
                "region" => loader = loader.region(Region::new(value.clone())),
                "endpoint" => {
                    Url::parse(value)?;
                    endpoint = Some(value);
                }
                "force_path_style" => force_path_style = value.to_lowercase() == "true",
                "timeout" => {
                    if let Ok(secs) = value.parse::<u64>() {
                        timeouts = timeouts.operation_timeout(Duration::from_secs(secs));
                    }
                }
                "connect_timeout" => {
                    if let Ok(secs) = value.parse::<u64>() {
                        timeouts = timeouts.connect_timeout(Duration::from_secs(secs));
                    }
                }
                "max_retries" => {
                    if let Ok(attempts) = value.parse::<u32>() {
                        loader =
                            loader.retry_config(RetryConfig::standard().with_max_attempts(attempts));
                    }
                }
                // Credentials are assembled below from their option pair.
                "access_key_id" | "secret_access_key" | "session_token" => (),
                _ => {
                    tracing::warn!("Unknown S3 option: {}", key);
                }
            }
        }

        if let (Some(access_key_id), Some(secret_access_key)) = (
            config.get_option("access_key_id"),
            config.get_option("secret_access_key"),
        ) {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                config.get_option("session_token").cloned(),
                None,
                "bucket-stream-config",
            ));
        }

        loader = loader.timeout_config(timeouts.build());
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if force_path_style {
            builder = builder.force_path_style(true);
        }

        let client = aws_sdk_s3::Client::from_conf(builder.build());
        info!("Created S3 backend");
        Ok(Arc::new(S3Backend::new(client)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_serialization() {
        assert_eq!(serde_json::to_string(&BackendType::S3).unwrap(), "\"s3\"");
        assert_eq!(
            serde_json::to_string(&BackendType::Memory).unwrap(),
            "\"memory\""
        );
    }

    #[test]
    fn test_backend_config_new() {
        assert_eq!(BackendConfig::new("s3").backend_type, BackendType::S3);
        assert_eq!(BackendConfig::new("AWS").backend_type, BackendType::S3);
        assert_eq!(
            BackendConfig::new("memory").backend_type,
            BackendType::Memory
        );
        assert_eq!(BackendConfig::new("mem").backend_type, BackendType::Memory);
    }

    #[test]
    #[should_panic(expected = "Unknown backend type")]
    fn test_backend_config_new_invalid() {
        BackendConfig::new("carrier-pigeon");
    }

    #[test]
    fn test_with_option_chaining() {
        let config = BackendConfig::s3()
            .with_option("region", "us-west-2")
            .with_option("endpoint", "http://localhost:9000");

        assert_eq!(config.get_option("region"), Some(&"us-west-2".to_string()));
        assert_eq!(
            config.get_option("endpoint"),
            Some(&"http://localhost:9000".to_string())
        );
        assert_eq!(config.get_option("nonexistent"), None);
    }

    #[test]
    fn test_with_options() {
        let mut extra = HashMap::new();
        extra.insert("region".to_string(), "eu-west-1".to_string());
        extra.insert("force_path_style".to_string(), "true".to_string());

        let config = BackendConfig::s3().with_options(extra);
        assert_eq!(config.get_option("region"), Some(&"eu-west-1".to_string()));
        assert_eq!(
            config.get_option("force_path_style"),
            Some(&"true".to_string())
        );
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = BackendConfig::s3().with_option("region", "us-east-1");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"type\":\"s3\""));

        let parsed: BackendConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.backend_type, BackendType::S3);
        assert_eq!(parsed.get_option("region"), Some(&"us-east-1".to_string()));
    }

    #[test]
    fn test_config_deserialization_defaults_options() {
        let parsed: BackendConfig = serde_json::from_str(r#"{"type":"memory"}"#).unwrap();
        assert_eq!(parsed.backend_type, BackendType::Memory);
        assert!(parsed.options.is_empty());
    }

    #[tokio::test]
    async fn test_factory_builds_memory_backend() {
        let backend = BackendFactory::from_config(
            BackendConfig::memory().with_option("page_size", "5"),
        )
        .await
        .unwrap();
        assert_eq!(backend.kind(), "memory");
    }

    #[tokio::test]
    async fn test_factory_rejects_bad_page_size() {
        let result = BackendFactory::from_config(
            BackendConfig::memory().with_option("page_size", "many"),
        )
        .await;
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[tokio::test]
    async fn test_factory_rejects_bad_endpoint() {
        let result = BackendFactory::from_config(
            BackendConfig::s3().with_option("endpoint", "not a url"),
        )
        .await;
        assert!(matches!(result, Err(StorageError::UrlParse(_))));
    }

    #[tokio::test]
    async fn test_factory_builds_s3_backend() {
        let backend = BackendFactory::from_config(
            BackendConfig::s3()
                .with_option("region", "us-east-1")
                .with_option("access_key_id", "AKIDEXAMPLE")
                .with_option("secret_access_key", "SECRETEXAMPLE")
                .with_option("endpoint", "http://localhost:9000")
                .with_option("force_path_style", "true")
                .with_option("max_retries", "3")
                .with_option("timeout", "30"),
        )
        .await
        .unwrap();
        assert_eq!(backend.kind(), "s3");
    }
}
