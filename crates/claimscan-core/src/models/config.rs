//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

use super::fields::FieldContract;
use crate::error::ConfigError;

/// Main configuration for claimscan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimsConfig {
    /// Extraction service configuration.
    pub service: ServiceConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Extraction service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the generative language API.
    pub base_url: String,

    /// Model used for extraction.
    pub model: String,

    /// API key. Takes precedence over the environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Sampling temperature (service default when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 120,
            temperature: None,
        }
    }
}

impl ServiceConfig {
    /// Resolve the API key from the config file, then the environment.
    ///
    /// There is no built-in fallback key: a missing key is an error.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Same as [`resolve_api_key`](Self::resolve_api_key) with an explicit
    /// environment lookup.
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key
            .clone()
            .or_else(|| lookup(&self.api_key_env))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey {
                env: self.api_key_env.clone(),
            })
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of documents extracted at the same time.
    pub concurrency: usize,

    /// Largest document sent to the service, in bytes.
    pub max_document_bytes: usize,

    /// Most pages a document may have, when its page count can be read.
    pub max_pages: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            max_document_bytes: 20 * 1024 * 1024,
            max_pages: 1000,
        }
    }
}

/// Field extraction settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Fields to extract.
    pub fields: FieldContract,
}

impl ClaimsConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "batch.concurrency".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.batch.max_pages == 0 {
            return Err(ConfigError::Invalid {
                key: "batch.max_pages".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.service.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "service.timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        self.extraction.fields.validate()
    }
}
