//! Extraction client for the Gemini `generateContent` API.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use super::record::parse_record;
use super::types::*;
use super::{DocumentExtractor, Result};
use crate::error::{ClaimsError, ExtractionError, ServiceError};
use crate::models::claim::ExtractionResult;
use crate::models::config::{ClaimsConfig, ExtractionConfig, ServiceConfig};
use crate::models::fields::FieldContract;

const API_KEY_HEADER: &str = "x-goog-api-key";
const PDF_MIME_TYPE: &str = "application/pdf";
const JSON_MIME_TYPE: &str = "application/json";
const MAX_ERROR_BODY: usize = 500;

/// Document extractor backed by a Gemini model.
///
/// Stateless per call; one instance is shared by every document of a batch.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
    contract: FieldContract,
    instructions: String,
    schema: Value,
}

impl GeminiClient {
    /// Build a client from configuration, resolving the API key.
    ///
    /// Fails before any document is touched when the key is missing or the
    /// HTTP client cannot be set up.
    pub fn from_config(config: &ClaimsConfig) -> crate::Result<Self> {
        config.validate()?;
        let api_key = config.service.resolve_api_key()?;
        Self::new(&config.service, &config.extraction, &api_key).map_err(ClaimsError::from)
    }

    /// Build a client with an explicit API key.
    pub fn new(
        service: &ServiceConfig,
        extraction: &ExtractionConfig,
        api_key: &str,
    ) -> std::result::Result<Self, ServiceError> {
        let base = reqwest::Url::parse(&service.base_url).map_err(|e| ServiceError::InvalidUrl {
            url: service.base_url.clone(),
            reason: e.to_string(),
        })?;

        let mut key = HeaderValue::from_str(api_key).map_err(|_| ServiceError::InvalidApiKey)?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(service.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ServiceError::Client(e.to_string()))?;

        let endpoint = format!(
            "{}/models/{}:generateContent",
            base.as_str().trim_end_matches('/'),
            service.model
        );

        debug!(endpoint = %endpoint, "Extraction client ready");

        Ok(Self {
            http,
            endpoint,
            model: service.model.clone(),
            temperature: service.temperature,
            instructions: extraction.fields.instructions(),
            schema: extraction.fields.response_schema(),
            contract: extraction.fields.clone(),
        })
    }

    /// Full URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn build_request(&self, document: &[u8]) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::inline(PDF_MIME_TYPE, STANDARD.encode(document)),
                    Part::text(self.instructions.clone()),
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: JSON_MIME_TYPE.to_string(),
                response_schema: self.schema.clone(),
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl DocumentExtractor for GeminiClient {
    async fn extract(&self, document: &[u8]) -> Result<ExtractionResult> {
        let request = self.build_request(document);

        debug!(model = %self.model, bytes = document.len(), "Gemini extraction request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExtractionError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        let text = response_text(parsed)?;
        parse_record(&text, &self.contract)
    }
}

/// Pull the generated text out of a response, surfacing safety feedback.
pub(crate) fn response_text(response: GenerateContentResponse) -> Result<String> {
    let prompt_feedback = response.prompt_feedback.unwrap_or_default();

    if let Some(reason) = prompt_feedback.block_reason {
        let feedback = describe_ratings(&prompt_feedback.safety_ratings);
        warn!(reason = %reason, feedback = ?feedback, "Prompt blocked by extraction service");
        return Err(ExtractionError::Blocked { reason, feedback });
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ExtractionError::EmptyResponse {
            finish_reason: "NO_CANDIDATES".to_string(),
            feedback: describe_ratings(&prompt_feedback.safety_ratings),
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyResponse {
            finish_reason: candidate
                .finish_reason
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            feedback: describe_ratings(&candidate.safety_ratings),
        });
    }

    Ok(text)
}

/// Best-effort human-readable message from an error body.
fn api_error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorResponse>(body) {
        return match parsed.error.status {
            Some(status) => format!("{}: {}", status, parsed.error.message),
            None => parsed.error.message,
        };
    }

    let trimmed = body.trim();
    if trimmed.len() <= MAX_ERROR_BODY {
        return trimmed.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}
