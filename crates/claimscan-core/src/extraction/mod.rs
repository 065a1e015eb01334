//! Field extraction through an external document-understanding service.

mod gemini;
mod record;
mod types;

pub use gemini::GeminiClient;
pub use record::parse_record;

use async_trait::async_trait;

use crate::error::ExtractionError;
use crate::models::claim::ExtractionResult;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Turns the bytes of one PDF into a validated record.
///
/// Implementations never panic on service misbehaviour; every failure is an
/// [`ExtractionError`].
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, document: &[u8]) -> Result<ExtractionResult>;
}
