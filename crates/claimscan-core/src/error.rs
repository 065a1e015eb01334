//! Error types for the claimscan-core library.

use thiserror::Error;

/// Main error type for the claimscan library.
#[derive(Error, Debug)]
pub enum ClaimsError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Extraction service could not be set up.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// A single document could not be extracted.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// PDF pre-flight error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No API key in the config file nor in the environment.
    #[error("no API key configured: set service.api_key or the {env} environment variable")]
    MissingApiKey { env: String },

    /// The configuration file could not be parsed.
    #[error("invalid configuration file: {0}")]
    Parse(String),

    /// The field contract is unusable.
    #[error("invalid field contract: {0}")]
    Contract(String),

    /// A value is out of its allowed range.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Errors raised while constructing the extraction service client.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The API key cannot be sent as a header value.
    #[error("API key is not a valid header value")]
    InvalidApiKey,

    /// The base URL is malformed.
    #[error("invalid service URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Errors related to extracting fields from one document.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The request never produced an HTTP response.
    #[error("request to extraction service failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("extraction service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The service refused the prompt.
    #[error("prompt blocked by the extraction service ({reason})")]
    Blocked {
        reason: String,
        feedback: Option<String>,
    },

    /// The service returned no usable text.
    #[error("extraction service returned no content (finish reason: {finish_reason})")]
    EmptyResponse {
        finish_reason: String,
        feedback: Option<String>,
    },

    /// The response body is not valid JSON.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The decoded record does not match the field contract.
    #[error("response does not match schema: {0}")]
    Schema(String),
}

impl ExtractionError {
    /// Content-safety feedback reported by the service, if any.
    pub fn feedback(&self) -> Option<&str> {
        match self {
            ExtractionError::Blocked { feedback, .. }
            | ExtractionError::EmptyResponse { feedback, .. } => feedback.as_deref(),
            _ => None,
        }
    }
}

/// Errors related to the local PDF pre-flight check.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PdfError {
    /// The buffer is empty.
    #[error("document is empty")]
    Empty,

    /// The buffer does not start with a PDF header.
    #[error("document is not a PDF")]
    NotPdf,

    /// The document exceeds the inline payload limit.
    #[error("document is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    /// The document has more pages than the service accepts.
    #[error("document has {pages} pages, limit is {limit}")]
    TooManyPages { pages: u32, limit: u32 },
}

/// Result type for the claimscan library.
pub type Result<T> = std::result::Result<T, ClaimsError>;
