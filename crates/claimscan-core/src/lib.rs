//! Core library for claim invoice extraction.
//!
//! This crate provides:
//! - A declarative field contract (names, Thai/English label synonyms, formats)
//! - An extraction client for the Gemini document-understanding API
//! - Batch orchestration with per-document failure isolation and stable ordering
//! - Uniform result tables for display and export

pub mod batch;
pub mod error;
pub mod extraction;
pub mod models;
pub mod pdf;
pub mod report;

pub use batch::{BatchProcessor, BatchSummary};
pub use error::{ClaimsError, ConfigError, ExtractionError, PdfError, Result, ServiceError};
pub use extraction::{DocumentExtractor, GeminiClient};
pub use models::claim::{Document, ExtractionResult, OutcomeStatus, PaymentCategory, ProcessingOutcome};
pub use models::config::ClaimsConfig;
pub use models::fields::{FieldContract, FieldSpec};
pub use report::ResultTable;
