//! Batch orchestration: one extraction per document, outcomes in input order.

use std::future::Future;
use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;
use std::time::Instant;

use futures_util::stream::{self, Stream, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ClaimsError;
use crate::extraction::DocumentExtractor;
use crate::models::claim::{
    Document, ExtractionResult, OutcomeStatus, PaymentCategory, ProcessingOutcome,
};
use crate::models::config::BatchConfig;
use crate::pdf;

/// Runs documents through an extractor and collects one outcome per document.
///
/// Failures are isolated: a document that fails yields a failure outcome and
/// the batch carries on. Documents are attempted exactly once.
pub struct BatchProcessor {
    extractor: Arc<dyn DocumentExtractor>,
    concurrency: usize,
    limits: pdf::Limits,
}

impl BatchProcessor {
    pub fn new(extractor: Arc<dyn DocumentExtractor>, config: &BatchConfig) -> Self {
        Self {
            extractor,
            concurrency: config.concurrency.max(1),
            limits: pdf::Limits {
                max_bytes: config.max_document_bytes,
                max_pages: config.max_pages,
            },
        }
    }

    /// Set how many documents may be in flight at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Process every document; the result is index-aligned with the input.
    pub async fn process_batch(&self, documents: Vec<Document>) -> Vec<ProcessingOutcome> {
        self.process_batch_with(documents, |_, _| {}).await
    }

    /// Like [`process_batch`](Self::process_batch), calling `on_outcome` with
    /// each outcome's index as it becomes available, in input order.
    pub async fn process_batch_with<F>(
        &self,
        documents: Vec<Document>,
        on_outcome: F,
    ) -> Vec<ProcessingOutcome>
    where
        F: FnMut(usize, &ProcessingOutcome),
    {
        let total = documents.len();
        let pending = stream::iter(documents.into_iter().enumerate())
            .map(|(index, document)| self.process_document(index, document));

        self.run_pending(total, pending, on_outcome).await
    }

    /// Read and process files from disk, in the given order.
    ///
    /// Files are read only when their turn comes. A file that cannot be read
    /// yields a failure outcome like any other per-document error.
    pub async fn process_files_with<F>(
        &self,
        files: Vec<(PathBuf, PaymentCategory)>,
        on_outcome: F,
    ) -> Vec<ProcessingOutcome>
    where
        F: FnMut(usize, &ProcessingOutcome),
    {
        let total = files.len();
        let pending = stream::iter(files.into_iter().enumerate())
            .map(|(index, (path, category))| self.process_file(index, path, category));

        self.run_pending(total, pending, on_outcome).await
    }

    async fn run_pending<S, Fut, F>(
        &self,
        total: usize,
        pending: S,
        mut on_outcome: F,
    ) -> Vec<ProcessingOutcome>
    where
        S: Stream<Item = Fut>,
        Fut: Future<Output = ProcessingOutcome>,
        F: FnMut(usize, &ProcessingOutcome),
    {
        info!(documents = total, concurrency = self.concurrency, "Processing batch");

        let mut outcomes = Vec::with_capacity(total);
        let mut pending = pin!(pending.buffered(self.concurrency));

        while let Some(outcome) = pending.next().await {
            on_outcome(outcomes.len(), &outcome);
            outcomes.push(outcome);
        }

        let summary = BatchSummary::from_outcomes(&outcomes);
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Batch complete"
        );

        outcomes
    }

    async fn process_file(
        &self,
        index: usize,
        path: PathBuf,
        category: PaymentCategory,
    ) -> ProcessingOutcome {
        match Document::from_path(&path, category) {
            Ok(document) => self.process_document(index, document).await,
            Err(e) => {
                let filename = Document::display_name(&path);
                warn!(index, file = %filename, error = %e, "Failed to read document");
                ProcessingOutcome {
                    filename,
                    category,
                    elapsed_ms: 0,
                    status: failure(ClaimsError::Io(e)),
                }
            }
        }
    }

    async fn process_document(&self, index: usize, document: Document) -> ProcessingOutcome {
        let start = Instant::now();
        debug!(index, file = %document.filename, category = %document.category, "Extracting");

        let status = match self.extract(&document).await {
            Ok(result) => OutcomeStatus::Extracted { result },
            Err(e) => {
                warn!(index, file = %document.filename, error = %e, "Failed to extract data");
                failure(e)
            }
        };

        ProcessingOutcome {
            filename: document.filename,
            category: document.category,
            elapsed_ms: start.elapsed().as_millis() as u64,
            status,
        }
    }

    async fn extract(&self, document: &Document) -> crate::Result<ExtractionResult> {
        let info = pdf::inspect(&document.bytes, &self.limits)?;
        debug!(file = %document.filename, pages = ?info.page_count, "Sending document");
        Ok(self.extractor.extract(&document.bytes).await?)
    }
}

fn failure(error: ClaimsError) -> OutcomeStatus {
    let feedback = match &error {
        ClaimsError::Extraction(inner) => inner.feedback().map(str::to_string),
        _ => None,
    };
    OutcomeStatus::Failed {
        error: error.to_string(),
        feedback,
    }
}

/// Counts over a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[ProcessingOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }
}
