//! Claim document and extraction outcome models.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Payment category a user assigns to a claim document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentCategory {
    /// Own-damage repair cost.
    #[default]
    #[serde(rename = "OD Repair Cost")]
    OdRepairCost,
    /// Windscreen repair cost.
    #[serde(rename = "Windscreen Repair Cost")]
    WindscreenRepairCost,
    /// Third-party property damage repair cost.
    #[serde(rename = "TPPD Repair Cost")]
    TppdRepairCost,
}

impl PaymentCategory {
    /// All categories in display order.
    pub const ALL: [PaymentCategory; 3] = [
        PaymentCategory::OdRepairCost,
        PaymentCategory::WindscreenRepairCost,
        PaymentCategory::TppdRepairCost,
    ];

    /// Label shown in result tables.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentCategory::OdRepairCost => "OD Repair Cost",
            PaymentCategory::WindscreenRepairCost => "Windscreen Repair Cost",
            PaymentCategory::TppdRepairCost => "TPPD Repair Cost",
        }
    }
}

impl fmt::Display for PaymentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();

        match normalized.as_str() {
            "od repair cost" | "od" => Ok(PaymentCategory::OdRepairCost),
            "windscreen repair cost" | "windscreen" => Ok(PaymentCategory::WindscreenRepairCost),
            "tppd repair cost" | "tppd" => Ok(PaymentCategory::TppdRepairCost),
            _ => Err(format!(
                "Invalid payment category: {} (expected one of: {})",
                s,
                PaymentCategory::ALL
                    .iter()
                    .map(|c| c.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// One uploaded document paired with its payment category.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name shown in the result table.
    pub filename: String,
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
    /// User-selected payment category.
    pub category: PaymentCategory,
}

impl Document {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>, category: PaymentCategory) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            category,
        }
    }

    /// Read a document from disk, using the file name as its display name.
    pub fn from_path(path: &Path, category: PaymentCategory) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(Self::display_name(path), bytes, category))
    }

    /// Name a document read from `path` is shown under.
    pub fn display_name(path: &Path) -> String {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string())
    }
}

/// Fields extracted from one document, in field-contract order.
///
/// Every contract field is present; a value the service could not find is an
/// empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    values: Vec<(String, String)>,
}

impl ExtractionResult {
    pub fn new(values: Vec<(String, String)>) -> Self {
        Self { values }
    }

    /// Value of a field by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over `(field, value)` pairs in contract order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in &self.values {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

/// Result of processing one document.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingOutcome {
    /// File name of the source document.
    pub filename: String,
    /// Payment category chosen for the document.
    pub category: PaymentCategory,
    /// Wall-clock time spent on the document.
    pub elapsed_ms: u64,
    /// Extracted record or failure detail.
    pub status: OutcomeStatus,
}

/// Success or failure of one document.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Fields were extracted and validated.
    Extracted { result: ExtractionResult },
    /// Extraction failed; nothing was extracted.
    Failed {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        feedback: Option<String>,
    },
}

impl ProcessingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Extracted { .. })
    }

    /// Extracted record, if the document succeeded.
    pub fn result(&self) -> Option<&ExtractionResult> {
        match &self.status {
            OutcomeStatus::Extracted { result } => Some(result),
            OutcomeStatus::Failed { .. } => None,
        }
    }

    /// Error detail, if the document failed.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Extracted { .. } => None,
            OutcomeStatus::Failed { error, .. } => Some(error),
        }
    }
}
