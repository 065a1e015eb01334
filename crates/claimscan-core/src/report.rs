//! Shapes batch outcomes into a uniform table.

use serde_json::{Map, Value};

use crate::models::claim::{OutcomeStatus, ProcessingOutcome};
use crate::models::fields::FieldContract;

pub const FILENAME_COLUMN: &str = "Filename";
pub const CATEGORY_COLUMN: &str = "Payment Category";
pub const ERROR_COLUMN: &str = "Error";

/// Text placed in the error column of a failed row.
pub const FAILURE_MARKER: &str = "Failed to extract data";

/// One row of the result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    /// Cells in column order.
    pub cells: Vec<String>,
    /// Whether extraction failed for this row.
    pub failed: bool,
}

/// Outcomes as a header plus equally sized rows.
///
/// The error column is only present when at least one document failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn from_outcomes(outcomes: &[ProcessingOutcome], contract: &FieldContract) -> Self {
        let has_failures = outcomes.iter().any(|o| !o.is_success());

        let mut columns = vec![FILENAME_COLUMN.to_string(), CATEGORY_COLUMN.to_string()];
        columns.extend(contract.fields().iter().map(|f| f.label.clone()));
        if has_failures {
            columns.push(ERROR_COLUMN.to_string());
        }

        let rows = outcomes
            .iter()
            .map(|outcome| {
                let mut cells = vec![outcome.filename.clone(), outcome.category.to_string()];

                match &outcome.status {
                    OutcomeStatus::Extracted { result } => {
                        cells.extend(
                            contract
                                .names()
                                .map(|name| result.get(name).unwrap_or_default().to_string()),
                        );
                        if has_failures {
                            cells.push(String::new());
                        }
                    }
                    OutcomeStatus::Failed { .. } => {
                        cells.extend(contract.fields().iter().map(|_| String::new()));
                        cells.push(FAILURE_MARKER.to_string());
                    }
                }

                ResultRow {
                    cells,
                    failed: !outcome.is_success(),
                }
            })
            .collect();

        Self { columns, rows }
    }

    /// Rows as JSON objects keyed by column name.
    ///
    /// Successful rows carry every data column; failed rows carry only the
    /// file name, category and error.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = Map::new();
                for (column, cell) in self.columns.iter().zip(&row.cells) {
                    let keep = if row.failed {
                        column == FILENAME_COLUMN || column == CATEGORY_COLUMN || column == ERROR_COLUMN
                    } else {
                        column != ERROR_COLUMN
                    };
                    if keep {
                        record.insert(column.clone(), Value::String(cell.clone()));
                    }
                }
                Value::Object(record)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::claim::{ExtractionResult, PaymentCategory};
    use crate::models::fields::GROSS_AMOUNT;
    use pretty_assertions::assert_eq;

    fn success(name: &str, category: PaymentCategory, gross: &str) -> ProcessingOutcome {
        let contract = FieldContract::default();
        ProcessingOutcome {
            filename: name.to_string(),
            category,
            elapsed_ms: 1,
            status: OutcomeStatus::Extracted {
                result: ExtractionResult::new(
                    contract
                        .names()
                        .map(|n| {
                            let v = if n == GROSS_AMOUNT { gross } else { "" };
                            (n.to_string(), v.to_string())
                        })
                        .collect(),
                ),
            },
        }
    }

    fn failure(name: &str, category: PaymentCategory) -> ProcessingOutcome {
        ProcessingOutcome {
            filename: name.to_string(),
            category,
            elapsed_ms: 1,
            status: OutcomeStatus::Failed {
                error: "request to extraction service failed: reset".to_string(),
                feedback: None,
            },
        }
    }

    #[test]
    fn test_columns_without_failures() {
        let table = ResultTable::from_outcomes(
            &[success("a.pdf", PaymentCategory::OdRepairCost, "8699.40")],
            &FieldContract::default(),
        );

        assert_eq!(
            table.columns,
            vec![
                "Filename",
                "Payment Category",
                "Payee Account Name",
                "Net Amount",
                "VAT Amount",
                "Gross Amount",
                "Tax Invoice No",
                "Tax Invoice Date",
                "Invoice No",
                "Invoice Date",
            ]
        );
        assert_eq!(table.rows[0].cells[5], "8699.40");
        assert_eq!(table.rows[0].cells[2], "");
    }

    #[test]
    fn test_mixed_batch_is_uniform() {
        let table = ResultTable::from_outcomes(
            &[
                success("a.pdf", PaymentCategory::OdRepairCost, "8699.40"),
                failure("b.pdf", PaymentCategory::TppdRepairCost),
            ],
            &FieldContract::default(),
        );

        assert_eq!(table.columns.len(), 11);
        assert_eq!(table.columns.last().unwrap(), "Error");
        assert!(table.rows.iter().all(|r| r.cells.len() == 11));

        let failed = &table.rows[1];
        assert!(failed.failed);
        assert_eq!(failed.cells[0], "b.pdf");
        assert_eq!(failed.cells[1], "TPPD Repair Cost");
        assert!(failed.cells[2..10].iter().all(String::is_empty));
        assert_eq!(failed.cells[10], FAILURE_MARKER);
        assert_eq!(table.rows[0].cells[10], "");
    }

    #[test]
    fn test_records_match_row_shapes() {
        let table = ResultTable::from_outcomes(
            &[
                success("a.pdf", PaymentCategory::OdRepairCost, "8699.40"),
                failure("b.pdf", PaymentCategory::TppdRepairCost),
            ],
            &FieldContract::default(),
        );
        let records = table.to_records();

        assert_eq!(records[0]["Payment Category"], "OD Repair Cost");
        assert_eq!(records[0]["Gross Amount"], "8699.40");
        assert!(records[0].get("Error").is_none());

        assert_eq!(
            records[1],
            serde_json::json!({
                "Filename": "b.pdf",
                "Payment Category": "TPPD Repair Cost",
                "Error": "Failed to extract data"
            })
        );
    }

    #[test]
    fn test_record_keys_follow_column_order() {
        let table = ResultTable::from_outcomes(
            &[
                success("a.pdf", PaymentCategory::OdRepairCost, "8699.40"),
                failure("b.pdf", PaymentCategory::TppdRepairCost),
            ],
            &FieldContract::default(),
        );
        let records = table.to_records();

        let keys: Vec<&String> = records[0].as_object().unwrap().keys().collect();
        let expected: Vec<&String> = table.columns[..10].iter().collect();
        assert_eq!(keys, expected);

        assert_eq!(
            serde_json::to_string(&records[1]).unwrap(),
            r#"{"Filename":"b.pdf","Payment Category":"TPPD Repair Cost","Error":"Failed to extract data"}"#
        );
    }

    #[test]
    fn test_empty_batch() {
        let table = ResultTable::from_outcomes(&[], &FieldContract::default());
        assert!(table.rows.is_empty());
        assert_eq!(table.columns.len(), 10);
    }
}
