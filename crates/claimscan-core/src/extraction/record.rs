//! Decoding and validating the service's JSON answer against the field contract.

use serde_json::Value;
use tracing::debug;

use super::Result;
use crate::error::ExtractionError;
use crate::models::claim::ExtractionResult;
use crate::models::fields::FieldContract;

/// Strip a markdown code fence the model may wrap around its JSON.
fn strip_code_fence(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Decode `text` into a record with exactly the contract's fields.
///
/// Every field must be present as a string and no other key is accepted.
/// Values are kept exactly as returned, empty strings included.
pub fn parse_record(text: &str, contract: &FieldContract) -> Result<ExtractionResult> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

    let Value::Object(object) = value else {
        return Err(ExtractionError::Schema("expected a JSON object".to_string()));
    };

    if let Some(extra) = object.keys().find(|k| contract.get(k).is_none()) {
        return Err(ExtractionError::Schema(format!("unexpected field: {}", extra)));
    }

    let mut values = Vec::with_capacity(contract.fields().len());
    for field in contract.fields() {
        let value = match object.get(&field.name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => {
                return Err(ExtractionError::Schema(format!(
                    "missing field: {}",
                    field.name
                )));
            }
            Some(other) => {
                return Err(ExtractionError::Schema(format!(
                    "field {} is not a string: {}",
                    field.name, other
                )));
            }
        };
        values.push((field.name.clone(), value));
    }

    debug!(fields = values.len(), "Decoded extraction record");
    Ok(ExtractionResult::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fields::*;
    use pretty_assertions::assert_eq;

    fn full_response() -> String {
        serde_json::json!({
            "payee_account_name": "บริษัท ซ่อมรถ จำกัด",
            "net_amount": "8130.28",
            "vat_amount": "569.12",
            "gross_amount": "8699.40",
            "tax_invoice_number": "TX-001",
            "tax_invoice_date": "01/02/2024",
            "invoice_number": "INV-9",
            "invoice_date": "31/01/2024"
        })
        .to_string()
    }

    #[test]
    fn test_parse_complete_record() {
        let contract = FieldContract::default();
        let record = parse_record(&full_response(), &contract).unwrap();

        assert_eq!(record.len(), 8);
        assert_eq!(record.get(GROSS_AMOUNT), Some("8699.40"));
        assert_eq!(record.get(PAYEE_ACCOUNT_NAME), Some("บริษัท ซ่อมรถ จำกัด"));
        assert_eq!(record.get(TAX_INVOICE_NUMBER), Some("TX-001"));
        assert_eq!(record.get(INVOICE_NUMBER), Some("INV-9"));
    }

    #[test]
    fn test_order_follows_contract_not_response() {
        let contract = FieldContract::default();
        let shuffled = r#"{
            "invoice_date": "", "invoice_number": "", "tax_invoice_date": "",
            "tax_invoice_number": "", "gross_amount": "1", "vat_amount": "",
            "net_amount": "", "payee_account_name": "A"
        }"#;

        let first = parse_record(shuffled, &contract).unwrap();
        let second = parse_record(&full_response(), &contract).unwrap();

        let order_a: Vec<&str> = first.iter().map(|(k, _)| k).collect();
        let order_b: Vec<&str> = second.iter().map(|(k, _)| k).collect();
        assert_eq!(order_a, order_b);
        assert_eq!(order_a, contract.names().collect::<Vec<_>>());
    }

    #[test]
    fn test_same_text_gives_same_record() {
        let contract = FieldContract::default();
        assert_eq!(
            parse_record(&full_response(), &contract).unwrap(),
            parse_record(&full_response(), &contract).unwrap()
        );
    }

    #[test]
    fn test_empty_strings_are_preserved() {
        let contract = FieldContract::default();
        let text = r#"{
            "payee_account_name": "", "net_amount": "", "vat_amount": "",
            "gross_amount": "100.00", "tax_invoice_number": "", "tax_invoice_date": "",
            "invoice_number": "", "invoice_date": ""
        }"#;

        let record = parse_record(text, &contract).unwrap();
        assert_eq!(record.get(PAYEE_ACCOUNT_NAME), Some(""));
        assert_eq!(record.get(VAT_AMOUNT), Some(""));
        assert_eq!(record.get(INVOICE_DATE), Some(""));
    }

    #[test]
    fn test_single_invoice_reference_is_not_filled_locally() {
        let contract = FieldContract::default();
        let text = r#"{
            "payee_account_name": "Garage", "net_amount": "", "vat_amount": "",
            "gross_amount": "", "tax_invoice_number": "", "tax_invoice_date": "",
            "invoice_number": "IV6701-0042", "invoice_date": "15/01/2024"
        }"#;

        let record = parse_record(text, &contract).unwrap();
        assert_eq!(record.get(INVOICE_NUMBER), Some("IV6701-0042"));
        assert_eq!(record.get(TAX_INVOICE_NUMBER), Some(""));
        assert_eq!(record.get(TAX_INVOICE_DATE), Some(""));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let contract = FieldContract::default();
        let err = parse_record(r#"{"gross_amount": "1"}"#, &contract).unwrap_err();
        assert!(matches!(err, ExtractionError::Schema(_)));
    }

    #[test]
    fn test_null_and_non_string_are_rejected() {
        let contract = FieldContract::new(vec![FieldSpec::new("total", "Total", "t", &[])]);

        assert!(matches!(
            parse_record(r#"{"total": null}"#, &contract),
            Err(ExtractionError::Schema(_))
        ));
        assert!(matches!(
            parse_record(r#"{"total": 12.5}"#, &contract),
            Err(ExtractionError::Schema(_))
        ));
    }

    #[test]
    fn test_extra_field_is_rejected() {
        let contract = FieldContract::new(vec![FieldSpec::new("total", "Total", "t", &[])]);
        let err = parse_record(r#"{"total": "1", "currency": "THB"}"#, &contract).unwrap_err();

        assert_eq!(err.to_string(), "response does not match schema: unexpected field: currency");
    }

    #[test]
    fn test_malformed_json() {
        let contract = FieldContract::default();
        assert!(matches!(
            parse_record("{not json", &contract),
            Err(ExtractionError::Malformed(_))
        ));
        assert!(matches!(
            parse_record("[]", &contract),
            Err(ExtractionError::Schema(_))
        ));
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let contract = FieldContract::new(vec![FieldSpec::new("total", "Total", "t", &[])]);
        let record = parse_record("```json\n{\"total\": \"5\"}\n```", &contract).unwrap();
        assert_eq!(record.get("total"), Some("5"));
    }
}
