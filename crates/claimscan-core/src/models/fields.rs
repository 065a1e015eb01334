//! Declarative field contract driving both the prompt and the response schema.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ConfigError;

pub const PAYEE_ACCOUNT_NAME: &str = "payee_account_name";
pub const NET_AMOUNT: &str = "net_amount";
pub const VAT_AMOUNT: &str = "vat_amount";
pub const GROSS_AMOUNT: &str = "gross_amount";
pub const TAX_INVOICE_NUMBER: &str = "tax_invoice_number";
pub const TAX_INVOICE_DATE: &str = "tax_invoice_date";
pub const INVOICE_NUMBER: &str = "invoice_number";
pub const INVOICE_DATE: &str = "invoice_date";

const AMOUNT_FORMAT: &str = "8699.40";
const DATE_FORMAT: &str = "DD/MM/YYYY";

/// One field the extraction service must return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// JSON key in the response.
    pub name: String,

    /// Column header in result tables.
    pub label: String,

    /// What the field means.
    pub description: String,

    /// Document labels to look for, highest priority first.
    #[serde(default)]
    pub synonyms: Vec<String>,

    /// Expected value format, e.g. "8699.40".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_hint: Option<String>,

    /// Field whose value is reused when this one only appears once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_of: Option<String>,
}

impl FieldSpec {
    pub fn new(name: &str, label: &str, description: &str, synonyms: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            format_hint: None,
            mirror_of: None,
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format_hint = Some(format.to_string());
        self
    }

    pub fn with_mirror(mut self, field: &str) -> Self {
        self.mirror_of = Some(field.to_string());
        self
    }
}

/// Ordered set of fields to extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldContract {
    fields: Vec<FieldSpec>,
}

impl Default for FieldContract {
    fn default() -> Self {
        Self {
            fields: vec![
                FieldSpec::new(
                    PAYEE_ACCOUNT_NAME,
                    "Payee Account Name",
                    "The name of the person or company to be paid.",
                    &["Payee", "Beneficiary", "Account Name", "ชื่อผู้รับเงิน", "ชื่อบัญชี"],
                ),
                FieldSpec::new(
                    NET_AMOUNT,
                    "Net Amount",
                    "The subtotal amount before any taxes are applied.",
                    &["Subtotal", "Net Amount", "ยอดสุทธิก่อนภาษี", "มูลค่าสินค้า", "จำนวนเงิน"],
                )
                .with_format(AMOUNT_FORMAT),
                FieldSpec::new(
                    VAT_AMOUNT,
                    "VAT Amount",
                    "The value added tax amount.",
                    &["VAT", "GST", "ภาษีมูลค่าเพิ่ม", "VAT 7%"],
                )
                .with_format(AMOUNT_FORMAT),
                FieldSpec::new(
                    GROSS_AMOUNT,
                    "Gross Amount",
                    "The final total amount to be paid, including tax.",
                    &["Total", "Gross Amount", "Grand Total", "ยอดรวมทั้งสิ้น", "รวมเป็นเงิน", "ยอดสุทธิ"],
                )
                .with_format(AMOUNT_FORMAT),
                FieldSpec::new(
                    TAX_INVOICE_NUMBER,
                    "Tax Invoice No",
                    "The unique identifier of the tax invoice.",
                    &["Tax Invoice No.", "TIN", "เลขที่ใบกำกับภาษี"],
                )
                .with_mirror(INVOICE_NUMBER),
                FieldSpec::new(
                    TAX_INVOICE_DATE,
                    "Tax Invoice Date",
                    "The date the tax invoice was issued.",
                    &["Tax Invoice Date", "วันที่ใบกำกับภาษี", "Date"],
                )
                .with_format(DATE_FORMAT)
                .with_mirror(INVOICE_DATE),
                FieldSpec::new(
                    INVOICE_NUMBER,
                    "Invoice No",
                    "The unique number of the invoice itself.",
                    &["Invoice No.", "เลขที่ใบแจ้งหนี้", "เลขที่"],
                )
                .with_mirror(TAX_INVOICE_NUMBER),
                FieldSpec::new(
                    INVOICE_DATE,
                    "Invoice Date",
                    "The date the invoice was issued.",
                    &["Invoice Date", "วันที่"],
                )
                .with_format(DATE_FORMAT)
                .with_mirror(TAX_INVOICE_DATE),
            ],
        }
    }
}

impl FieldContract {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in contract order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Check that the contract can be sent to the service.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fields.is_empty() {
            return Err(ConfigError::Contract("no fields defined".to_string()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(ConfigError::Contract("field with empty name".to_string()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::Contract(format!(
                    "duplicate field: {}",
                    field.name
                )));
            }
        }

        for field in &self.fields {
            if let Some(mirror) = &field.mirror_of {
                if mirror == &field.name || !seen.contains(mirror.as_str()) {
                    return Err(ConfigError::Contract(format!(
                        "field {} mirrors unknown field {}",
                        field.name, mirror
                    )));
                }
            }
        }

        Ok(())
    }

    /// Response schema in the service's OpenAPI subset: an object whose
    /// properties are all required strings, in contract order.
    pub fn response_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            properties.insert(
                field.name.clone(),
                json!({
                    "type": "STRING",
                    "description": field.description,
                }),
            );
        }

        let names: Vec<&str> = self.names().collect();

        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": names,
            "propertyOrdering": names,
        })
    }

    /// Natural-language extraction instructions sent alongside the document.
    pub fn instructions(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(
            "You are a data extraction assistant specialised in financial documents.\n\
             Analyse the attached PDF, an invoice or claim-related document, and extract the fields listed below.\n\n",
        );
        prompt.push_str(
            "The document is written in the Thai language, possibly with English labels. \
             Read and interpret Thai script and Thai financial terms.\n\n",
        );

        prompt.push_str("Rules:\n");
        prompt.push_str("1. Read the entire document before answering.\n");
        prompt.push_str("2. Return a single JSON object that strictly follows the provided schema.\n");
        prompt.push_str("3. Do not add any fields that are not in the schema.\n");
        prompt.push_str(
            "4. If a field cannot be found, return an empty string (\"\") for it. Never guess or invent values.\n\n",
        );

        prompt.push_str("Fields:\n");
        for field in &self.fields {
            prompt.push_str(&format!("- {}: {}", field.name, field.description));

            if !field.synonyms.is_empty() {
                let labels: Vec<String> =
                    field.synonyms.iter().map(|s| format!("'{}'", s)).collect();
                prompt.push_str(&format!(" Look for labels such as {}.", labels.join(", ")));
            }

            if let Some(mirror) = &field.mirror_of {
                prompt.push_str(&format!(
                    " If the document carries only one such value, use it for both this field and `{}`.",
                    mirror
                ));
            }

            if let Some(format) = &field.format_hint {
                prompt.push_str(&format!(" Format: \"{}\".", format));
            }

            prompt.push('\n');
        }

        prompt.push_str("\nProcess the document and return the extracted data in the specified JSON format.\n");
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_contract_has_eight_fields() {
        let contract = FieldContract::default();
        let names: Vec<&str> = contract.names().collect();

        assert_eq!(
            names,
            vec![
                PAYEE_ACCOUNT_NAME,
                NET_AMOUNT,
                VAT_AMOUNT,
                GROSS_AMOUNT,
                TAX_INVOICE_NUMBER,
                TAX_INVOICE_DATE,
                INVOICE_NUMBER,
                INVOICE_DATE,
            ]
        );
        assert!(contract.validate().is_ok());
    }

    #[test]
    fn test_response_schema_requires_every_field() {
        let schema = FieldContract::default().response_schema();

        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["required"].as_array().unwrap().len(), 8);
        assert_eq!(schema["propertyOrdering"][3], GROSS_AMOUNT);
        assert_eq!(schema["properties"][VAT_AMOUNT]["type"], "STRING");
    }

    #[test]
    fn test_instructions_mention_thai_and_synonyms() {
        let prompt = FieldContract::default().instructions();

        assert!(prompt.contains("Thai"));
        assert!(prompt.contains("'เลขที่ใบกำกับภาษี'"));
        assert!(prompt.contains("empty string"));
        assert!(prompt.contains("use it for both this field and `tax_invoice_number`"));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let contract = FieldContract::new(vec![
            FieldSpec::new("a", "A", "first", &[]),
            FieldSpec::new("a", "A", "again", &[]),
        ]);

        assert!(matches!(contract.validate(), Err(ConfigError::Contract(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_mirror() {
        let contract = FieldContract::new(vec![
            FieldSpec::new("a", "A", "first", &[]).with_mirror("missing"),
        ]);

        assert!(contract.validate().is_err());
        assert!(FieldContract::new(vec![]).validate().is_err());
    }

    #[test]
    fn test_contract_round_trips_through_config_json() {
        let contract = FieldContract::default();
        let json = serde_json::to_string(&contract).unwrap();
        let parsed: FieldContract = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, contract);
    }
}
