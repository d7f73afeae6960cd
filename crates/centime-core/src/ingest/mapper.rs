//! Column mapping between statement headers and the transaction schema
//!
//! A statement export names its columns however the bank pleases. The mapper
//! resolves which source column feeds each of the five transaction fields,
//! either by an exact-name heuristic or by asking a text-generation backend
//! and treating its answer as untrusted input.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::ai::AiBackend;
use crate::error::{Error, Result};

use super::reader::RawTable;

/// The fixed transaction schema fields, in prompt/serialization order
pub const TARGET_FIELDS: [&str; 5] = ["date", "amount", "currency", "description", "recipient"];

/// Fields that must resolve to a source column for an ingest to proceed
pub const REQUIRED_FIELDS: [&str; 2] = ["date", "amount"];

/// Resolved correspondence between transaction fields and source columns
///
/// `None` is the unmapped marker. Serializes to the same JSON object shape
/// the inference backend is instructed to produce, so stored mappings and
/// model responses read identically.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldMapping {
    pub date: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub recipient: Option<String>,
}

impl FieldMapping {
    /// Mapping with every field unmapped
    pub fn unmapped() -> Self {
        Self::default()
    }

    /// Identity mapping: each field maps to itself iff a header with that
    /// exact name exists
    pub fn identity_for(headers: &[String]) -> Self {
        let pick = |name: &str| headers.iter().find(|h| *h == name).cloned();
        Self {
            date: pick("date"),
            amount: pick("amount"),
            currency: pick("currency"),
            description: pick("description"),
            recipient: pick("recipient"),
        }
    }

    /// Parse a mapping from raw model response text
    ///
    /// The JSON object is extracted between the first `{` and the last `}`,
    /// since models habitually wrap payloads in prose or code fences. The
    /// object must contain all five field keys; each value must be a string
    /// or null. Anything else is a `MappingInference` error.
    pub fn from_response(response: &str) -> Result<Self> {
        let response = response.trim();
        let start = response.find('{');
        let end = response.rfind('}');

        let json_str = match (start, end) {
            (Some(s), Some(e)) if s < e => &response[s..=e],
            _ => {
                return Err(Error::MappingInference(format!(
                    "no JSON object in response: {}",
                    truncate(response)
                )))
            }
        };

        let value: Value = serde_json::from_str(json_str).map_err(|e| {
            Error::MappingInference(format!("invalid JSON: {} | raw: {}", e, truncate(json_str)))
        })?;
        let object = value
            .as_object()
            .ok_or_else(|| Error::MappingInference("response is not a JSON object".into()))?;

        let mut mapping = Self::unmapped();
        for field in TARGET_FIELDS {
            let entry = object.get(field).ok_or_else(|| {
                Error::MappingInference(format!("response is missing key '{}'", field))
            })?;
            let column = match entry {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => {
                    return Err(Error::MappingInference(format!(
                        "key '{}' has unexpected value: {}",
                        field, other
                    )))
                }
            };
            *mapping.slot_mut(field) = column;
        }

        Ok(mapping)
    }

    /// Downgrade any mapped column name that does not exist in `headers`
    ///
    /// Hard post-condition of every strategy: the inference backend is not
    /// trusted to be hallucination-free, so unknown names become unmapped.
    pub fn validate_against(&mut self, headers: &[String]) {
        for field in TARGET_FIELDS {
            let slot = self.slot_mut(field);
            if let Some(column) = slot {
                if !headers.iter().any(|h| h == column) {
                    debug!(field, column = %column, "dropping mapped column absent from headers");
                    *slot = None;
                }
            }
        }
    }

    /// Whether every mapped column of this mapping exists in `headers`
    ///
    /// Used to decide if a stored mapping still fits a new upload's layout.
    pub fn matches_headers(&self, headers: &[String]) -> bool {
        TARGET_FIELDS.iter().all(|field| match self.slot(field) {
            Some(column) => headers.iter().any(|h| h == column),
            None => true,
        })
    }

    /// Required fields that are still unmapped
    pub fn missing_required(&self) -> Vec<String> {
        REQUIRED_FIELDS
            .iter()
            .filter(|field| self.slot(field).is_none())
            .map(|field| field.to_string())
            .collect()
    }

    /// True when no field is mapped at all
    pub fn is_empty(&self) -> bool {
        TARGET_FIELDS.iter().all(|field| self.slot(field).is_none())
    }

    pub(crate) fn slot(&self, field: &str) -> &Option<String> {
        match field {
            "date" => &self.date,
            "amount" => &self.amount,
            "currency" => &self.currency,
            "description" => &self.description,
            "recipient" => &self.recipient,
            _ => unreachable!("unknown target field {}", field),
        }
    }

    fn slot_mut(&mut self, field: &str) -> &mut Option<String> {
        match field {
            "date" => &mut self.date,
            "amount" => &mut self.amount,
            "currency" => &mut self.currency,
            "description" => &mut self.description,
            "recipient" => &mut self.recipient,
            _ => unreachable!("unknown target field {}", field),
        }
    }
}

fn truncate(s: &str) -> String {
    if s.len() > 200 {
        format!("{}...", &s[..200])
    } else {
        s.to_string()
    }
}

/// A mapping-resolution approach
///
/// Implementations produce a candidate mapping from the table; the
/// validation post-condition is applied by [`resolve_mapping`] at this
/// boundary regardless of backend, so a strategy cannot leak column names
/// that do not exist.
#[async_trait]
pub trait MappingStrategy: Send + Sync {
    async fn resolve(&self, table: &RawTable) -> Result<FieldMapping>;
}

/// Resolve a mapping through a strategy and enforce the header post-condition
pub async fn resolve_mapping(
    strategy: &dyn MappingStrategy,
    table: &RawTable,
) -> Result<FieldMapping> {
    let mut mapping = strategy.resolve(table).await?;
    mapping.validate_against(&table.headers);
    Ok(mapping)
}

/// Exact-name heuristic: map each field to an identically named header
///
/// Deterministic, no external calls, always succeeds.
pub struct DefaultStrategy;

#[async_trait]
impl MappingStrategy for DefaultStrategy {
    async fn resolve(&self, table: &RawTable) -> Result<FieldMapping> {
        Ok(FieldMapping::identity_for(&table.headers))
    }
}

/// Number of sample rows included in the inference prompt
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Ask a text-generation backend to map the columns
///
/// The response must be exactly a JSON object with the five field names as
/// keys and an exact header name or null as each value. The answer is
/// advisory; hallucinated column names are discarded by the shared
/// post-condition.
pub struct InferenceStrategy<'a, B: AiBackend> {
    client: &'a B,
    sample_size: usize,
}

impl<'a, B: AiBackend> InferenceStrategy<'a, B> {
    pub fn new(client: &'a B) -> Self {
        Self {
            client,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    pub fn with_sample_size(client: &'a B, sample_size: usize) -> Self {
        Self {
            client,
            sample_size,
        }
    }

    /// Render a random selection of data rows as JSON records for the prompt
    fn sample_records(&self, table: &RawTable) -> Vec<Value> {
        table
            .rows
            .choose_multiple(&mut rand::thread_rng(), self.sample_size)
            .map(|row| {
                let mut record = serde_json::Map::new();
                for (header, cell) in table.headers.iter().zip(row) {
                    record.insert(header.clone(), Value::String(cell.clone()));
                }
                Value::Object(record)
            })
            .collect()
    }
}

#[async_trait]
impl<B: AiBackend> MappingStrategy for InferenceStrategy<'_, B> {
    async fn resolve(&self, table: &RawTable) -> Result<FieldMapping> {
        let sample = self.sample_records(table);
        let prompt = build_mapping_prompt(&table.headers, &sample);

        debug!(
            model = self.client.model(),
            headers = table.headers.len(),
            sample = sample.len(),
            "requesting column mapping"
        );

        let response = self
            .client
            .generate(&prompt)
            .await
            .map_err(|e| Error::MappingInference(format!("backend call failed: {}", e)))?;

        FieldMapping::from_response(&response)
    }
}

/// Build the deterministic mapping instruction for a statement layout
fn build_mapping_prompt(headers: &[String], sample: &[Value]) -> String {
    let headers_json = serde_json::to_string(headers).unwrap_or_default();
    let sample_json = serde_json::to_string_pretty(sample).unwrap_or_default();

    format!(
        r#"You are mapping the column headers of a bank statement export to a fixed transaction schema.
Your response must be strictly a JSON object mapping the schema fields to column names from the input.

The only acceptable format is:
{{
    "date": "<original_column_name>",
    "amount": "<original_column_name>",
    "currency": "<original_column_name>",
    "description": "<original_column_name>",
    "recipient": "<original_column_name>"
}}

If no column matches a given field, set its value to null.

Rules:
- Respond with a valid JSON object containing only the mappings.
- Do not include any additional text, comments, or explanations.
- Every value must be an exact column name from the input headers, or null.
- Every key above must be present.

A small sample of the data, for context:
{sample_json}

Column headers: {headers_json}

Respond with only the JSON mapping in the exact format above."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_default_strategy_full_identity() {
        let table = table(
            &["date", "amount", "description", "recipient", "currency"],
            &[],
        );
        let mapping = resolve_mapping(&DefaultStrategy, &table).await.unwrap();
        assert_eq!(mapping.date.as_deref(), Some("date"));
        assert_eq!(mapping.amount.as_deref(), Some("amount"));
        assert_eq!(mapping.currency.as_deref(), Some("currency"));
        assert_eq!(mapping.description.as_deref(), Some("description"));
        assert_eq!(mapping.recipient.as_deref(), Some("recipient"));
    }

    #[tokio::test]
    async fn test_default_strategy_no_exact_matches() {
        // Close-but-not-exact names do not map
        let table = table(&["Date", "Amt", "Desc"], &[]);
        let mapping = resolve_mapping(&DefaultStrategy, &table).await.unwrap();
        assert!(mapping.is_empty());
        assert_eq!(mapping.missing_required(), vec!["date", "amount"]);
    }

    #[tokio::test]
    async fn test_inference_strategy_parses_strict_json() {
        let client = MockBackend::with_response(
            r#"{"date":"Buchungsdatum","amount":"Betrag","currency":"Währung","description":"Buchungstext","recipient":null}"#,
        );
        let table = table(
            &["Buchungsdatum", "Betrag", "Währung", "Buchungstext"],
            &[&["05.01.2024", "42.50", "CHF", "Kaffee"]],
        );
        let strategy = InferenceStrategy::new(&client);
        let mapping = resolve_mapping(&strategy, &table).await.unwrap();
        assert_eq!(mapping.date.as_deref(), Some("Buchungsdatum"));
        assert_eq!(mapping.amount.as_deref(), Some("Betrag"));
        assert_eq!(mapping.recipient, None);
    }

    #[tokio::test]
    async fn test_inference_strategy_tolerates_fenced_json() {
        let client = MockBackend::with_response(
            "Here is the mapping:\n```json\n{\"date\":\"When\",\"amount\":\"How much\",\"currency\":null,\"description\":null,\"recipient\":null}\n```",
        );
        let table = table(&["When", "How much"], &[]);
        let strategy = InferenceStrategy::new(&client);
        let mapping = resolve_mapping(&strategy, &table).await.unwrap();
        assert_eq!(mapping.date.as_deref(), Some("When"));
        assert_eq!(mapping.amount.as_deref(), Some("How much"));
    }

    #[tokio::test]
    async fn test_inference_hallucinated_column_is_downgraded() {
        // Post-condition holds even when the model invents a column
        let client = MockBackend::with_response(
            r#"{"date":"date","amount":"Total Spend","currency":null,"description":null,"recipient":null}"#,
        );
        let table = table(&["date", "value"], &[]);
        let strategy = InferenceStrategy::new(&client);
        let mapping = resolve_mapping(&strategy, &table).await.unwrap();
        assert_eq!(mapping.date.as_deref(), Some("date"));
        assert_eq!(mapping.amount, None);
    }

    #[tokio::test]
    async fn test_inference_missing_key_is_an_error() {
        let client = MockBackend::with_response(r#"{"date":"date","amount":"amount"}"#);
        let table = table(&["date", "amount"], &[]);
        let strategy = InferenceStrategy::new(&client);
        assert!(matches!(
            resolve_mapping(&strategy, &table).await,
            Err(Error::MappingInference(_))
        ));
    }

    #[tokio::test]
    async fn test_inference_non_json_is_an_error() {
        let client = MockBackend::with_response("I could not determine a mapping, sorry!");
        let table = table(&["date", "amount"], &[]);
        let strategy = InferenceStrategy::new(&client);
        assert!(matches!(
            resolve_mapping(&strategy, &table).await,
            Err(Error::MappingInference(_))
        ));
    }

    #[tokio::test]
    async fn test_inference_wrong_value_type_is_an_error() {
        let client = MockBackend::with_response(
            r#"{"date":"date","amount":3,"currency":null,"description":null,"recipient":null}"#,
        );
        let table = table(&["date", "amount"], &[]);
        let strategy = InferenceStrategy::new(&client);
        assert!(matches!(
            resolve_mapping(&strategy, &table).await,
            Err(Error::MappingInference(_))
        ));
    }

    #[tokio::test]
    async fn test_inference_backend_failure_is_an_error() {
        let client = MockBackend::unhealthy();
        let table = table(&["date", "amount"], &[]);
        let strategy = InferenceStrategy::new(&client);
        assert!(matches!(
            resolve_mapping(&strategy, &table).await,
            Err(Error::MappingInference(_))
        ));
    }

    #[test]
    fn test_matches_headers() {
        let headers: Vec<String> = ["date", "amount"].iter().map(|s| s.to_string()).collect();
        let mut mapping = FieldMapping::unmapped();
        mapping.date = Some("date".into());
        assert!(mapping.matches_headers(&headers));

        mapping.amount = Some("Betrag".into());
        assert!(!mapping.matches_headers(&headers));
    }

    #[test]
    fn test_mapping_json_round_trip() {
        let mut mapping = FieldMapping::unmapped();
        mapping.date = Some("Buchungsdatum".into());
        let json = serde_json::to_string(&mapping).unwrap();
        let back: FieldMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(mapping, back);
    }

    #[test]
    fn test_prompt_contains_headers_and_sample() {
        let headers = vec!["Datum".to_string(), "Betrag".to_string()];
        let sample = vec![serde_json::json!({"Datum": "05.01.2024", "Betrag": "42.50"})];
        let prompt = build_mapping_prompt(&headers, &sample);
        assert!(prompt.contains("\"Datum\""));
        assert!(prompt.contains("42.50"));
        assert!(prompt.contains("null"));
    }
}
