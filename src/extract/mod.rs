//! Structured extraction contract for business listings.
//!
//! The extraction itself is done by an external LLM-backed service behind
//! [`ExtractionStrategy`]. This module owns the record schema, the
//! instruction sent with it, and normalization of what comes back.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Placeholder for fields the page does not provide.
pub const MISSING: &str = "none";

/// Instruction sent alongside [`company_schema`].
pub const COMPANY_INSTRUCTION: &str = "Extract every business listed on the page. \
For each business return its name, its address split into street, city, province and \
country, and its website URL. Use \"none\" for any field the page does not provide; \
never omit a field.";

/// Errors from structured extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction service failed: {0}")]
    Service(String),

    #[error("invalid extraction output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Turns a markdown document into structured JSON.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    async fn extract(&self, url: &str, markdown: &str) -> Result<Value, ExtractionError>;
}

/// Postal address of a listed business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default = "missing", deserialize_with = "string_or_missing")]
    pub street: String,
    #[serde(default = "missing", deserialize_with = "string_or_missing")]
    pub city: String,
    #[serde(default = "missing", deserialize_with = "string_or_missing")]
    pub province: String,
    #[serde(default = "missing", deserialize_with = "string_or_missing")]
    pub country: String,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            street: missing(),
            city: missing(),
            province: missing(),
            country: missing(),
        }
    }
}

/// One business listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(default = "missing", deserialize_with = "string_or_missing")]
    pub name: String,
    #[serde(default, deserialize_with = "address_or_default")]
    pub address: Address,
    #[serde(default = "missing", deserialize_with = "string_or_missing")]
    pub website: String,
}

fn missing() -> String {
    MISSING.to_string()
}

fn string_or_missing<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(match value {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => missing(),
    })
}

fn address_or_default<'de, D>(deserializer: D) -> Result<Address, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Address>::deserialize(deserializer)?.unwrap_or_default())
}

/// JSON schema for [`CompanyRecord`]. Every field is a required string.
pub fn company_schema() -> Value {
    json!({
        "title": "RawCompanyModel",
        "type": "object",
        "properties": {
            "name": { "title": "Name", "type": "string" },
            "address": {
                "title": "Address",
                "type": "object",
                "properties": {
                    "street": { "title": "Street", "type": "string" },
                    "city": { "title": "City", "type": "string" },
                    "province": { "title": "Province", "type": "string" },
                    "country": { "title": "Country", "type": "string" }
                },
                "required": ["street", "city", "province", "country"]
            },
            "website": { "title": "Website", "type": "string" }
        },
        "required": ["name", "address", "website"]
    })
}

/// Normalize extraction output into records.
///
/// Accepts a JSON array of records or a single record object.
pub fn parse_company_records(value: Value) -> Result<Vec<CompanyRecord>, ExtractionError> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        other => Ok(vec![serde_json::from_value(other)?]),
    }
}
