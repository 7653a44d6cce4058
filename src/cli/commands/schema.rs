//! Schema command.

use serde_json::json;

use crate::extract::{company_schema, COMPANY_INSTRUCTION};

/// Print the extraction schema and instruction for the external extractor.
pub fn cmd_schema() -> anyhow::Result<()> {
    let payload = json!({
        "schema": company_schema(),
        "instruction": COMPANY_INSTRUCTION,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
