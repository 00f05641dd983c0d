//! Lenient extraction of metadata from pushed Terraform state documents.
//!
//! The stored blob is the source of truth, so a document that does not parse
//! is still accepted; its metadata simply falls back to zero values.

use serde_json::{Map, Value};

/// Metadata pulled out of a raw state document.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSummary {
    pub serial: i64,
    pub lineage: String,
    pub outputs: Value,
    pub resource_count: i32,
}

impl StateSummary {
    /// Summarize a raw state payload.
    ///
    /// Each field is extracted independently: a wrong-typed `serial` does not
    /// prevent `lineage` from being read.
    pub fn from_bytes(body: &[u8]) -> Self {
        let doc: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

        let serial = doc
            .get("serial")
            .and_then(Value::as_u64)
            .and_then(|s| i64::try_from(s).ok())
            .unwrap_or(0);

        let lineage = doc
            .get("lineage")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let outputs = match doc.get("outputs") {
            Some(Value::Object(map)) => Value::Object(map.clone()),
            _ => Value::Object(Map::new()),
        };

        let resource_count = doc
            .get("resources")
            .and_then(Value::as_array)
            .map(|r| i32::try_from(r.len()).unwrap_or(i32::MAX))
            .unwrap_or(0);

        Self {
            serial,
            lineage,
            outputs,
            resource_count,
        }
    }
}
