use super::document::Document;
use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Serialize a record into a document body, dropping its `id` field
pub fn to_document<T: Serialize>(record: &T) -> Result<Document> {
    match serde_json::to_value(record).context("Failed to serialize record")? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(anyhow!("record serialized to non-object JSON: {}", other)),
    }
}

/// Rebuild a record from its id and stored body
pub fn from_document<T: DeserializeOwned>(id: &str, data: Document) -> Result<T> {
    let mut map = data;
    map.insert("id".to_string(), Value::String(id.to_string()));

    serde_json::from_value(Value::Object(map))
        .with_context(|| format!("Failed to decode stored document {}", id))
}
