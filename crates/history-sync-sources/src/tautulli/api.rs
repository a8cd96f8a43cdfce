use history_sync_models::RawHistoryRecord;
use serde_json::Value;
use tracing::{debug, warn};
use crate::SourceError;

const RESULT_POINTER: &str = "/response/result";
const MESSAGE_POINTER: &str = "/response/message";
const HISTORY_POINTER: &str = "/response/data/data";

/// Extract history rows from a `get_history` response body.
///
/// Expected shape: `{ "response": { "result": "success", "data": { "data": [ ... ] } } }`.
/// A `null` row list is an empty history; a missing one is a malformed response.
/// Rows that are not JSON objects are skipped.
pub fn parse_history_response(body: &[u8]) -> Result<Vec<RawHistoryRecord>, SourceError> {
    let json: Value = serde_json::from_slice(body)
        .map_err(|e| SourceError::Decode(format!("invalid JSON: {}", e)))?;

    if let Some(result) = json.pointer(RESULT_POINTER).and_then(Value::as_str) {
        if result != "success" {
            let message = json
                .pointer(MESSAGE_POINTER)
                .and_then(Value::as_str)
                .unwrap_or("no message")
                .to_string();
            return Err(SourceError::Api(format!("{}: {}", result, message)));
        }
    }

    let rows = match json.pointer(HISTORY_POINTER) {
        Some(Value::Array(rows)) => rows,
        Some(Value::Null) => {
            debug!("Tautulli: history data is null, treating as empty");
            return Ok(Vec::new());
        }
        Some(other) => {
            return Err(SourceError::Decode(format!(
                "response.data.data is not an array (found {})",
                json_kind(other)
            )))
        }
        None => {
            return Err(SourceError::Decode(
                "missing response.data.data".to_string(),
            ))
        }
    };

    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match row {
            Value::Object(fields) => records.push(RawHistoryRecord::new(fields.clone())),
            other => warn!(
                index,
                kind = json_kind(other),
                "Tautulli: skipping history row that is not an object"
            ),
        }
    }

    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
