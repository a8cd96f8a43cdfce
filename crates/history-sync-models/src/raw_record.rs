use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One history row exactly as the source returned it.
///
/// Tautulli rows are loosely typed (ids sometimes arrive as strings, optional
/// fields as `null` or missing), so the record stays a plain JSON object until
/// normalization decides what to keep.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RawHistoryRecord {
    fields: Map<String, Value>,
}

impl RawHistoryRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Value of `field`, treating JSON `null` the same as a missing key.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }
}

impl From<Map<String, Value>> for RawHistoryRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}
