//! Whole-state export and import.
//!
//! The interchange document is shared by file backups and share links:
//!
//! ```json
//! { "localStorage": { "<record key>": <json> }, "indexedDB": { "<image key>": "data:..." } }
//! ```

mod codec;

pub use codec::{ExportOptions, ImportSummary, SnapshotCodec};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "localStorage")]
    pub records: Map<String, Value>,
    #[serde(
        rename = "indexedDB",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub images: Option<BTreeMap<String, String>>,
}

impl Snapshot {
    /// Parses a snapshot document. A missing or malformed `localStorage`
    /// section is rejected before anything is touched.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(ref root) = value else {
            return Err(Error::InvalidSnapshot("document is not an object".to_string()));
        };
        if !root.get("localStorage").is_some_and(Value::is_object) {
            return Err(Error::InvalidSnapshot(
                "missing localStorage section".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::from)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }

    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.as_ref().map_or(0, BTreeMap::len)
    }
}
