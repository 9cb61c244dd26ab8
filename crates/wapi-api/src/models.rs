// WAPI wire types
//
// The schema document returned at login, the paging envelope and the
// last-response snapshot kept for diagnostics. Entity bodies stay as
// `serde_json::Value`; nothing here looks inside them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Capability document returned by `GET {base}/?_schema`.
///
/// An open mapping: the well-known keys have typed accessors, anything
/// else the appliance sends is kept as-is. A non-empty schema is what
/// marks a session as authenticated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(Map<String, Value>);

impl Schema {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The WAPI version the base URL asked for, e.g. `"2.12"`.
    pub fn requested_version(&self) -> Option<&str> {
        self.0.get("requested_version").and_then(Value::as_str)
    }

    /// Object types this WAPI version exposes, in server order.
    pub fn supported_objects(&self) -> Vec<&str> {
        self.string_list("supported_objects")
    }

    /// WAPI versions the appliance supports, in server order.
    pub fn supported_versions(&self) -> Vec<&str> {
        self.string_list("supported_versions")
    }

    pub fn supports_object(&self, object_type: &str) -> bool {
        self.supported_objects().contains(&object_type)
    }

    pub(crate) fn merge(&mut self, other: Map<String, Value>) {
        self.0.extend(other);
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }

    fn string_list(&self, key: &str) -> Vec<&str> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Snapshot of the most recent HTTP exchange on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInfo {
    pub method: reqwest::Method,
    pub url: url::Url,
    pub status: reqwest::StatusCode,
}

/// The `{"result": [...], "next_page_id": ...}` wrapper returned when
/// `_return_as_object=1` is requested.
#[derive(Debug, Deserialize)]
pub(crate) struct PageEnvelope {
    pub result: Vec<Value>,
    #[serde(default)]
    pub next_page_id: Option<String>,
}
