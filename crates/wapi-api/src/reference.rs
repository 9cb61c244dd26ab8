use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A server-issued object reference (`_ref`).
///
/// Format: `<object type>/<base64-like id>:<human readable name>`, e.g.
/// `record:host/ZG5zLmhvc3QkLjEwLmNvbS5leGFtcGxl:host1.example.com/default`.
/// The string is opaque to the server contract; the accessors only split
/// it for display and logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The object type prefix (`record:host`, `networkview`, ...).
    pub fn object_type(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(t, _)| t)
    }

    /// The encoded identifier between the type and the name.
    pub fn id(&self) -> Option<&str> {
        let (_, rest) = self.0.split_once('/')?;
        Some(rest.split_once(':').map_or(rest, |(id, _)| id))
    }

    /// The readable suffix after the identifier, if present.
    pub fn name(&self) -> Option<&str> {
        let (_, rest) = self.0.split_once('/')?;
        rest.split_once(':').map(|(_, name)| name)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Reference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Reference {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for Reference {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

/// Read the `_ref` field of a result object.
pub fn reference_of(object: &Value) -> Option<Reference> {
    object.get("_ref").and_then(Value::as_str).map(Reference::from)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn splits_host_reference() {
        let r = Reference::from(
            "record:host/ZG5zLmhvc3QkLjEwLmNvbS5leGFtcGxl:host1.example.com/default",
        );
        assert_eq!(r.object_type(), "record:host");
        assert_eq!(r.id(), Some("ZG5zLmhvc3QkLjEwLmNvbS5leGFtcGxl"));
        assert_eq!(r.name(), Some("host1.example.com/default"));
    }

    #[test]
    fn grid_reference_has_no_slash_in_name() {
        let r = Reference::from("grid/b25lLmNsdXN0ZXIkMA:Infoblox");
        assert_eq!(r.object_type(), "grid");
        assert_eq!(r.id(), Some("b25lLmNsdXN0ZXIkMA"));
        assert_eq!(r.name(), Some("Infoblox"));
    }

    #[test]
    fn bare_type_has_no_id() {
        let r = Reference::from("networkview");
        assert_eq!(r.object_type(), "networkview");
        assert_eq!(r.id(), None);
        assert_eq!(r.name(), None);
    }

    #[test]
    fn reads_ref_field() {
        let obj = json!({ "_ref": "networkview/ZG5zLm5ldHdvcmtfdmlldyQw:default/true", "name": "default" });
        let r = reference_of(&obj);
        assert_eq!(
            r.as_ref().map(Reference::object_type),
            Some("networkview")
        );
        assert!(reference_of(&json!({ "name": "x" })).is_none());
    }
}
