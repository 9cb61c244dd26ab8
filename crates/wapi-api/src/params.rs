// Request parameters
//
// An ordered string map serialized as the query string. Every call site
// builds its own value; nothing is shared between calls.

use indexmap::IndexMap;
use serde::Serialize;

/// Query-string parameters for a single WAPI request.
///
/// Values are stored as strings; anything `ToString` (numbers, bools)
/// can be inserted. Insertion order is kept so requests are reproducible
/// in logs and mock matchers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(IndexMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Overlay every entry of `other`, replacing existing keys.
    pub fn extend(&mut self, other: &Params) {
        for (k, v) in other.iter() {
            self.0.insert(k.to_owned(), v.to_owned());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl<K: Into<String>, V: ToString, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut params = Params::from([("name", "default"), ("view", "internal")]);
        params.insert("name", "external");

        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("name", "external"), ("view", "internal")]);
    }

    #[test]
    fn primitives_are_stringified() {
        let params = Params::new().with("_max_results", 20).with("_paging", 1);
        assert_eq!(params.get("_max_results"), Some("20"));
        assert_eq!(params.get("_paging"), Some("1"));
    }

    #[test]
    fn extend_overlays_later_values() {
        let mut merged = Params::from([("_max_results", "5"), ("name", "a")]);
        merged.extend(&Params::from([("_max_results", "20")]));
        assert_eq!(merged.get("_max_results"), Some("20"));
        assert_eq!(merged.get("name"), Some("a"));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn serializes_as_flat_map() {
        let params = Params::from([("_return_fields", "name,comment")]);
        let json = serde_json::to_value(&params).unwrap_or_default();
        assert_eq!(json, serde_json::json!({ "_return_fields": "name,comment" }));
    }
}
