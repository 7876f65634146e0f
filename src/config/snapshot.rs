//! Parsed configuration document.

use serde_json::{Map, Value};

/// A structured key/value configuration document.
///
/// Both JSON and TOML sources land in the same tree. Key lookup is
/// case-insensitive, an exact match wins over a case-folded one.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    root: Value,
}

impl ConfigSnapshot {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content).map(Self::new)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Value>(content).map(Self::new)
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The object at the root, if the document is an object.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.root.as_object()
    }

    /// Look up a top-level key. `null` values count as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| lookup(map, key))
    }

    /// The nested object under `name` as its own snapshot.
    pub fn section(&self, name: &str) -> Option<ConfigSnapshot> {
        self.get(name)
            .filter(|value| value.is_object())
            .map(|value| ConfigSnapshot::new(value.clone()))
    }
}

/// Case-insensitive key lookup in a JSON object.
pub(crate) fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let found = match map.get(key) {
        Some(value) => Some(value),
        None => map
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, value)| value),
    };
    found.filter(|value| !value.is_null())
}
