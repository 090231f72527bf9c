use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A flat record of named string values. Which names are text and which are
/// keyword fields is decided by the [`Schema`](crate::Schema), not here.
/// `None` marks a field that is present but has no value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: BTreeMap<String, Option<String>>,
}

impl Document {
    pub fn new() -> Self { Self::default() }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), Some(value.into()));
    }

    pub fn insert_absent(&mut self, name: impl Into<String>) {
        self.fields.insert(name.into(), None);
    }

    /// The value of `name`, or `None` if the field is missing or absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    /// Convert a JSON object into a document. Strings are kept as-is, `null`
    /// becomes absent, other scalars are rendered as text and nested values
    /// as compact JSON. Returns `None` for anything but an object.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        let serde_json::Value::Object(map) = value else { return None };
        let mut doc = Document::new();
        for (name, v) in map {
            match v {
                serde_json::Value::Null => doc.insert_absent(name),
                serde_json::Value::String(s) => doc.insert(name, s),
                other => doc.insert(name, other.to_string()),
            }
        }
        Some(doc)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter { doc.insert(k, v); }
        doc
    }
}
