use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The two disjoint field sets declared when an index is built. Order is
/// insertion order and is fixed for the life of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    text_fields: Vec<String>,
    keyword_fields: Vec<String>,
}

impl Schema {
    pub fn new<T, K>(text_fields: T, keyword_fields: K) -> Result<Self, SchemaError>
    where
        T: IntoIterator,
        T::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        let text_fields: Vec<String> = text_fields.into_iter().map(Into::into).collect();
        let keyword_fields: Vec<String> = keyword_fields.into_iter().map(Into::into).collect();
        if text_fields.is_empty() {
            return Err(SchemaError::NoTextFields);
        }

        let mut text_seen = HashSet::new();
        for name in &text_fields {
            if name.is_empty() { return Err(SchemaError::EmptyFieldName); }
            if !text_seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateField(name.clone()));
            }
        }
        let mut keyword_seen = HashSet::new();
        for name in &keyword_fields {
            if name.is_empty() { return Err(SchemaError::EmptyFieldName); }
            if text_seen.contains(name.as_str()) {
                return Err(SchemaError::FieldCollision(name.clone()));
            }
            if !keyword_seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateField(name.clone()));
            }
        }
        Ok(Self { text_fields, keyword_fields })
    }

    pub fn text_fields(&self) -> &[String] { &self.text_fields }

    pub fn keyword_fields(&self) -> &[String] { &self.keyword_fields }

    pub fn text_field_position(&self, name: &str) -> Option<usize> {
        self.text_fields.iter().position(|f| f == name)
    }

    pub fn keyword_field_position(&self, name: &str) -> Option<usize> {
        self.keyword_fields.iter().position(|f| f == name)
    }

    pub fn is_text_field(&self, name: &str) -> bool { self.text_field_position(name).is_some() }

    pub fn is_keyword_field(&self, name: &str) -> bool { self.keyword_field_position(name).is_some() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_disjoint_sets() {
        let schema = Schema::new(["content", "title"], ["filename"]).unwrap();
        assert_eq!(schema.text_field_position("title"), Some(1));
        assert!(schema.is_keyword_field("filename"));
        assert!(!schema.is_keyword_field("content"));
    }

    #[test]
    fn rejects_collision() {
        let err = Schema::new(["content"], ["content"]).unwrap_err();
        assert_eq!(err, SchemaError::FieldCollision("content".into()));
    }

    #[test]
    fn rejects_duplicates_and_empty_names() {
        assert_eq!(
            Schema::new(["a", "a"], Vec::<String>::new()).unwrap_err(),
            SchemaError::DuplicateField("a".into())
        );
        assert_eq!(Schema::new(["a"], ["k", "k"]).unwrap_err(), SchemaError::DuplicateField("k".into()));
        assert_eq!(Schema::new([""], ["k"]).unwrap_err(), SchemaError::EmptyFieldName);
        assert_eq!(
            Schema::new(Vec::<String>::new(), ["k"]).unwrap_err(),
            SchemaError::NoTextFields
        );
    }
}
