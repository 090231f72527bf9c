use thiserror::Error;

/// Raised while declaring fields or building an index. The build does not
/// complete.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("field `{0}` is declared as both a text field and a keyword field")]
    FieldCollision(String),
    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),
    #[error("field names must not be empty")]
    EmptyFieldName,
    #[error("at least one text field must be declared")]
    NoTextFields,
    #[error("field `{0}` is not a declared text field")]
    UnknownField(String),
    #[error("default boost for field `{field}` must be a finite non-negative number, got {boost}")]
    InvalidBoost { field: String, boost: f32 },
}

/// Raised by a single search call. The index is unaffected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("result limit must be positive, got {0}")]
    InvalidLimit(usize),
    #[error("boost for field `{field}` must be a finite non-negative number, got {boost}")]
    InvalidBoost { field: String, boost: f32 },
}
