//! In-memory document search: field-aware tokenization, a one-shot TF-IDF
//! index build, and ranked queries with exact-match keyword filters.

pub mod document;
pub mod error;
pub mod excerpt;
pub mod handle;
pub mod index;
pub mod schema;
pub mod search;
pub mod tokenizer;

pub use document::Document;
pub use error::{SchemaError, SearchError};
pub use excerpt::{excerpt, render_results, DEFAULT_EXCERPT_CHARS};
pub use handle::IndexHandle;
pub use index::{DocId, FieldIndex, Index, IndexOptions, Posting, Scoring, TermId};
pub use schema::Schema;
pub use search::{ScoredResult, SearchQuery, SearchResults, DEFAULT_LIMIT};
pub use tokenizer::Analyzer;
