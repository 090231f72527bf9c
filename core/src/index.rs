use crate::error::SchemaError;
use crate::tokenizer::Analyzer;
use crate::{Document, Schema};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
}

/// Ranking formula applied at search time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    /// Sum over query terms of `qtf * tf * idf`.
    #[default]
    TfIdf,
    /// Cosine similarity of L2-normalised `(1 + ln tf) * idf` vectors.
    Cosine,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexOptions {
    pub scoring: Scoring,
    pub analyzer: Analyzer,
    /// Per text field multiplier used when a query gives none. Fields not
    /// listed default to 1.0.
    pub boosts: BTreeMap<String, f32>,
}

impl IndexOptions {
    fn validate(&self, schema: &Schema) -> Result<(), SchemaError> {
        for (field, &boost) in &self.boosts {
            if !schema.is_text_field(field) {
                return Err(SchemaError::UnknownField(field.clone()));
            }
            if !boost.is_finite() || boost < 0.0 {
                return Err(SchemaError::InvalidBoost { field: field.clone(), boost });
            }
        }
        Ok(())
    }
}

/// Smoothed inverse document frequency: `ln((n + 1) / (df + 1)) + 1`.
#[inline]
pub fn idf(num_docs: usize, df: u32) -> f32 {
    ((num_docs as f32 + 1.0) / (df as f32 + 1.0)).ln() + 1.0
}

#[inline]
pub(crate) fn sublinear_tf(tf: u32) -> f32 {
    if tf > 0 { 1.0 + (tf as f32).ln() } else { 0.0 }
}

/// Term statistics of one text field.
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    pub dictionary: HashMap<String, TermId>,
    pub df: Vec<u32>,
    /// Indexed by term id; each list is sorted by doc id.
    pub postings: Vec<Vec<Posting>>,
    /// L2 norm of each document's `(1 + ln tf) * idf` vector, 1.0 when empty.
    pub doc_norms: Vec<f32>,
}

impl FieldIndex {
    fn build(field: &str, docs: &[Document], analyzer: &Analyzer) -> Self {
        let mut dictionary: HashMap<String, TermId> = HashMap::new();
        let mut df: Vec<u32> = Vec::new();
        let mut postings: Vec<Vec<Posting>> = Vec::new();

        for (doc_id, doc) in docs.iter().enumerate() {
            // missing field contributes nothing
            let text = doc.get(field).unwrap_or("");
            let mut tf_counts: BTreeMap<TermId, u32> = BTreeMap::new();
            for (term, _pos) in analyzer.tokenize(text) {
                let tid = match dictionary.get(&term) {
                    Some(&tid) => tid,
                    None => {
                        let tid = df.len() as TermId;
                        dictionary.insert(term, tid);
                        df.push(0);
                        postings.push(Vec::new());
                        tid
                    }
                };
                *tf_counts.entry(tid).or_insert(0) += 1;
            }
            for (tid, tf) in tf_counts {
                df[tid as usize] += 1;
                postings[tid as usize].push(Posting { doc_id: doc_id as DocId, tf });
            }
        }

        let n = docs.len();
        let mut doc_norms = vec![0.0f32; n];
        for (tid, plist) in postings.iter().enumerate() {
            let idf_t = idf(n, df[tid]);
            for p in plist {
                let w = sublinear_tf(p.tf) * idf_t;
                doc_norms[p.doc_id as usize] += w * w;
            }
        }
        for dn in doc_norms.iter_mut() {
            *dn = dn.sqrt();
            if *dn == 0.0 { *dn = 1.0; }
        }

        Self { dictionary, df, postings, doc_norms }
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    pub fn postings(&self, tid: TermId) -> &[Posting] {
        self.postings.get(tid as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn document_frequency(&self, term: &str) -> u32 {
        self.term_id(term).map(|tid| self.df[tid as usize]).unwrap_or(0)
    }

    pub fn term_frequency(&self, doc_id: DocId, term: &str) -> u32 {
        let Some(tid) = self.term_id(term) else { return 0 };
        let plist = self.postings(tid);
        match plist.binary_search_by_key(&doc_id, |p| p.doc_id) {
            Ok(i) => plist[i].tf,
            Err(_) => 0,
        }
    }

    pub fn vocabulary_size(&self) -> usize { self.dictionary.len() }
}

/// An immutable searchable snapshot of a document collection.
///
/// Built once by [`Index::build`]; there is no mutation after construction.
/// To rebuild, construct a new index and publish it through an
/// [`IndexHandle`](crate::IndexHandle).
#[derive(Debug, Clone)]
pub struct Index {
    pub(crate) schema: Schema,
    pub(crate) options: IndexOptions,
    pub(crate) docs: Vec<Document>,
    /// Parallel to `schema.text_fields()`.
    pub(crate) fields: Vec<FieldIndex>,
    /// Parallel to `schema.keyword_fields()`, then by doc id.
    pub(crate) keywords: Vec<Vec<Option<String>>>,
}

impl Index {
    /// Build with default options from plain field-name lists.
    pub fn build<I>(documents: I, text_fields: &[&str], keyword_fields: &[&str]) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = Document>,
    {
        let schema = Schema::new(text_fields.iter().copied(), keyword_fields.iter().copied())?;
        Self::build_with(documents, schema, IndexOptions::default())
    }

    pub fn build_with<I>(documents: I, schema: Schema, options: IndexOptions) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = Document>,
    {
        options.validate(&schema)?;
        let docs: Vec<Document> = documents.into_iter().collect();

        let fields: Vec<FieldIndex> = schema
            .text_fields()
            .iter()
            .map(|field| FieldIndex::build(field, &docs, &options.analyzer))
            .collect();
        let keywords: Vec<Vec<Option<String>>> = schema
            .keyword_fields()
            .iter()
            .map(|field| docs.iter().map(|d| d.get(field).map(str::to_string)).collect())
            .collect();

        let num_terms: usize = fields.iter().map(FieldIndex::vocabulary_size).sum();
        tracing::info!(num_docs = docs.len(), num_terms, scoring = ?options.scoring, "index built");
        Ok(Self { schema, options, docs, fields, keywords })
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn schema(&self) -> &Schema { &self.schema }

    pub fn options(&self) -> &IndexOptions { &self.options }

    pub fn document(&self, doc_id: DocId) -> Option<&Document> { self.docs.get(doc_id as usize) }

    pub fn documents(&self) -> &[Document] { &self.docs }

    pub fn field(&self, name: &str) -> Option<&FieldIndex> {
        self.schema.text_field_position(name).map(|pos| &self.fields[pos])
    }

    /// Documents in `field` containing `term`. `term` must already be normalized.
    pub fn document_frequency(&self, field: &str, term: &str) -> u32 {
        self.field(field).map(|f| f.document_frequency(term)).unwrap_or(0)
    }

    pub fn term_frequency(&self, field: &str, doc_id: DocId, term: &str) -> u32 {
        self.field(field).map(|f| f.term_frequency(doc_id, term)).unwrap_or(0)
    }

    pub fn vocabulary_size(&self, field: &str) -> usize {
        self.field(field).map(FieldIndex::vocabulary_size).unwrap_or(0)
    }

    /// Stored exact value of a keyword field; `None` when undeclared, missing
    /// or absent.
    pub fn keyword_value(&self, field: &str, doc_id: DocId) -> Option<&str> {
        let pos = self.schema.keyword_field_position(field)?;
        self.keywords[pos].get(doc_id as usize)?.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Document> {
        vec![
            Document::new().with("content", "alpha beta").with("filename", "a.md"),
            Document::new().with("content", "beta gamma").with("filename", "b.md"),
            Document::new().with("content", "alpha alpha gamma").with("filename", "c.md"),
        ]
    }

    #[test]
    fn counts_tf_and_df() {
        let index = Index::build(corpus(), &["content"], &["filename"]).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.document_frequency("content", "alpha"), 2);
        assert_eq!(index.document_frequency("content", "beta"), 2);
        assert_eq!(index.document_frequency("content", "delta"), 0);
        assert_eq!(index.term_frequency("content", 2, "alpha"), 2);
        assert_eq!(index.term_frequency("content", 1, "alpha"), 0);
        assert_eq!(index.vocabulary_size("content"), 3);
        assert_eq!(index.keyword_value("filename", 1), Some("b.md"));
    }

    #[test]
    fn missing_text_field_is_empty() {
        let docs = vec![Document::new().with("filename", "x.md"), Document::new().with("content", "word")];
        let index = Index::build(docs, &["content"], &["filename"]).unwrap();
        assert_eq!(index.document_frequency("content", "word"), 1);
        assert_eq!(index.keyword_value("filename", 1), None);
        assert_eq!(index.field("content").unwrap().doc_norms[0], 1.0);
    }

    #[test]
    fn keyword_values_are_not_normalized() {
        let docs = vec![Document::new().with("content", "x").with("filename", "Docs/README.md")];
        let index = Index::build(docs, &["content"], &["filename"]).unwrap();
        assert_eq!(index.keyword_value("filename", 0), Some("Docs/README.md"));
        assert_eq!(index.document_frequency("content", "readme"), 0);
    }

    #[test]
    fn empty_corpus_builds() {
        let index = Index::build(Vec::new(), &["content"], &[]).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn boost_for_undeclared_field_is_rejected() {
        let schema = Schema::new(["content"], ["filename"]).unwrap();
        let mut options = IndexOptions::default();
        options.boosts.insert("filename".into(), 2.0);
        let err = Index::build_with(corpus(), schema, options).unwrap_err();
        assert_eq!(err, SchemaError::UnknownField("filename".into()));
    }

    #[test]
    fn idf_decreases_with_df() {
        assert!(idf(10, 1) > idf(10, 5));
        assert!((idf(3, 3) - 1.0).abs() < 1e-6);
    }
}
