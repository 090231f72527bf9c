use crate::error::SearchError;
use crate::index::{idf, sublinear_tf, DocId, FieldIndex, Index, Scoring};
use crate::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_LIMIT: usize = 5;

fn default_limit() -> usize { DEFAULT_LIMIT }

/// A free-text query with optional exact-match filters and field boosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(alias = "query", alias = "q")]
    pub text: String,
    /// Keyword field -> required value. All entries must hold.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    /// Text field -> multiplier, overriding the index defaults.
    #[serde(default)]
    pub boosts: BTreeMap<String, f32>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), filters: BTreeMap::new(), boosts: BTreeMap::new(), limit: DEFAULT_LIMIT }
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    pub fn boost(mut self, field: impl Into<String>, boost: f32) -> Self {
        self.boosts.insert(field.into(), boost);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn validate(&self) -> Result<(), SearchError> {
        if self.limit == 0 {
            return Err(SearchError::InvalidLimit(self.limit));
        }
        for (field, &boost) in &self.boosts {
            if !boost.is_finite() || boost < 0.0 {
                return Err(SearchError::InvalidBoost { field: field.clone(), boost });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredResult<'a> {
    pub doc_id: DocId,
    pub document: &'a Document,
    pub score: f32,
}

/// Ranked hits plus the number of documents that matched before the
/// limit was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults<'a> {
    pub hits: Vec<ScoredResult<'a>>,
    pub total_hits: usize,
}

impl Index {
    /// Rank documents against `query`. See [`Index::search_with_total`].
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<ScoredResult<'_>>, SearchError> {
        self.search_with_total(query).map(|results| results.hits)
    }

    /// Rank documents against `query`.
    ///
    /// Keyword filters are applied first, then every surviving document is
    /// scored per text field, boosted and summed. Zero-scoring documents are
    /// dropped; the rest are ordered by score descending with ties kept in
    /// insertion order, then truncated to `query.limit`.
    pub fn search_with_total(&self, query: &SearchQuery) -> Result<SearchResults<'_>, SearchError> {
        query.validate()?;
        let empty = SearchResults { hits: Vec::new(), total_hits: 0 };
        if self.docs.is_empty() {
            return Ok(empty);
        }

        // BTreeMap keeps float accumulation order stable across calls.
        let mut q_tf: BTreeMap<String, u32> = BTreeMap::new();
        for (term, _pos) in self.options.analyzer.tokenize(&query.text) {
            *q_tf.entry(term).or_insert(0) += 1;
        }
        if q_tf.is_empty() {
            return Ok(empty);
        }

        let allowed = self.filter_mask(&query.filters);
        let mut scores = vec![0.0f32; self.docs.len()];
        for (pos, name) in self.schema.text_fields().iter().enumerate() {
            let boost = query
                .boosts
                .get(name)
                .or_else(|| self.options.boosts.get(name))
                .copied()
                .unwrap_or(1.0);
            if boost == 0.0 { continue; }
            let field = &self.fields[pos];
            match self.options.scoring {
                Scoring::TfIdf => accumulate_tfidf(field, &q_tf, boost, &allowed, &mut scores),
                Scoring::Cosine => accumulate_cosine(field, &q_tf, boost, &allowed, &mut scores),
            }
        }

        let mut hits: Vec<ScoredResult<'_>> = scores
            .into_iter()
            .enumerate()
            .filter(|(doc_id, score)| allowed[*doc_id] && *score > 0.0)
            .map(|(doc_id, score)| ScoredResult { doc_id: doc_id as DocId, document: &self.docs[doc_id], score })
            .collect();
        let total_hits = hits.len();
        // sort_by is stable: equal scores stay in doc id order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(query.limit);
        tracing::debug!(query = %query.text, total_hits, returned = hits.len(), "search");
        Ok(SearchResults { hits, total_hits })
    }

    /// `true` for documents passing every filter. A filter on an undeclared
    /// keyword field matches nothing.
    fn filter_mask(&self, filters: &BTreeMap<String, String>) -> Vec<bool> {
        let mut allowed = vec![true; self.docs.len()];
        for (field, value) in filters {
            match self.schema.keyword_field_position(field) {
                Some(pos) => {
                    for (slot, stored) in allowed.iter_mut().zip(&self.keywords[pos]) {
                        *slot &= stored.as_deref() == Some(value.as_str());
                    }
                }
                None => allowed.iter_mut().for_each(|slot| *slot = false),
            }
        }
        allowed
    }
}

fn accumulate_tfidf(
    field: &FieldIndex,
    q_tf: &BTreeMap<String, u32>,
    boost: f32,
    allowed: &[bool],
    scores: &mut [f32],
) {
    let n = allowed.len();
    for (term, &qtf) in q_tf {
        let Some(tid) = field.term_id(term) else { continue };
        let w = qtf as f32 * idf(n, field.df[tid as usize]) * boost;
        for p in field.postings(tid) {
            let d = p.doc_id as usize;
            if allowed[d] {
                scores[d] += p.tf as f32 * w;
            }
        }
    }
}

fn accumulate_cosine(
    field: &FieldIndex,
    q_tf: &BTreeMap<String, u32>,
    boost: f32,
    allowed: &[bool],
    scores: &mut [f32],
) {
    let n = allowed.len();
    let q_weights: Vec<(u32, f32)> = q_tf
        .iter()
        .filter_map(|(term, &qtf)| {
            let tid = field.term_id(term)?;
            Some((tid, sublinear_tf(qtf) * idf(n, field.df[tid as usize])))
        })
        .collect();
    let mut norm = q_weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
    if norm == 0.0 { norm = 1.0; }
    for (tid, q_w) in q_weights {
        let idf_t = idf(n, field.df[tid as usize]);
        for p in field.postings(tid) {
            let d = p.doc_id as usize;
            if allowed[d] {
                let d_w = sublinear_tf(p.tf) * idf_t / field.doc_norms[d];
                scores[d] += d_w * q_w / norm * boost;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IndexOptions, Schema};

    fn corpus() -> Vec<Document> {
        vec![
            Document::new().with("content", "alpha beta").with("filename", "a.md"),
            Document::new().with("content", "beta gamma").with("filename", "b.md"),
            Document::new().with("content", "alpha alpha gamma").with("filename", "c.md"),
        ]
    }

    fn index() -> Index {
        Index::build(corpus(), &["content"], &["filename"]).unwrap()
    }

    fn filenames(hits: &[ScoredResult<'_>]) -> Vec<String> {
        hits.iter().map(|h| h.document.get("filename").unwrap().to_string()).collect()
    }

    #[test]
    fn higher_tf_ranks_first() {
        let index = index();
        let hits = index.search(&SearchQuery::new("alpha").limit(2)).unwrap();
        assert_eq!(filenames(&hits), vec!["c.md", "a.md"]);
        assert!(hits[0].score > hits[1].score);
        let expected = 2.0 * idf(3, 2);
        assert!((hits[0].score - expected).abs() < 1e-5);
    }

    #[test]
    fn unknown_term_returns_nothing() {
        assert!(index().search(&SearchQuery::new("delta")).unwrap().is_empty());
    }

    #[test]
    fn zero_limit_is_an_error() {
        let err = index().search(&SearchQuery::new("alpha").limit(0)).unwrap_err();
        assert_eq!(err, SearchError::InvalidLimit(0));
    }

    #[test]
    fn negative_boost_is_an_error() {
        let err = index().search(&SearchQuery::new("alpha").boost("content", -1.0)).unwrap_err();
        assert!(matches!(err, SearchError::InvalidBoost { .. }));
    }

    #[test]
    fn filter_on_undeclared_field_matches_nothing() {
        let index = index();
        let hits = index.search(&SearchQuery::new("alpha").filter("path", "a.md")).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn repeated_query_term_scales_score() {
        let index = index();
        let once = index.search(&SearchQuery::new("beta")).unwrap();
        let twice = index.search(&SearchQuery::new("beta beta")).unwrap();
        assert!((twice[0].score - 2.0 * once[0].score).abs() < 1e-5);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let index = index();
        let hits = index.search(&SearchQuery::new("beta")).unwrap();
        assert_eq!(filenames(&hits), vec!["a.md", "b.md"]);
        assert_eq!(hits[0].score, hits[1].score);
    }

    #[test]
    fn boosts_weight_fields() {
        let docs = vec![
            Document::new().with("title", "rust").with("body", "other words"),
            Document::new().with("title", "other").with("body", "rust rust"),
        ];
        let index = Index::build(docs, &["title", "body"], &[]).unwrap();
        let plain = index.search(&SearchQuery::new("rust")).unwrap();
        assert_eq!(plain[0].doc_id, 1);
        let boosted = index.search(&SearchQuery::new("rust").boost("title", 3.0)).unwrap();
        assert_eq!(boosted[0].doc_id, 0);
        let muted = index.search(&SearchQuery::new("rust").boost("body", 0.0)).unwrap();
        assert_eq!(muted.len(), 1);
    }

    #[test]
    fn index_default_boosts_apply() {
        let docs = vec![
            Document::new().with("title", "rust").with("body", "other"),
            Document::new().with("title", "other").with("body", "rust rust"),
        ];
        let schema = Schema::new(["title", "body"], Vec::<String>::new()).unwrap();
        let mut options = IndexOptions::default();
        options.boosts.insert("title".into(), 3.0);
        let index = Index::build_with(docs, schema, options).unwrap();
        let hits = index.search(&SearchQuery::new("rust")).unwrap();
        assert_eq!(hits[0].doc_id, 0);
    }

    #[test]
    fn cosine_prefers_focused_documents() {
        let docs = vec![
            Document::new().with("content", "rust tokio axum serde rayon"),
            Document::new().with("content", "rust"),
        ];
        let schema = Schema::new(["content"], Vec::<String>::new()).unwrap();
        let options = IndexOptions { scoring: Scoring::Cosine, ..IndexOptions::default() };
        let index = Index::build_with(docs, schema, options).unwrap();
        let hits = index.search(&SearchQuery::new("rust")).unwrap();
        assert_eq!(hits[0].doc_id, 1);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert!(hits[1].score < 1.0 && hits[1].score > 0.0);
    }

    #[test]
    fn total_counts_matches_before_limit() {
        let index = index();
        let results = index.search_with_total(&SearchQuery::new("alpha gamma").limit(1)).unwrap();
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.total_hits, 3);
        assert_eq!(results.hits[0].document.get("filename"), Some("c.md"));

        let none = index.search_with_total(&SearchQuery::new("delta")).unwrap();
        assert_eq!(none.total_hits, 0);
    }

    #[test]
    fn query_deserializes_with_defaults() {
        let q: SearchQuery = serde_json::from_str(r#"{"query": "alpha", "filters": {"filename": "a.md"}}"#).unwrap();
        assert_eq!(q.text, "alpha");
        assert_eq!(q.limit, DEFAULT_LIMIT);
        assert_eq!(q.filters.get("filename").map(String::as_str), Some("a.md"));
    }
}
