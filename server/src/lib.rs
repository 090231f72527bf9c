use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use docdex_core::{excerpt, render_results, Index, IndexHandle, IndexOptions, Schema, ScoredResult, SearchError, SearchQuery, DEFAULT_EXCERPT_CHARS, DEFAULT_LIMIT};
use docdex_indexer::{load_index, parse_assignment, parse_boost, SourceFormat};
use serde::{Deserialize, Serialize};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

type ApiError = (StatusCode, String);

/// Where the corpus comes from and how to index it.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub source: PathBuf,
    pub format: SourceFormat,
    pub schema: Schema,
    pub options: IndexOptions,
    pub admin_token: Option<String>,
}

impl ServerConfig {
    fn load(&self) -> Result<Index> {
        let source = self.format.open(&self.source);
        load_index(source.as_ref(), self.schema.clone(), self.options.clone())
    }

    /// First text field, used for excerpts.
    fn excerpt_field(&self) -> &str { &self.schema.text_fields()[0] }

    /// First keyword field, falling back to the excerpt field.
    fn title_field(&self) -> &str {
        self.schema.keyword_fields().first().map(String::as_str).unwrap_or_else(|| self.excerpt_field())
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    /// Comma-separated `field=value` keyword filters.
    pub filter: Option<String>,
    /// Comma-separated `field=weight` boosts.
    pub boost: Option<String>,
}
fn default_k() -> usize { DEFAULT_LIMIT }

impl SearchParams {
    fn to_query(&self) -> Result<SearchQuery, ApiError> {
        let bad_request = |e: anyhow::Error| (StatusCode::BAD_REQUEST, e.to_string());
        let mut query = SearchQuery::new(self.q.clone()).limit(self.k);
        for part in split_list(self.filter.as_deref()) {
            let (field, value) = parse_assignment(part).map_err(bad_request)?;
            query = query.filter(field, value);
        }
        for part in split_list(self.boost.as_deref()) {
            let (field, weight) = parse_boost(part).map_err(bad_request)?;
            query = query.boost(field, weight);
        }
        Ok(query)
    }
}

fn split_list(s: Option<&str>) -> impl Iterator<Item = &str> {
    s.unwrap_or("").split(',').map(str::trim).filter(|p| !p.is_empty())
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f32,
    pub keywords: BTreeMap<String, Option<String>>,
    pub excerpt: Option<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub num_docs: usize,
    pub vocabulary: BTreeMap<String, usize>,
    pub scoring: docdex_core::Scoring,
}

#[derive(Clone)]
pub struct AppState {
    pub index: IndexHandle,
    pub config: Arc<ServerConfig>,
}

/// Load the configured source, build the initial index and wire the routes.
pub fn build_app(config: ServerConfig) -> Result<Router> {
    let index = config.load()?;
    Ok(build_app_with_index(config, index))
}

pub fn build_app_with_index(config: ServerConfig, index: Index) -> Router {
    let app_state = AppState { index: IndexHandle::new(index), config: Arc::new(config) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler).post(search_json_handler))
        .route("/search/text", get(search_text_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/stats", get(stats_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn search_error(err: SearchError) -> ApiError {
    (StatusCode::BAD_REQUEST, err.to_string())
}

fn run_search(state: &AppState, query: SearchQuery) -> Result<SearchResponse, ApiError> {
    let start = std::time::Instant::now();
    // Snapshot: a concurrent rebuild does not affect this request.
    let index = state.index.current();
    let found = index.search_with_total(&query).map_err(search_error)?;

    let terms = index.options().analyzer.terms(&query.text);
    let highlighter = term_pattern(&terms);
    let results: Vec<SearchHit> = found
        .hits
        .iter()
        .map(|hit| to_hit(&index, &state.config, hit, highlighter.as_ref()))
        .collect();

    let elapsed = start.elapsed();
    Ok(SearchResponse {
        query: query.text,
        took_ms: elapsed.as_millis(),
        took_s: elapsed.as_secs_f64(),
        total_hits: found.total_hits,
        results,
    })
}

fn to_hit(index: &Index, config: &ServerConfig, hit: &ScoredResult<'_>, highlighter: Option<&Regex>) -> SearchHit {
    let keywords = index
        .schema()
        .keyword_fields()
        .iter()
        .map(|f| (f.clone(), index.keyword_value(f, hit.doc_id).map(str::to_string)))
        .collect();
    let text = excerpt(hit.document, config.excerpt_field(), DEFAULT_EXCERPT_CHARS);
    let excerpt = match (text.is_empty(), highlighter) {
        (true, _) => None,
        (false, Some(pat)) => Some(highlight_terms(&text, pat)),
        (false, None) => Some(text),
    };
    SearchHit { doc_id: hit.doc_id, score: hit.score, keywords, excerpt }
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.to_query()?;
    run_search(&state, query).map(Json)
}

pub async fn search_json_handler(
    State(state): State<AppState>,
    Json(query): Json<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    run_search(&state, query).map(Json)
}

pub async fn search_text_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<String, ApiError> {
    let query = params.to_query()?;
    let index = state.index.current();
    let hits = index.search(&query).map_err(search_error)?;
    Ok(render_results(&query.text, &hits, state.config.title_field(), state.config.excerpt_field()))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<u32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let index = state.index.current();
    match index.document(doc_id) {
        Some(doc) => Ok(Json(serde_json::json!({ "doc_id": doc_id, "document": doc }))),
        None => Err((StatusCode::NOT_FOUND, format!("document {doc_id} not found"))),
    }
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let index = state.index.current();
    let vocabulary = index
        .schema()
        .text_fields()
        .iter()
        .map(|f| (f.clone(), index.vocabulary_size(f)))
        .collect();
    Json(StatsResponse { num_docs: index.len(), vocabulary, scoring: index.options().scoring })
}

/// Reload the source and publish a fresh index. The old index keeps serving
/// until the new one is complete, and stays in place if loading fails.
async fn rebuild_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let config = state.config.clone();
    let index = tokio::task::spawn_blocking(move || config.load())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::warn!(error = %e, "rebuild failed, keeping current index");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
        })?;
    let num_docs = index.len();
    let previous = state.index.replace(index);
    tracing::info!(num_docs, previous_docs = previous.len(), "index rebuilt");
    Ok(Json(serde_json::json!({ "num_docs": num_docs, "previous_num_docs": previous.len() })))
}

/// One case-insensitive, word-bounded alternation over the normalized query
/// terms, longest first. `None` when there is nothing to highlight.
fn term_pattern(terms: &[String]) -> Option<Regex> {
    let mut terms: Vec<&str> = terms.iter().map(String::as_str).filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
        return None;
    }
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    terms.dedup();
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    RegexBuilder::new(&format!(r"\b(?:{alternation})\b")).case_insensitive(true).build().ok()
}

/// Wrap every match in `<em>` in a single pass, so inserted markup is never
/// matched again.
fn highlight_terms(snippet: &str, pat: &Regex) -> String {
    pat.replace_all(snippet, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).into_owned()
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.config.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
