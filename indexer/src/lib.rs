//! Document sources and index loading shared by the `docdex` CLI and the
//! search server.

pub mod source;

pub use source::{DocumentSource, JsonSource, MarkdownSource, SourceFormat};

use anyhow::{anyhow, Context, Result};
use docdex_core::{Index, IndexOptions, Schema};

/// Load every document from `source` and build an index over it.
pub fn load_index(source: &dyn DocumentSource, schema: Schema, options: IndexOptions) -> Result<Index> {
    let docs = source.load()?;
    let index = Index::build_with(docs, schema, options).context("building index")?;
    Ok(index)
}

/// Parse `name=value`. The value may itself contain `=`.
pub fn parse_assignment(s: &str) -> Result<(String, String)> {
    let (name, value) = s.split_once('=').ok_or_else(|| anyhow!("expected name=value, got `{s}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("missing field name in `{s}`"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Parse `name=weight`.
pub fn parse_boost(s: &str) -> Result<(String, f32)> {
    let (name, value) = parse_assignment(s)?;
    let weight: f32 = value.trim().parse().with_context(|| format!("invalid boost weight in `{s}`"))?;
    Ok((name, weight))
}
