use anyhow::Result;
use axum::Router;
use clap::Parser;
use docdex_core::{Analyzer, IndexOptions, Schema, Scoring};
use docdex_indexer::{parse_boost, SourceFormat};
use docdex_server::{build_app, ServerConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Document source path (file or directory)
    #[arg(long, default_value = "./docs")]
    source: String,
    /// How to read the source
    #[arg(long, value_enum, default_value_t = SourceFormat::Markdown)]
    format: SourceFormat,
    /// Text fields to tokenize and score
    #[arg(long = "text-field", default_values_t = vec!["content".to_string()])]
    text_fields: Vec<String>,
    /// Keyword fields for exact-match filtering
    #[arg(long = "keyword-field", default_values_t = vec!["filename".to_string()])]
    keyword_fields: Vec<String>,
    /// Default field boost, field=weight (repeatable)
    #[arg(long = "boost")]
    boosts: Vec<String>,
    /// Rank by cosine similarity instead of summed tf-idf
    #[arg(long, default_value_t = false)]
    cosine: bool,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let mut options = IndexOptions {
        scoring: if args.cosine { Scoring::Cosine } else { Scoring::TfIdf },
        analyzer: Analyzer::default(),
        ..IndexOptions::default()
    };
    for b in &args.boosts {
        let (field, weight) = parse_boost(b)?;
        options.boosts.insert(field, weight);
    }
    let config = ServerConfig {
        source: args.source.clone().into(),
        format: args.format,
        schema: Schema::new(args.text_fields.clone(), args.keyword_fields.clone())?,
        options,
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
