use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use docdex_core::{render_results, Analyzer, IndexOptions, Schema, Scoring, SearchQuery, DEFAULT_LIMIT};
use docdex_indexer::{load_index, parse_assignment, parse_boost, SourceFormat};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "docdex")]
#[command(about = "Build an in-memory TF-IDF index over a document collection and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Input path (file or directory)
    #[arg(long)]
    input: String,
    /// How to read the input
    #[arg(long, value_enum, default_value_t = SourceFormat::Markdown)]
    format: SourceFormat,
    /// Text fields to tokenize and score
    #[arg(long = "text-field", default_values_t = vec!["content".to_string()])]
    text_fields: Vec<String>,
    /// Keyword fields for exact-match filtering
    #[arg(long = "keyword-field", default_values_t = vec!["filename".to_string()])]
    keyword_fields: Vec<String>,
    /// Rank by cosine similarity instead of summed tf-idf
    #[arg(long, default_value_t = false)]
    cosine: bool,
    /// Keep stopwords when tokenizing
    #[arg(long, default_value_t = false)]
    keep_stopwords: bool,
}

impl SourceArgs {
    fn build(&self) -> Result<docdex_core::Index> {
        let schema = Schema::new(self.text_fields.iter().cloned(), self.keyword_fields.iter().cloned())?;
        let options = IndexOptions {
            scoring: if self.cosine { Scoring::Cosine } else { Scoring::TfIdf },
            analyzer: Analyzer::new(!self.keep_stopwords),
            ..IndexOptions::default()
        };
        let source = self.format.open(&self.input);
        load_index(source.as_ref(), schema, options)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Index the input and print the top matches for a query
    Search {
        #[command(flatten)]
        source: SourceArgs,
        /// Maximum number of results
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        /// Exact keyword filter, field=value (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// Field boost, field=weight (repeatable)
        #[arg(long = "boost")]
        boosts: Vec<String>,
        /// Print results as JSON instead of a text listing
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Query words
        query: Vec<String>,
    },
    /// Index the input and print document and vocabulary counts
    Stats {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { source, limit, filters, boosts, json, query } => {
            let text = if query.is_empty() { "How to use FastMCP?".to_string() } else { query.join(" ") };
            let mut q = SearchQuery::new(text).limit(limit);
            for f in &filters {
                let (field, value) = parse_assignment(f)?;
                q = q.filter(field, value);
            }
            for b in &boosts {
                let (field, weight) = parse_boost(b)?;
                q = q.boost(field, weight);
            }

            let index = source.build()?;
            let hits = index.search(&q)?;
            if json {
                let out: Vec<serde_json::Value> = hits
                    .iter()
                    .map(|h| serde_json::json!({ "doc_id": h.doc_id, "score": h.score, "document": h.document }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                let title_field = source.keyword_fields.first().unwrap_or(&source.text_fields[0]);
                println!("{}", render_results(&q.text, &hits, title_field, &source.text_fields[0]));
            }
        }
        Commands::Stats { source } => {
            let index = source.build()?;
            println!("documents: {}", index.len());
            for field in index.schema().text_fields() {
                println!("vocabulary[{field}]: {}", index.vocabulary_size(field));
            }
        }
    }
    Ok(())
}
