use criterion::{criterion_group, criterion_main, Criterion};
use docdex_core::{Document, Index, SearchQuery};

fn corpus() -> Vec<Document> {
    let readme = include_str!("../README.md");
    (0..500)
        .map(|i| {
            let start = (i * 37) % readme.len().max(1);
            let body: String = readme.chars().cycle().skip(start).take(800).collect();
            Document::new().with("content", body).with("filename", format!("doc-{i}.md"))
        })
        .collect()
}

fn bench_search(c: &mut Criterion) {
    let docs = corpus();
    c.bench_function("build_500_docs", |b| {
        b.iter(|| Index::build(docs.clone(), &["content"], &["filename"]).unwrap())
    });
    let index = Index::build(docs, &["content"], &["filename"]).unwrap();
    let query = SearchQuery::new("search index query ranking");
    c.bench_function("search_500_docs", |b| b.iter(|| index.search(&query).unwrap()));
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
