use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use docdex_core::Document;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Anything that can produce the finite, ordered document collection an
/// index is built from.
pub trait DocumentSource {
    fn load(&self) -> Result<Vec<Document>>;
}

impl<S: DocumentSource + ?Sized> DocumentSource for Box<S> {
    fn load(&self) -> Result<Vec<Document>> { (**self).load() }
}

/// How a source path is read. Also the `--format` value of both binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Json,
    Markdown,
}

impl SourceFormat {
    pub fn open(self, path: impl Into<PathBuf>) -> Box<dyn DocumentSource + Send + Sync> {
        match self {
            SourceFormat::Json => Box::new(JsonSource::new(path)),
            SourceFormat::Markdown => Box::new(MarkdownSource::new(path)),
        }
    }
}

/// JSON documents: a `.json` file holding an object or an array of objects,
/// a `.jsonl` file with one object per line, or a directory walked for both.
#[derive(Debug, Clone)]
pub struct JsonSource {
    root: PathBuf,
}

impl JsonSource {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }
}

impl DocumentSource for JsonSource {
    fn load(&self) -> Result<Vec<Document>> {
        let mut files: Vec<PathBuf> = Vec::new();
        if self.root.is_dir() {
            for entry in WalkDir::new(&self.root).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() {
                    if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                        if matches!(ext, "json" | "jsonl") {
                            files.push(p.to_path_buf());
                        }
                    }
                }
            }
        } else if self.root.is_file() {
            files.push(self.root.clone());
        } else {
            bail!("input path {} does not exist", self.root.display());
        }

        let mut docs = Vec::new();
        for file in files {
            if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                read_jsonl(&file, &mut docs)?;
            } else {
                read_json(&file, &mut docs)?;
            }
        }
        tracing::info!(root = %self.root.display(), num_docs = docs.len(), "loaded json documents");
        Ok(docs)
    }
}

fn read_jsonl(file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let value: serde_json::Value = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid json", file.display(), lineno + 1))?;
        push_object(value, file, docs)?;
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let json: serde_json::Value =
        serde_json::from_reader(reader).with_context(|| format!("{}: invalid json", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                push_object(v, file, docs)?;
            }
        }
        serde_json::Value::Object(_) => push_object(json, file, docs)?,
        _ => tracing::warn!(file = %file.display(), "skipping json file without objects"),
    }
    Ok(())
}

fn push_object(value: serde_json::Value, file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    match Document::from_json(value) {
        Some(doc) => {
            docs.push(doc);
            Ok(())
        }
        None => bail!("{}: expected a json object per document", file.display()),
    }
}

/// Markdown files (`.md`, `.mdx`) under a directory, in path order, as
/// `{content, filename}` documents. `filename` is relative to the root and
/// always uses `/` separators.
#[derive(Debug, Clone)]
pub struct MarkdownSource {
    root: PathBuf,
}

impl MarkdownSource {
    pub const CONTENT_FIELD: &'static str = "content";
    pub const FILENAME_FIELD: &'static str = "filename";

    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }
}

impl DocumentSource for MarkdownSource {
    fn load(&self) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            bail!("markdown source {} is not a directory", self.root.display());
        }
        let mut docs = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!(%err, "skipping unreadable entry");
                    continue;
                }
            };
            let p = entry.path();
            if !p.is_file() { continue; }
            if !matches!(p.extension().and_then(|s| s.to_str()), Some("md" | "mdx")) { continue; }

            let bytes = match fs::read(p) {
                Ok(b) => b,
                Err(err) => {
                    tracing::warn!(file = %p.display(), %err, "skipping unreadable file");
                    continue;
                }
            };
            let content = String::from_utf8_lossy(&bytes).into_owned();
            let rel = p.strip_prefix(&self.root).unwrap_or(p);
            let filename = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            docs.push(
                Document::new()
                    .with(Self::CONTENT_FIELD, content)
                    .with(Self::FILENAME_FIELD, filename),
            );
        }
        tracing::info!(root = %self.root.display(), num_docs = docs.len(), "loaded markdown documents");
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn json_accepts_object_and_array() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"[{"content": "one"}, {"content": "two"}]"#).unwrap();
        fs::write(dir.path().join("b.json"), r#"{"content": "three", "filename": null}"#).unwrap();
        let docs = JsonSource::new(dir.path()).load().unwrap();
        let contents: Vec<_> = docs.iter().map(|d| d.get("content").unwrap()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert_eq!(docs[2].get("filename"), None);
    }

    #[test]
    fn jsonl_skips_blank_lines_and_reports_bad_ones() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("docs.jsonl");
        fs::write(&file, "{\"content\": \"a\"}\n\n{\"content\": \"b\"}\n").unwrap();
        assert_eq!(JsonSource::new(&file).load().unwrap().len(), 2);

        fs::write(&file, "{\"content\": \"a\"}\nnot json\n").unwrap();
        let err = JsonSource::new(&file).load().unwrap_err();
        assert!(err.to_string().contains(":2"));
    }

    #[test]
    fn format_parses_from_cli_and_json() {
        assert_eq!(SourceFormat::from_str("markdown", false).unwrap(), SourceFormat::Markdown);
        assert_eq!(SourceFormat::from_str("json", false).unwrap(), SourceFormat::Json);
        assert!(SourceFormat::from_str("zip", false).is_err());
        let f: SourceFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(f, SourceFormat::Json);
    }

    #[test]
    fn missing_path_is_an_error() {
        assert!(JsonSource::new("/definitely/not/here").load().is_err());
        assert!(MarkdownSource::new("/definitely/not/here").load().is_err());
    }
}
