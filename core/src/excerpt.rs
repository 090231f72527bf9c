use crate::{Document, ScoredResult};

pub const DEFAULT_EXCERPT_CHARS: usize = 200;

/// The first `max_chars` characters of `field`, with each run of line breaks
/// collapsed to a single space. A missing field yields an empty string.
pub fn excerpt(document: &Document, field: &str, max_chars: usize) -> String {
    let text = document.get(field).unwrap_or("");
    let mut out = String::new();
    let mut taken = 0;
    let mut in_break = false;
    for c in text.chars() {
        if taken == max_chars { break; }
        if c == '\n' || c == '\r' {
            if in_break { continue; }
            in_break = true;
            out.push(' ');
        } else {
            in_break = false;
            out.push(c);
        }
        taken += 1;
    }
    out
}

/// Plain-text listing of ranked hits: a header line, then the title and an
/// excerpt per hit.
pub fn render_results(query: &str, hits: &[ScoredResult<'_>], title_field: &str, text_field: &str) -> String {
    if hits.is_empty() {
        return format!("No results found for query: '{query}'");
    }
    let mut lines = vec![format!("Search results for: '{query}'")];
    for (i, hit) in hits.iter().enumerate() {
        let title = hit.document.get(title_field).unwrap_or("(untitled)");
        lines.push(format!("{}. {}", i + 1, title));
        lines.push(format!("   Excerpt: {}...", excerpt(hit.document, text_field, DEFAULT_EXCERPT_CHARS)));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_line_breaks() {
        let doc = Document::new().with("content", "# Title\r\n\nbody\ntext");
        assert_eq!(excerpt(&doc, "content", 200), "# Title body text");
    }

    #[test]
    fn truncates_on_chars() {
        let doc = Document::new().with("content", "héllo wörld");
        assert_eq!(excerpt(&doc, "content", 4), "héll");
        assert_eq!(excerpt(&doc, "missing", 4), "");
    }

    #[test]
    fn renders_listing() {
        let doc = Document::new().with("content", "line one\nline two").with("filename", "docs/a.md");
        let hits = vec![ScoredResult { doc_id: 0, document: &doc, score: 1.0 }];
        let text = render_results("line", &hits, "filename", "content");
        assert_eq!(text, "Search results for: 'line'\n1. docs/a.md\n   Excerpt: line one line two...");
        assert_eq!(render_results("zzz", &[], "filename", "content"), "No results found for query: 'zzz'");
    }
}
