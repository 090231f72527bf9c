use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}_]+(?:'[\p{L}\p{N}_]+)*").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Text normalization settings. The same analyzer must be used for indexing
/// and querying, so it is stored on the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analyzer {
    pub remove_stopwords: bool,
}

impl Default for Analyzer {
    fn default() -> Self { Self { remove_stopwords: true } }
}

impl Analyzer {
    pub fn new(remove_stopwords: bool) -> Self { Self { remove_stopwords } }

    /// Tokenize text into (term, position). Positions count every matched
    /// token, including dropped stopwords.
    pub fn tokenize(&self, text: &str) -> Vec<(String, usize)> {
        let normalized = normalize(text);
        let mut tokens = Vec::new();
        for (pos, mat) in RE.find_iter(&normalized).enumerate() {
            let token = mat.as_str();
            if self.remove_stopwords && is_stopword(token) { continue; }
            tokens.push((token.to_string(), pos));
        }
        tokens
    }

    /// Terms only, in order.
    pub fn terms(&self, text: &str) -> Vec<String> {
        self.tokenize(text).into_iter().map(|(t, _)| t).collect()
    }
}

/// NFKD + accent folding + lowercase. Typographic apostrophes fold to `'`.
pub fn normalize(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{02BC}' => '\'',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

/// Tokenize with the default analyzer (stopwords removed, no stemming).
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    Analyzer::default().tokenize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Running, runner's run!");
        let words: Vec<&str> = t.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["running", "runner's", "run"]);
    }

    #[test]
    fn positions_skip_stopwords() {
        let t = tokenize("the quick fox");
        assert_eq!(t, vec![("quick".to_string(), 1), ("fox".to_string(), 2)]);
    }

    #[test]
    fn keeps_stopwords_when_disabled() {
        let terms = Analyzer::new(false).terms("The end");
        assert_eq!(terms, vec!["the", "end"]);
    }

    #[test]
    fn curly_apostrophe_matches_stopword() {
        assert!(tokenize("don\u{2019}t").is_empty());
    }
}
