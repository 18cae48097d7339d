//! Matching strategies shared by the bulk dataset engines.

use std::{fmt, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;

use crate::foods::repo_types::OffProduct;

pub const MAX_KEYWORD_TOKENS: usize = 6;
const MIN_TOKEN_CHARS: usize = 2;

/// How the bulk dataset matches a free-text query. Fixed per engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Case-insensitive substring on name or brand, sorted by popularity.
    #[default]
    Regex,
    /// Native full-text relevance. Not pageable.
    Text,
    /// Token overlap with the precomputed keyword set, sorted by scan count.
    Keyword,
}

impl SearchMode {
    pub fn supports_cursor(self) -> bool {
        !matches!(self, SearchMode::Text)
    }

    /// Primary sort key used for ordering and cursors.
    pub fn sort_key(self, p: &OffProduct) -> i64 {
        match self {
            SearchMode::Keyword => p.scans(),
            SearchMode::Regex | SearchMode::Text => p.popularity(),
        }
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "regex" => Ok(SearchMode::Regex),
            "text" => Ok(SearchMode::Text),
            "keyword" | "keywords" => Ok(SearchMode::Keyword),
            other => Err(format!("unknown search mode: {other}")),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchMode::Regex => "regex",
            SearchMode::Text => "text",
            SearchMode::Keyword => "keyword",
        })
    }
}

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"[^\W_]+").unwrap();
}

/// Lowercase alphanumeric words of at least two chars, in first-seen order, deduplicated.
pub fn words(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut out: Vec<String> = Vec::new();
    for m in WORD_RE.find_iter(&lower) {
        let w = m.as_str();
        if w.chars().count() < MIN_TOKEN_CHARS || out.iter().any(|o| o == w) {
            continue;
        }
        out.push(w.to_string());
    }
    out
}

/// Query tokens for keyword mode, capped at [`MAX_KEYWORD_TOKENS`].
pub fn keyword_tokens(query: &str) -> Vec<String> {
    let mut tokens = words(query);
    tokens.truncate(MAX_KEYWORD_TOKENS);
    tokens
}

/// Relevance of `doc` for text mode: how many of its words are query tokens.
pub fn text_score(tokens: &[String], doc: &str) -> usize {
    let lower = doc.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .filter(|m| tokens.iter().any(|t| t == m.as_str()))
        .count()
}

/// Pattern for a literal, case-insensitive substring match.
pub fn substring_pattern(query: &str) -> String {
    regex::escape(query.trim())
}
