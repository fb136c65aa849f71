//! Word list loading and cleanup

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;

use crate::error::{DomaineratorError, Result, WordListKind};

/// Load a word list file, one word per line.
///
/// Whitespace is stripped from every word (inner spaces too), empty lines are
/// dropped and duplicates removed keeping the first occurrence.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        DomaineratorError::io(e.to_string(), Some(path.to_string_lossy().to_string()))
    })?;
    Ok(from_lines(&content))
}

/// Load one of the two required word lists, rejecting empty results
pub fn load_required(
    path: impl AsRef<Path>,
    kind: WordListKind,
    filter: Option<&Regex>,
) -> Result<Vec<String>> {
    let path = path.as_ref();
    let shown = path.to_string_lossy().to_string();

    let words = load(path).map_err(|e| DomaineratorError::word_list(kind, &shown, e.to_string()))?;
    let words = match filter {
        Some(re) => filter_matching(words, re),
        None => words,
    };

    if words.is_empty() {
        return Err(DomaineratorError::word_list(kind, shown, "empty word list"));
    }

    tracing::debug!(path = %shown, list = %kind, words = words.len(), "Word list loaded");
    Ok(words)
}

/// Split newline separated text into a clean word list
pub fn from_lines(content: &str) -> Vec<String> {
    remove_duplicates(content.lines().map(strip_whitespace).filter(|w| !w.is_empty()))
}

/// Parse a CSV string into a cleaned list of words
pub fn from_csv(csv: &str) -> Vec<String> {
    csv.trim()
        .split(',')
        .map(strip_whitespace)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Remove every whitespace character from a word
pub fn strip_whitespace(word: &str) -> String {
    word.split_whitespace().collect()
}

/// Remove duplicate strings keeping the first occurrence
pub fn remove_duplicates<I>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    words
        .into_iter()
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// True when every character is a single byte (plain ASCII)
pub fn is_ascii_word(word: &str) -> bool {
    word.chars().count() == word.len()
}

/// Remove words with multi-byte UTF-8 characters
pub fn filter_utf8(words: Vec<String>) -> Vec<String> {
    words.into_iter().filter(|w| is_ascii_word(w)).collect()
}

/// Keep only words matching the regex
pub fn filter_matching(words: Vec<String>, re: &Regex) -> Vec<String> {
    words.into_iter().filter(|w| re.is_match(w)).collect()
}

/// Compile a user supplied word filter
pub fn compile_filter(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| DomaineratorError::filter(pattern, e.to_string()))
}
