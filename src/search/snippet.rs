//! Snippet construction and highlighting
//!
//! A snippet is a window of the page text starting at the first match of the
//! query. Matching falls back from the whole query to single words and then
//! to word prefixes with up to three characters trimmed.

use regex::{Regex, RegexBuilder};

const MAX_TRIMMED_CHARS: usize = 3;

/// Builds a highlighted snippet of `text` for `query`
///
/// # Arguments
///
/// * `text` - Plain text of the page
/// * `query` - The raw search query
/// * `window` - Characters kept after the end of the match
///
/// # Returns
///
/// The excerpt with every matched term wrapped in `<b>` tags, or an empty
/// string when nothing matches.
pub fn build_snippet(text: &str, query: &str, window: usize) -> String {
    let query = query.trim();
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return String::new();
    }

    if let Some(found) = find_ci(text, query) {
        return highlight(&excerpt(text, found, window), &words);
    }

    for word in &words {
        if let Some(found) = find_ci(text, word) {
            return highlight(&excerpt(text, found, window), &words);
        }
    }

    for word in &words {
        for prefix in prefixes(word) {
            if let Some(found) = find_ci(text, prefix) {
                return highlight(&excerpt(text, found, window), &[prefix]);
            }
        }
    }

    String::new()
}

/// Wraps every case-insensitive occurrence of the terms in `<b>` tags
///
/// Longer terms win when terms overlap.
pub fn highlight(snippet: &str, terms: &[&str]) -> String {
    let mut terms: Vec<&str> = terms.iter().copied().filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
        return snippet.to_string();
    }
    terms.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
    terms.dedup();

    let pattern = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");

    match case_insensitive(&pattern) {
        Some(re) => re.replace_all(snippet, "<b>$0</b>").into_owned(),
        None => snippet.to_string(),
    }
}

/// Prefixes of `word` with one to three trailing characters removed
fn prefixes(word: &str) -> Vec<&str> {
    let boundaries: Vec<usize> = word.char_indices().map(|(i, _)| i).collect();
    (1..=MAX_TRIMMED_CHARS)
        .filter(|trim| *trim < boundaries.len())
        .map(|trim| &word[..boundaries[boundaries.len() - trim]])
        .collect()
}

fn case_insensitive(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

/// Byte range of the first case-insensitive occurrence of `needle`
fn find_ci(text: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    case_insensitive(&regex::escape(needle))?
        .find(text)
        .map(|m| (m.start(), m.end()))
}

/// Cuts the window that starts at the match
///
/// When text remains after the window, the excerpt is cut back to its last
/// space and " ..." is appended.
fn excerpt(text: &str, (start, end): (usize, usize), window: usize) -> String {
    let tail = &text[end..];
    match tail.char_indices().nth(window) {
        Some((cut, _)) => {
            let slice = &text[start..end + cut];
            let kept = match slice.rfind(' ') {
                Some(space) if space > end - start => &slice[..space],
                _ => slice,
            };
            format!("{} ...", kept)
        }
        None => text[start..].to_string(),
    }
}
