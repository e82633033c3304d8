use regex::Regex;
use std::sync::OnceLock;

fn word_pattern() -> &'static Regex {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    WORDS.get_or_init(|| Regex::new(r"\S+").expect("static word pattern is valid"))
}

/// Count runs of non-whitespace characters
pub fn word_count(text: &str) -> usize {
    word_pattern().find_iter(text).count()
}

/// Length of the text in characters (not bytes)
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Collapse whitespace runs to a single space and trim the ends, the way
/// a renderer lays out inline text
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
