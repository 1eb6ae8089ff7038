//! Word counting for recognized phrases

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Apostrophes stay, "don't" is one word
    static ref PUNCTUATION: Regex = Regex::new(r#"[.,;:!?¡¿"()\[\]…–-]"#).expect("static regex");
}

/// Strip punctuation that isn't part of a word
pub fn strip_punctuation(text: &str) -> String {
    PUNCTUATION.replace_all(text, " ").into_owned()
}

/// Split a phrase into words, punctuation removed
pub fn words(text: &str) -> Vec<String> {
    strip_punctuation(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub fn word_count(text: &str) -> usize {
    strip_punctuation(text).split_whitespace().count()
}

/// Case-insensitive comparison that ignores punctuation and spacing
pub fn same_words(a: &str, b: &str) -> bool {
    let a = words(a);
    let b = words(b);
    a.len() == b.len()
        && a
            .iter()
            .zip(b.iter())
            .all(|(x, y)| x.to_lowercase() == y.to_lowercase())
}
