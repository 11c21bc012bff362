//! Display labels from identifiers

use crate::config::LabelCase;

/// Turn an identifier into a display label
///
/// Splits on `_`, `-` and whitespace, on lower-to-upper camelCase
/// boundaries, and before the last capital of an acronym run
/// (`HTTPServer` -> `HTTP`, `Server`).
///
/// ```ignore
/// assert_eq!(humanize("maxSpeed", LabelCase::Upper), "MAX SPEED");
/// assert_eq!(humanize("max_speed", LabelCase::Title), "Max Speed");
/// ```
pub fn humanize(identifier: &str, case: LabelCase) -> String {
    let words = split_words(identifier);
    let cased: Vec<String> = match case {
        LabelCase::Upper => words.iter().map(|w| w.to_uppercase()).collect(),
        LabelCase::Title => words.iter().map(|w| title_word(w)).collect(),
    };
    cased.join(" ")
}

fn split_words(identifier: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = identifier.char_indices().collect();
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &(offset, c)) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if let Some(s) = start.take() {
                words.push(&identifier[s..offset]);
            }
            continue;
        }

        if let Some(s) = start {
            let prev = chars[i - 1].1;
            let next = chars.get(i + 1).map(|&(_, n)| n);
            let camel = c.is_uppercase() && (prev.is_lowercase() || prev.is_ascii_digit());
            let acronym_end = c.is_uppercase()
                && prev.is_uppercase()
                && next.is_some_and(|n| n.is_lowercase());
            if camel || acronym_end {
                words.push(&identifier[s..offset]);
                start = Some(offset);
            }
        } else {
            start = Some(offset);
        }
    }

    if let Some(s) = start {
        words.push(&identifier[s..]);
    }
    words
}

fn title_word(word: &str) -> String {
    if word.chars().all(|c| !c.is_lowercase()) {
        return word.to_string();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_and_camel_agree() {
        assert_eq!(humanize("max_speed", LabelCase::Upper), "MAX SPEED");
        assert_eq!(humanize("maxSpeed", LabelCase::Upper), "MAX SPEED");
        assert_eq!(humanize("MaxSpeed", LabelCase::Upper), "MAX SPEED");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(humanize("max_speed", LabelCase::Title), "Max Speed");
        assert_eq!(humanize("HTTPServer_port", LabelCase::Title), "HTTP Server Port");
    }

    #[test]
    fn test_edge_cases() {
        assert_eq!(humanize("", LabelCase::Upper), "");
        assert_eq!(humanize("__private__", LabelCase::Upper), "PRIVATE");
        assert_eq!(humanize("layer2Opacity", LabelCase::Upper), "LAYER2 OPACITY");
        assert_eq!(humanize("x", LabelCase::Title), "X");
    }
}
