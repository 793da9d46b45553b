use icu_normalizer::ComposingNormalizerBorrowed;

/// Queries shorter than this are never sent.
pub const MIN_QUERY_CHARS: usize = 2;

fn nfc(text: &str) -> String {
    ComposingNormalizerBorrowed::new_nfc()
        .normalize(text)
        .into_owned()
}

/// Cache key and request text for a word lookup.
pub fn normalize_word(text: &str) -> String {
    nfc(text.trim()).to_lowercase()
}

/// Sentences keep their casing.
pub fn normalize_sentence(text: &str) -> String {
    nfc(text.trim())
}

pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}

/// Dropped from a word picked out of running text.
const PICK_PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '?', '"', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_',
    '`', '~', '(', ')',
];

/// Clean up a word picked from an example or sentence. None if what is left
/// is too short to look up.
pub fn clean_picked_word(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| !PICK_PUNCTUATION.contains(c)).collect();
    let cleaned = cleaned.trim();
    is_searchable(cleaned).then(|| cleaned.to_string())
}

/// Distinct words worth looking up in `passages`, in reading order.
pub fn pick_candidates<'a>(passages: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in passages.into_iter().flat_map(str::split_whitespace) {
        if let Some(word) = clean_picked_word(raw)
            && !out.iter().any(|w| normalize_word(w) == normalize_word(&word))
        {
            out.push(word);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_is_trimmed_and_lowercased() {
        assert_eq!(normalize_word("  Exit \n"), "exit");
    }

    #[test]
    fn test_decomposed_vietnamese_composes() {
        // "việt" with combining marks vs. precomposed.
        let decomposed = "vie\u{0323}\u{0302}t";
        assert_eq!(normalize_word(decomposed), normalize_word("việt"));
        assert_eq!(normalize_word(decomposed).chars().count(), 4);
    }

    #[test]
    fn test_sentence_keeps_case() {
        assert_eq!(normalize_sentence(" How are you? "), "How are you?");
    }

    #[test]
    fn test_short_queries_not_searchable() {
        assert!(!is_searchable(""));
        assert!(!is_searchable(" a "));
        assert!(is_searchable("ăn"));
    }

    #[test]
    fn test_picked_word_loses_punctuation() {
        assert_eq!(clean_picked_word("(exit),").as_deref(), Some("exit"));
        assert_eq!(clean_picked_word("well-known").as_deref(), Some("wellknown"));
        assert_eq!(clean_picked_word("don't").as_deref(), Some("don't"));
        assert_eq!(clean_picked_word("a.").as_deref(), None);
        assert_eq!(clean_picked_word("--").as_deref(), None);
    }

    #[test]
    fn test_candidates_are_distinct_and_ordered() {
        let words = pick_candidates(["Use the exit, now!", "THE exit is here."]);
        assert_eq!(words, vec!["Use", "the", "exit", "now", "is", "here"]);
    }
}
