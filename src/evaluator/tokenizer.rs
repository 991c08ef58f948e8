//! @ai:module:intent Word, sentence and syllable segmentation for English story text
//! @ai:module:layer domain
//! @ai:module:public_api word_tokens, raw_words, sentence_count, syllable_count
//! @ai:module:stateless true

use regex::Regex;
use std::sync::LazyLock;

/// Runs of letters and digits, allowing the inner joiners of contractions,
/// hyphenated compounds and abbreviations.
static WORD_PIECE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}'’.\-]+").expect("valid word regex"));

/// Dash runs and ellipses separate words even without surrounding spaces.
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}|\.{2,}|[\x{2026}\x{2014}\x{2013}]").expect("valid separator regex"));

/// Terminal punctuation, optional closing quotes or brackets, then whitespace or end.
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.!?]+["'”’)\]]*(\s+|$)"#).expect("valid sentence regex"));

const CONTRACTION_SUFFIXES: [&str; 7] = ["n't", "'s", "'re", "'ll", "'d", "'m", "'ve"];

fn is_joiner(c: char) -> bool {
    matches!(c, '\'' | '’' | '-' | '.')
}

/// @ai:intent True for a non-empty token made only of letters
/// @ai:effects pure
pub fn is_alphabetic_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

/// @ai:intent Lower-cased alphabetic word tokens
/// @ai:post punctuation, numbers and hyphenated compounds are dropped;
///          dash runs and ellipses split words apart;
///          contraction suffixes are split off and dropped, keeping the stem
/// @ai:effects pure
pub fn word_tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let separated = SEPARATOR.replace_all(&lowered, " ");

    WORD_PIECE
        .find_iter(&separated)
        .filter_map(|m| {
            let piece = m.as_str().trim_matches(is_joiner).replace('’', "'");
            let stem = CONTRACTION_SUFFIXES
                .iter()
                .find_map(|suffix| piece.strip_suffix(suffix))
                .unwrap_or(piece.as_str());

            is_alphabetic_token(stem).then(|| stem.to_string())
        })
        .collect()
}

/// @ai:intent Whitespace-separated words of the raw text, surrounding punctuation removed
/// @ai:effects pure
pub fn raw_words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect()
}

/// @ai:intent Count sentences containing at least one word
/// @ai:post text with words but no terminal punctuation counts as one sentence
/// @ai:effects pure
pub fn sentence_count(text: &str) -> usize {
    let count = SENTENCE_END
        .split(text)
        .filter(|segment| segment.chars().any(char::is_alphanumeric))
        .count();

    if count == 0 && text.chars().any(char::is_alphanumeric) {
        1
    } else {
        count
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// @ai:intent Estimate English syllables in a word
/// @ai:post words with letters count at least one syllable; words without letters count zero
/// @ai:effects pure
pub fn syllable_count(word: &str) -> usize {
    let letters: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect();

    if letters.is_empty() {
        return 0;
    }

    let mut count = 0;
    let mut previous_vowel = false;
    for &c in &letters {
        let vowel = is_vowel(c);
        if vowel && !previous_vowel {
            count += 1;
        }
        previous_vowel = vowel;
    }

    // Silent final "e", except consonant + "le" as in "table".
    let n = letters.len();
    if count > 1 && letters[n - 1] == 'e' {
        let consonant_le = n >= 3 && letters[n - 2] == 'l' && !is_vowel(letters[n - 3]);
        if !consonant_le {
            count -= 1;
        }
    }

    count.max(1)
}
