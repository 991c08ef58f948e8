//! @ai:module:intent Flesch-Kincaid grade-level readability
//! @ai:module:layer domain
//! @ai:module:public_api readability_grade
//! @ai:module:stateless true

use crate::evaluator::tokenizer::{raw_words, sentence_count, syllable_count};

/// @ai:intent Flesch-Kincaid grade level of raw text
/// @ai:pre text is the raw story, punctuation included
/// @ai:post result is finite; text without words scores 0.0
/// @ai:effects pure
pub fn readability_grade(text: &str) -> f64 {
    let words = raw_words(text);
    if words.is_empty() {
        return 0.0;
    }

    let sentences = sentence_count(text).max(1) as f64;
    let word_count = words.len() as f64;
    let syllables: usize = words.iter().map(|w| syllable_count(w)).sum();

    0.39 * (word_count / sentences) + 11.8 * (syllables as f64 / word_count) - 15.59
}
