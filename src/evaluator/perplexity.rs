//! @ai:module:intent Entropy-derived perplexity proxy over unigram frequencies
//! @ai:module:layer domain
//! @ai:module:public_api perplexity_proxy, MIN_TOKENS, NORMALIZATION
//! @ai:module:stateless true
//!
//! This is not a language-model perplexity. It is `2^H / 10`, where `H` is the
//! Shannon entropy of the token frequency distribution. The `/ 10` divisor is kept
//! only so numbers stay comparable with earlier published results.

use std::collections::BTreeMap;

/// Below this many tokens the distribution estimate is meaningless.
pub const MIN_TOKENS: usize = 10;

pub const NORMALIZATION: f64 = 10.0;

/// @ai:intent Perplexity proxy `2^entropy / 10` of the token multiset
/// @ai:pre tokens are already filtered to alphabetic words
/// @ai:post returns +inf when tokens.len() < MIN_TOKENS
/// @ai:effects pure
pub fn perplexity_proxy(tokens: &[String]) -> f64 {
    if tokens.len() < MIN_TOKENS {
        return f64::INFINITY;
    }

    // Sorted keys keep the summation order, and so the result, bit-identical across calls.
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }

    let total = tokens.len() as f64;
    let entropy = counts.values().fold(0.0_f64, |acc, &count| {
        let p = count as f64 / total;
        acc - p * p.log2()
    });

    2f64.powf(entropy) / NORMALIZATION
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeated(word: &str, n: usize) -> Vec<String> {
        vec![word.to_string(); n]
    }

    #[test]
    fn test_short_input_is_infinite() {
        assert_eq!(perplexity_proxy(&[]), f64::INFINITY);
        assert_eq!(perplexity_proxy(&repeated("a", 9)), f64::INFINITY);
    }

    #[test]
    fn test_identical_tokens_give_tenth() {
        assert_eq!(perplexity_proxy(&repeated("echo", 10)), 0.1);
        assert_eq!(perplexity_proxy(&repeated("echo", 57)), 0.1);
    }

    #[test]
    fn test_uniform_distribution() {
        // 16 distinct tokens -> entropy 4 bits -> 16 / 10
        let tokens: Vec<String> = (0..16).map(|i| format!("w{}", (b'a' + i as u8) as char)).collect();
        assert!((perplexity_proxy(&tokens) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_two_equal_halves() {
        let mut tokens = repeated("left", 5);
        tokens.extend(repeated("right", 5));
        // entropy 1 bit -> 2 / 10
        assert!((perplexity_proxy(&tokens) - 0.2).abs() < 1e-12);
    }
}
