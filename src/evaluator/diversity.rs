//! @ai:module:intent Distinct-n lexical diversity
//! @ai:module:layer domain
//! @ai:module:public_api distinct_n
//! @ai:module:stateless true

use std::collections::HashSet;

/// @ai:intent Fraction of unique n-grams among all n-grams of the token sequence
/// @ai:pre tokens are already filtered to alphabetic words
/// @ai:post returns 0.0 when no n-gram can be formed (n == 0 or len < n)
/// @ai:effects pure
pub fn distinct_n(tokens: &[String], n: usize) -> f64 {
    if n == 0 || tokens.len() < n {
        return 0.0;
    }

    let total = tokens.len() - n + 1;
    let unique: HashSet<&[String]> = tokens.windows(n).collect();

    unique.len() as f64 / total as f64
}
