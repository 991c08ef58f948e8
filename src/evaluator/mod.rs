//! @ai:module:intent Story evaluation: text-quality metrics and LLM judges
//! @ai:module:layer application
//! @ai:module:public_api TextEvaluator, StoryJudge, LlmJudge, MockJudge, readability_grade, distinct_n, perplexity_proxy

pub mod diversity;
pub mod judge;
pub mod perplexity;
pub mod readability;
pub mod tokenizer;

pub use diversity::distinct_n;
pub use judge::{build_prompt, parse_scores, LlmJudge, MockJudge, StoryJudge, SYSTEM_PROMPT};
pub use perplexity::perplexity_proxy;
pub use readability::readability_grade;
pub use tokenizer::word_tokens;

use crate::metrics::types::{MetricVector, DISTINCT_1, DISTINCT_2, PERPLEXITY_PROXY, READABILITY_GRADE};

/// @ai:intent Computes the metric vector of a story without I/O or shared state
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEvaluator;

impl TextEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Evaluate one story text
    ///            Tokenizes once; readability sees the raw text, the other metrics
    ///            see the alphabetic tokens
    /// @ai:post metric order is readability_grade, distinct_1, distinct_2, perplexity_proxy
    /// @ai:effects pure
    pub fn evaluate(&self, text: &str) -> MetricVector {
        let tokens = word_tokens(text);

        MetricVector::new()
            .with(READABILITY_GRADE, readability_grade(text))
            .with(DISTINCT_1, distinct_n(&tokens, 1))
            .with(DISTINCT_2, distinct_n(&tokens, 2))
            .with(PERPLEXITY_PROXY, perplexity_proxy(&tokens))
    }
}
