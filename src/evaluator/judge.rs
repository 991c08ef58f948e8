//! @ai:module:intent LLM-as-judge scoring of a single story
//! @ai:module:layer application
//! @ai:module:public_api StoryJudge, LlmJudge, MockJudge, JudgeVerdict
//! @ai:module:stateless true

use crate::error::{BenchError, Result};
use crate::metrics::types::JUDGE_CRITERIA;
use crate::runner::client::ChatClientTrait;
use crate::runner::retry::RetryPolicy;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// @ai:intent A judge maps story text to one score per criterion in `JUDGE_CRITERIA`
#[allow(async_fn_in_trait)]
pub trait StoryJudge: Send + Sync {
    /// @ai:intent Score one story
    /// @ai:post Ok values are `[fluency, creativity, attractiveness, plausibility]`
    async fn score(&self, story: &str) -> Result<Vec<f64>>;
}

/// @ai:intent Structured verdict the model is asked to return
#[derive(Debug, Deserialize)]
pub struct JudgeVerdict {
    #[serde(default)]
    pub explanation: String,
    pub final_output: Vec<serde_json::Value>,
}

pub const SYSTEM_PROMPT: &str =
    "You are an expert story reviewer, you are strict and good at judge the quality of a story.";

/// @ai:intent Render the reviewer prompt for one story
/// @ai:effects pure
pub fn build_prompt(story: &str) -> String {
    format!(
        r#"
Now I will give you a story, please evaluate it based on the following benchmarks:

1. Fluency
2. Creativity
3. Attractiveness
4. Plausibility

##Story:
{story}

Give each benchmark a score from 0 to 10. Give me your explanation, and the final_output should be a list of score: [fluency, creativity, attractiveness, plausibility].
"#
    )
}

/// @ai:intent Judge backed by a chat-completion model
pub struct LlmJudge<C: ChatClientTrait> {
    client: Arc<C>,
    retry: RetryPolicy,
}

impl<C: ChatClientTrait> LlmJudge<C> {
    pub fn new(client: Arc<C>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

impl<C: ChatClientTrait> StoryJudge for LlmJudge<C> {
    /// @ai:effects network
    async fn score(&self, story: &str) -> Result<Vec<f64>> {
        let prompt = build_prompt(story);

        let response = self
            .retry
            .run(|| self.client.complete(SYSTEM_PROMPT, &prompt))
            .await
            .map_err(|e| BenchError::JudgeTransport {
                reason: e.to_string(),
            })?;

        tracing::debug!("Judge response: {}", response.content);

        parse_scores(&response.content)
    }
}

/// @ai:intent Parse and validate the judge reply into a score vector
/// @ai:post Ok result has exactly `JUDGE_CRITERIA.len()` finite numbers
/// @ai:effects pure
pub fn parse_scores(response: &str) -> Result<Vec<f64>> {
    let json = extract_json(response)?;
    let verdict: JudgeVerdict = serde_json::from_str(json)
        .map_err(|e| BenchError::protocol(format!("unparseable verdict: {}", e)))?;

    if verdict.final_output.len() != JUDGE_CRITERIA.len() {
        return Err(BenchError::protocol(format!(
            "expected {} scores, got {}",
            JUDGE_CRITERIA.len(),
            verdict.final_output.len()
        )));
    }

    verdict
        .final_output
        .iter()
        .enumerate()
        .map(|(i, value)| {
            value
                .as_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    BenchError::protocol(format!(
                        "non-numeric {} score: {}",
                        JUDGE_CRITERIA[i], value
                    ))
                })
        })
        .collect()
}

/// @ai:intent Slice out the JSON object from a reply that may contain extra text
/// @ai:effects pure
fn extract_json(response: &str) -> Result<&str> {
    let start = response
        .find('{')
        .ok_or_else(|| BenchError::protocol("no JSON object found in judge response"))?;
    let end = response
        .rfind('}')
        .ok_or_else(|| BenchError::protocol("no JSON object end found in judge response"))?;

    if end <= start {
        return Err(BenchError::protocol("invalid JSON structure in judge response"));
    }

    Ok(&response[start..=end])
}

/// @ai:intent Judge replaying scripted score vectors in call order, cycling
pub struct MockJudge {
    scripted: Vec<Vec<f64>>,
    calls: AtomicUsize,
}

impl MockJudge {
    /// @ai:pre scripted is non-empty
    pub fn new(scripted: Vec<Vec<f64>>) -> Self {
        Self {
            scripted,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn constant(scores: Vec<f64>) -> Self {
        Self::new(vec![scores])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StoryJudge for MockJudge {
    async fn score(&self, _story: &str) -> Result<Vec<f64>> {
        if self.scripted.is_empty() {
            return Err(BenchError::protocol("mock judge has no scripted scores"));
        }

        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scripted[call % self.scripted.len()].clone())
    }
}
