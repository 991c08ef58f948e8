//! @ai:module:intent Story evaluation library: text metrics, LLM judging, corpus aggregation
//! @ai:module:layer application
//! @ai:module:public_api config, corpus, error, evaluator, metrics, report, runner

pub mod config;
pub mod corpus;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod report;
pub mod runner;

pub use config::{BenchmarkConfig, FailurePolicy};
pub use corpus::{CorpusSpec, JsonSampleLoader, SampleId, SampleLoader, StorySample, Variant};
pub use error::{BenchError, Result};
pub use evaluator::{LlmJudge, MockJudge, StoryJudge, TextEvaluator};
pub use metrics::{CorpusAggregator, CorpusReport, MetricVector};
pub use report::ReportGenerator;
pub use runner::{ChatClient, ChatClientTrait, MockChatClient, RetryPolicy};
