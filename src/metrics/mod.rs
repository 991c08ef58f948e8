//! @ai:module:intent Metric vectors, corpus accumulation and reports
//! @ai:module:layer application
//! @ai:module:public_api MetricVector, CorpusAggregator, CorpusAccumulator, CorpusReport, average_repetitions

pub mod aggregator;
pub mod types;

pub use aggregator::{average_repetitions, CorpusAccumulator, CorpusAggregator};
pub use types::{
    CorpusReport, MetricEntry, MetricVector, PassKind, SampleResult, VariantAverages,
    ENGINE_METRICS, JUDGE_CRITERIA,
};
