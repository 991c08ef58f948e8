//! @ai:module:intent Corpus-level accumulation of per-story metrics and judge scores
//! @ai:module:layer application
//! @ai:module:public_api CorpusAggregator, CorpusAccumulator, average_repetitions
//! @ai:module:stateless false

use crate::config::{BenchmarkConfig, FailurePolicy};
use crate::corpus::{CorpusSpec, SampleId, SampleLoader, StorySample, Variant};
use crate::error::{BenchError, Result};
use crate::evaluator::StoryJudge;
use crate::metrics::types::{
    CorpusReport, MetricVector, PassKind, SampleResult, VariantAverages, JUDGE_CRITERIA,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::{BTreeMap, HashMap};

/// @ai:intent Element-wise mean of repeated judge score vectors
/// @ai:pre every vector has `expected_len` entries
/// @ai:post result has `expected_len` entries
/// @ai:effects pure
pub fn average_repetitions(reps: &[Vec<f64>], expected_len: usize) -> Result<Vec<f64>> {
    if reps.is_empty() {
        return Err(BenchError::protocol("no judge repetitions to average"));
    }

    let mut sums = vec![0.0; expected_len];
    for rep in reps {
        if rep.len() != expected_len {
            return Err(BenchError::protocol(format!(
                "expected {} scores, got {}",
                expected_len,
                rep.len()
            )));
        }
        for (sum, value) in sums.iter_mut().zip(rep) {
            *sum += value;
        }
    }

    let count = reps.len() as f64;
    Ok(sums.into_iter().map(|s| s / count).collect())
}

/// @ai:intent Running sums for one evaluation run
///
/// Owned by a single pass and consumed by `finish`. The denominator of every
/// average is the number of samples passed to `add_sample`.
#[derive(Debug, Default)]
pub struct CorpusAccumulator {
    sums: BTreeMap<Variant, MetricVector>,
    /// Metric names fixed by the first accumulated vector
    shape: Option<Vec<String>>,
    samples_counted: usize,
    skipped: Vec<String>,
    samples: Vec<SampleResult>,
}

impl CorpusAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Fold one sample's two variant vectors into the sums
    /// @ai:pre both vectors carry the metric names of the first accumulated vector, in order
    /// @ai:post on error nothing is accumulated
    /// @ai:effects state:write
    pub fn add_sample(
        &mut self,
        id: &SampleId,
        model_guided: MetricVector,
        direct: MetricVector,
    ) -> Result<()> {
        let shape = match &self.shape {
            Some(shape) => shape.clone(),
            None => model_guided.names().iter().map(|n| n.to_string()).collect(),
        };

        for (variant, metrics) in [(Variant::ModelGuided, &model_guided), (Variant::Direct, &direct)] {
            if metrics.names() != shape {
                return Err(BenchError::ShapeMismatch {
                    expected: shape,
                    found: metrics.names().iter().map(|n| n.to_string()).collect(),
                }
                .aborted_at(id.to_string(), variant.as_str()));
            }
        }

        self.shape = Some(shape);
        for (variant, metrics) in [(Variant::ModelGuided, model_guided), (Variant::Direct, direct)] {
            self.sums.entry(variant).or_default().add_assign(&metrics);
            self.samples.push(SampleResult {
                sample_id: id.to_string(),
                variant,
                metrics,
            });
        }
        self.samples_counted += 1;
        Ok(())
    }

    /// @ai:intent Record a sample left out of the run
    /// @ai:effects state:write
    pub fn skip(&mut self, id: &SampleId) {
        self.skipped.push(id.to_string());
    }

    pub fn samples_counted(&self) -> usize {
        self.samples_counted
    }

    /// @ai:intent Divide the sums by the counted samples and build the report
    /// @ai:post every average uses the same denominator, `samples_counted`
    /// @ai:effects time
    pub fn finish(
        self,
        kind: PassKind,
        expected_samples: usize,
        repetitions: u32,
        model: Option<String>,
    ) -> Result<CorpusReport> {
        if self.samples_counted == 0 {
            return Err(BenchError::EmptyCorpus);
        }

        let denominator = self.samples_counted as f64;
        let averages: Vec<VariantAverages> = Variant::ALL
            .iter()
            .map(|variant| VariantAverages {
                variant: *variant,
                metrics: self
                    .sums
                    .get(variant)
                    .map(|sum| sum.divided_by(denominator))
                    .unwrap_or_default(),
            })
            .collect();

        let delta = match (averages.first(), averages.get(1)) {
            (Some(guided), Some(direct)) => guided.metrics.minus(&direct.metrics),
            _ => MetricVector::new(),
        };

        Ok(CorpusReport {
            kind,
            timestamp: chrono::Utc::now().to_rfc3339(),
            model,
            repetitions,
            expected_samples,
            samples_counted: self.samples_counted,
            skipped: self.skipped,
            averages,
            delta,
            samples: self.samples,
        })
    }
}

/// One scored judge call, before reduction.
struct JudgeCall {
    sample: usize,
    variant: Variant,
    repetition: u32,
    scores: Vec<f64>,
}

/// @ai:intent Drives metric and judge passes over a fixed corpus
pub struct CorpusAggregator {
    spec: CorpusSpec,
    policy: FailurePolicy,
}

impl CorpusAggregator {
    pub fn new(spec: CorpusSpec, policy: FailurePolicy) -> Self {
        Self { spec, policy }
    }

    pub fn from_config(config: &BenchmarkConfig) -> Self {
        Self::new(CorpusSpec::from(&config.corpus), config.run.failure_policy)
    }

    pub fn spec(&self) -> &CorpusSpec {
        &self.spec
    }

    /// @ai:intent Load a sample, applying the failure policy
    /// @ai:post Ok(None) means the sample was skipped and recorded
    /// @ai:effects fs:read
    fn load_sample<L: SampleLoader + ?Sized>(
        &self,
        loader: &L,
        id: &SampleId,
        acc: &mut CorpusAccumulator,
    ) -> Result<Option<StorySample>> {
        match loader.load(id) {
            Ok(sample) => Ok(Some(sample)),
            Err(e) if e.is_malformed_sample() && self.policy == FailurePolicy::Skip => {
                tracing::warn!("Skipping sample {}: {}", id, e);
                acc.skip(id);
                Ok(None)
            }
            Err(e) => Err(e.aborted_at(id.to_string(), "record")),
        }
    }

    /// @ai:intent Apply `metric_fn` to both variants of every sample and average
    /// @ai:effects fs:read
    pub fn run_metric_pass<L, F>(&self, loader: &L, metric_fn: F) -> Result<CorpusReport>
    where
        L: SampleLoader + ?Sized,
        F: Fn(&str) -> MetricVector,
    {
        let mut acc = CorpusAccumulator::new();
        let ids = self.spec.sample_ids();
        let total = ids.len();

        for (i, id) in ids.iter().enumerate() {
            let Some(sample) = self.load_sample(loader, id, &mut acc)? else {
                continue;
            };

            tracing::info!("[{}/{}] Evaluating {}", i + 1, total, id);

            let model_guided = metric_fn(sample.text(Variant::ModelGuided));
            let direct = metric_fn(sample.text(Variant::Direct));
            acc.add_sample(id, model_guided, direct)?;
        }

        acc.finish(PassKind::Metrics, self.spec.len(), 1, None)
    }

    /// @ai:intent Judge both variants of every sample `repetitions` times and average
    ///            Calls run `concurrency` at a time; results are reduced per sample
    ///            after all calls finish
    /// @ai:pre repetitions >= 1
    /// @ai:effects fs:read, network
    pub async fn run_judge_pass<L, J>(
        &self,
        loader: &L,
        judge: &J,
        repetitions: u32,
        concurrency: usize,
        model: Option<String>,
    ) -> Result<CorpusReport>
    where
        L: SampleLoader + ?Sized,
        J: StoryJudge,
    {
        if repetitions == 0 {
            return Err(BenchError::protocol("judge repetitions must be at least 1"));
        }

        let mut acc = CorpusAccumulator::new();
        let mut samples = Vec::new();
        for id in self.spec.sample_ids() {
            if let Some(sample) = self.load_sample(loader, &id, &mut acc)? {
                samples.push(sample);
            }
        }

        let total_calls = samples.len() * Variant::ALL.len() * repetitions as usize;
        tracing::info!(
            "Judging {} samples x {} variants x {} repetitions ({} calls, {} concurrent)",
            samples.len(),
            Variant::ALL.len(),
            repetitions,
            total_calls,
            concurrency.max(1)
        );

        let tasks = samples.iter().enumerate().flat_map(|(index, sample)| {
            Variant::ALL.into_iter().flat_map(move |variant| {
                (0..repetitions).map(move |repetition| (index, sample, variant, repetition))
            })
        });

        let calls: Vec<JudgeCall> = stream::iter(tasks.map(|(index, sample, variant, repetition)| async move {
            let scores = judge
                .score(sample.text(variant))
                .await
                .and_then(|scores| check_length(scores, JUDGE_CRITERIA.len()))
                .map_err(|e| e.aborted_at(sample.id.to_string(), variant.as_str()))?;

            tracing::debug!("{} ({}) rep {}: {:?}", sample.id, variant, repetition, scores);

            Ok::<_, BenchError>(JudgeCall {
                sample: index,
                variant,
                repetition,
                scores,
            })
        }))
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;

        let mut grouped: HashMap<(usize, Variant), Vec<(u32, Vec<f64>)>> = HashMap::new();
        for call in calls {
            grouped
                .entry((call.sample, call.variant))
                .or_default()
                .push((call.repetition, call.scores));
        }

        for (index, sample) in samples.iter().enumerate() {
            let model_guided = reduce_repetitions(&mut grouped, index, sample, Variant::ModelGuided)?;
            let direct = reduce_repetitions(&mut grouped, index, sample, Variant::Direct)?;

            tracing::info!("Finished {}", sample.id);
            acc.add_sample(&sample.id, model_guided, direct)?;
        }

        acc.finish(PassKind::Judge, self.spec.len(), repetitions, model)
    }
}

fn check_length(scores: Vec<f64>, expected_len: usize) -> Result<Vec<f64>> {
    if scores.len() == expected_len {
        Ok(scores)
    } else {
        Err(BenchError::protocol(format!(
            "expected {} scores, got {}",
            expected_len,
            scores.len()
        )))
    }
}

/// @ai:intent Average one sample/variant's repetitions in repetition order
/// @ai:effects state:write
fn reduce_repetitions(
    grouped: &mut HashMap<(usize, Variant), Vec<(u32, Vec<f64>)>>,
    index: usize,
    sample: &StorySample,
    variant: Variant,
) -> Result<MetricVector> {
    let mut reps = grouped.remove(&(index, variant)).unwrap_or_default();
    reps.sort_by_key(|(repetition, _)| *repetition);

    let scores: Vec<Vec<f64>> = reps.into_iter().map(|(_, scores)| scores).collect();

    average_repetitions(&scores, JUDGE_CRITERIA.len())
        .and_then(|avg| MetricVector::from_scores(&JUDGE_CRITERIA, &avg))
        .map_err(|e| e.aborted_at(sample.id.to_string(), variant.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::InMemoryLoader;
    use crate::evaluator::MockJudge;
    use crate::metrics::types::DISTINCT_1;
    use pretty_assertions::assert_eq;

    fn corpus(categories: &[&str], per_category: u32) -> CorpusSpec {
        CorpusSpec::new(categories.iter().map(|c| c.to_string()).collect(), per_category)
    }

    fn loader_for(spec: &CorpusSpec) -> InMemoryLoader {
        let mut loader = InMemoryLoader::new();
        for id in spec.sample_ids() {
            let guided = format!("guided {}", id);
            let direct = format!("direct {}", id);
            loader.insert(StorySample::new(id, guided, direct));
        }
        loader
    }

    #[test]
    fn test_average_repetitions_scenario() {
        let reps = vec![
            vec![8.0, 7.0, 9.0, 6.0],
            vec![6.0, 7.0, 7.0, 6.0],
            vec![7.0, 7.0, 8.0, 6.0],
        ];
        assert_eq!(average_repetitions(&reps, 4).unwrap(), vec![7.0, 7.0, 8.0, 6.0]);
    }

    #[test]
    fn test_average_repetitions_rejects_short_vector() {
        let reps = vec![vec![8.0, 7.0, 9.0, 6.0], vec![6.0, 7.0]];
        assert!(matches!(
            average_repetitions(&reps, 4),
            Err(BenchError::JudgeProtocol { .. })
        ));
        assert!(average_repetitions(&[], 4).is_err());
    }

    #[test]
    fn test_metric_pass_averages_two_samples() {
        let spec = corpus(&["drone"], 2);
        let loader = InMemoryLoader::new()
            .with_sample(StorySample::new(SampleId::new("drone", 0), "first", "x"))
            .with_sample(StorySample::new(SampleId::new("drone", 1), "second", "x"));

        let aggregator = CorpusAggregator::new(spec, FailurePolicy::Abort);
        let report = aggregator
            .run_metric_pass(&loader, |text| {
                let value = if text == "first" { 1.0 } else { 0.5 };
                MetricVector::new().with(DISTINCT_1, value)
            })
            .unwrap();

        let guided = report.averages_for(Variant::ModelGuided).unwrap();
        assert_eq!(guided.get(DISTINCT_1), Some(0.75));
        assert_eq!(report.samples_counted, 2);
        assert!(report.is_complete());
    }

    #[test]
    fn test_metric_pass_identical_samples_average_to_value() {
        let spec = corpus(&["drone", "earphone", "smartphone"], 10);
        let loader = loader_for(&spec);
        let aggregator = CorpusAggregator::new(spec, FailurePolicy::Abort);

        let report = aggregator
            .run_metric_pass(&loader, |_| MetricVector::new().with("score", 4.25))
            .unwrap();

        assert_eq!(report.samples_counted, 30);
        for variant in Variant::ALL {
            assert_eq!(report.averages_for(variant).unwrap().get("score"), Some(4.25));
        }
        assert_eq!(report.delta.get("score"), Some(0.0));
        assert_eq!(report.samples.len(), 60);
    }

    #[test]
    fn test_metric_pass_keeps_variants_apart() {
        let spec = corpus(&["drone"], 3);
        let loader = loader_for(&spec);
        let aggregator = CorpusAggregator::new(spec, FailurePolicy::Abort);

        let report = aggregator
            .run_metric_pass(&loader, |text| {
                let value = if text.starts_with("guided") { 2.0 } else { 1.0 };
                MetricVector::new().with("score", value)
            })
            .unwrap();

        assert_eq!(report.averages_for(Variant::ModelGuided).unwrap().get("score"), Some(2.0));
        assert_eq!(report.averages_for(Variant::Direct).unwrap().get("score"), Some(1.0));
        assert_eq!(report.delta.get("score"), Some(1.0));
    }

    #[test]
    fn test_missing_sample_aborts_by_default() {
        let spec = corpus(&["drone"], 3);
        let mut loader = InMemoryLoader::new();
        loader.insert(StorySample::new(SampleId::new("drone", 0), "a", "b"));

        let aggregator = CorpusAggregator::new(spec, FailurePolicy::Abort);
        let err = aggregator
            .run_metric_pass(&loader, |_| MetricVector::new().with("score", 1.0))
            .unwrap_err();

        match err {
            BenchError::Aborted { sample_id, .. } => assert_eq!(sample_id, "drone_1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_skip_policy_adjusts_denominator() {
        let spec = corpus(&["drone"], 4);
        let loader = InMemoryLoader::new()
            .with_sample(StorySample::new(SampleId::new("drone", 0), "a", "b"))
            .with_sample(StorySample::new(SampleId::new("drone", 2), "a", "b"));

        let aggregator = CorpusAggregator::new(spec, FailurePolicy::Skip);
        let report = aggregator
            .run_metric_pass(&loader, |_| MetricVector::new().with("score", 3.0))
            .unwrap();

        assert_eq!(report.expected_samples, 4);
        assert_eq!(report.samples_counted, 2);
        assert_eq!(report.skipped, vec!["drone_1", "drone_3"]);
        assert!(!report.is_complete());
        assert_eq!(report.averages_for(Variant::Direct).unwrap().get("score"), Some(3.0));
    }

    #[test]
    fn test_all_skipped_is_empty_corpus() {
        let aggregator = CorpusAggregator::new(corpus(&["drone"], 2), FailurePolicy::Skip);
        let err = aggregator
            .run_metric_pass(&InMemoryLoader::new(), |_| MetricVector::new())
            .unwrap_err();
        assert!(matches!(err, BenchError::EmptyCorpus));
    }

    #[tokio::test]
    async fn test_judge_pass_constant_judge() {
        let spec = corpus(&["drone", "earphone"], 3);
        let loader = loader_for(&spec);
        let aggregator = CorpusAggregator::new(spec, FailurePolicy::Abort);
        let judge = MockJudge::constant(vec![8.0, 7.0, 9.0, 6.0]);

        let report = aggregator
            .run_judge_pass(&loader, &judge, 3, 4, Some("stub".to_string()))
            .await
            .unwrap();

        assert_eq!(judge.calls(), 6 * 2 * 3);
        assert_eq!(report.repetitions, 3);
        for variant in Variant::ALL {
            let averages = report.averages_for(variant).unwrap();
            assert_eq!(averages.names(), JUDGE_CRITERIA.to_vec());
            assert_eq!(averages.get("fluency"), Some(8.0));
            assert_eq!(averages.get("creativity"), Some(7.0));
            assert_eq!(averages.get("attractiveness"), Some(9.0));
            assert_eq!(averages.get("plausibility"), Some(6.0));
        }
    }

    #[tokio::test]
    async fn test_judge_pass_averages_repetitions_per_sample() {
        let spec = corpus(&["drone"], 1);
        let loader = loader_for(&spec);
        let aggregator = CorpusAggregator::new(spec, FailurePolicy::Abort);
        let judge = MockJudge::new(vec![
            vec![8.0, 7.0, 9.0, 6.0],
            vec![6.0, 7.0, 7.0, 6.0],
            vec![7.0, 7.0, 8.0, 6.0],
        ]);

        // Sequential calls: guided gets reps 0,1,2 -> all three scripted vectors;
        // direct gets the same cycle again.
        let report = aggregator
            .run_judge_pass(&loader, &judge, 3, 1, None)
            .await
            .unwrap();

        let expected = MetricVector::from_scores(&JUDGE_CRITERIA, &[7.0, 7.0, 8.0, 6.0]).unwrap();
        assert_eq!(report.averages_for(Variant::ModelGuided), Some(&expected));
        assert_eq!(report.averages_for(Variant::Direct), Some(&expected));
    }

    #[tokio::test]
    async fn test_judge_pass_wrong_length_aborts() {
        let spec = corpus(&["drone"], 2);
        let loader = loader_for(&spec);
        let aggregator = CorpusAggregator::new(spec, FailurePolicy::Skip);
        let judge = MockJudge::constant(vec![8.0, 7.0, 9.0]);

        let err = aggregator
            .run_judge_pass(&loader, &judge, 3, 2, None)
            .await
            .unwrap_err();

        match err {
            BenchError::Aborted { source, .. } => {
                assert!(matches!(*source, BenchError::JudgeProtocol { .. }))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_judge_pass_zero_repetitions_rejected() {
        let spec = corpus(&["drone"], 1);
        let loader = loader_for(&spec);
        let aggregator = CorpusAggregator::new(spec, FailurePolicy::Abort);
        let judge = MockJudge::constant(vec![1.0; 4]);

        assert!(aggregator.run_judge_pass(&loader, &judge, 0, 1, None).await.is_err());
        assert_eq!(judge.calls(), 0);
    }

    #[test]
    fn test_metric_pass_rejects_changing_shape() {
        let spec = corpus(&["drone"], 2);
        let loader = InMemoryLoader::new()
            .with_sample(StorySample::new(SampleId::new("drone", 0), "first", "first"))
            .with_sample(StorySample::new(SampleId::new("drone", 1), "second", "second"));

        let aggregator = CorpusAggregator::new(spec, FailurePolicy::Skip);
        let err = aggregator
            .run_metric_pass(&loader, |text| {
                let name = if text == "first" { DISTINCT_1 } else { "other" };
                MetricVector::new().with(name, 1.0)
            })
            .unwrap_err();

        match err {
            BenchError::Aborted {
                sample_id,
                variant,
                source,
            } => {
                assert_eq!(sample_id, "drone_1");
                assert_eq!(variant, "model_guided");
                assert!(matches!(*source, BenchError::ShapeMismatch { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_accumulator_rejects_variant_shape_mismatch() {
        let mut acc = CorpusAccumulator::new();
        let id = SampleId::new("drone", 0);

        let err = acc
            .add_sample(
                &id,
                MetricVector::new().with("a", 1.0).with("b", 2.0),
                MetricVector::new().with("b", 2.0).with("a", 1.0),
            )
            .unwrap_err();

        assert!(err.to_string().contains("direct"));
        assert_eq!(acc.samples_counted(), 0);

        acc.add_sample(
            &id,
            MetricVector::new().with("a", 1.0).with("b", 2.0),
            MetricVector::new().with("a", 3.0).with("b", 4.0),
        )
        .unwrap();
        assert_eq!(acc.samples_counted(), 1);
    }

    #[tokio::test]
    async fn test_judge_transport_failure_aborts_with_sample_and_variant() {
        use crate::evaluator::LlmJudge;
        use crate::runner::client::FailingChatClient;
        use crate::runner::RetryPolicy;
        use std::sync::Arc;
        use std::time::Duration;

        let spec = corpus(&["drone"], 2);
        let loader = loader_for(&spec);
        let aggregator = CorpusAggregator::new(spec, FailurePolicy::Skip);
        let client = Arc::new(FailingChatClient::timing_out());
        let retry = RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(1),
            jitter: false,
        };
        let judge = LlmJudge::new(client.clone(), retry);

        let err = aggregator
            .run_judge_pass(&loader, &judge, 2, 1, Some("stub".to_string()))
            .await
            .unwrap_err();

        match err {
            BenchError::Aborted {
                sample_id,
                variant,
                source,
            } => {
                assert_eq!(sample_id, "drone_0");
                assert_eq!(variant, "model_guided");
                assert!(matches!(*source, BenchError::JudgeTransport { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(client.calls(), 2);
    }
}
