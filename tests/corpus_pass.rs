//! End-to-end passes over an on-disk corpus through the public API.

use pretty_assertions::assert_eq;
use std::path::Path;
use story_bench::config::FailurePolicy;
use story_bench::corpus::{CorpusSpec, JsonSampleLoader, Variant};
use story_bench::evaluator::{MockJudge, TextEvaluator};
use story_bench::metrics::{CorpusAggregator, PassKind};
use story_bench::report::{JsonReporter, ReportGenerator};
use story_bench::BenchError;
use tempfile::TempDir;

const GUIDED_0: &str = "The drone lifted off the roof at dawn and carried a basket of warm bread \
    across the river. Children ran beside its shadow and laughed.";
const DIRECT_0: &str = "A drone flew over the town. It was fast and it was quiet and it was new.";
const GUIDED_1: &str = "Her new earphones could translate birdsong. By noon she knew that the \
    sparrows on the fence had been arguing about crumbs for years.";
const DIRECT_1: &str = "He bought earphones. The sound was clear. He listened to music all day \
    on the long train home.";

fn write_record(dir: &Path, name: &str, model_guided: &str, direct: &str) {
    let record = serde_json::json!([
        { "story": model_guided, "prompt": "ignored" },
        { "story": direct }
    ]);
    std::fs::write(dir.join(name), record.to_string()).unwrap();
}

fn corpus_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_record(temp.path(), "drone_0.json", GUIDED_0, DIRECT_0);
    write_record(temp.path(), "earphone_0.json", GUIDED_1, DIRECT_1);
    temp
}

fn spec() -> CorpusSpec {
    CorpusSpec::new(vec!["drone".to_string(), "earphone".to_string()], 1)
}

#[test]
fn metric_pass_over_disk_corpus_matches_direct_evaluation() {
    let temp = corpus_dir();
    let loader = JsonSampleLoader::new(temp.path());
    let evaluator = TextEvaluator::new();

    let report = CorpusAggregator::new(spec(), FailurePolicy::Abort)
        .run_metric_pass(&loader, |text| evaluator.evaluate(text))
        .unwrap();

    assert_eq!(report.kind, PassKind::Metrics);
    assert_eq!(report.samples_counted, 2);
    assert!(report.is_complete());

    let first = evaluator.evaluate(GUIDED_0);
    let second = evaluator.evaluate(GUIDED_1);
    let guided = report.averages_for(Variant::ModelGuided).unwrap();

    for (name, value) in guided.iter() {
        let expected = (first.get(name).unwrap() + second.get(name).unwrap()) / 2.0;
        assert_eq!(value.to_bits(), expected.to_bits(), "{}", name);
    }
    assert_eq!(report.samples.len(), 4);
}

#[tokio::test]
async fn judge_pass_with_stub_judge_averages_scores() {
    let temp = corpus_dir();
    let loader = JsonSampleLoader::new(temp.path());
    let judge = MockJudge::constant(vec![7.0, 8.0, 6.0, 9.0]);

    let report = CorpusAggregator::new(spec(), FailurePolicy::Abort)
        .run_judge_pass(&loader, &judge, 3, 2, Some("stub".to_string()))
        .await
        .unwrap();

    assert_eq!(judge.calls(), 2 * 2 * 3);
    assert_eq!(report.kind, PassKind::Judge);
    assert_eq!(report.repetitions, 3);

    let direct = report.averages_for(Variant::Direct).unwrap();
    assert_eq!(direct.get("fluency"), Some(7.0));
    assert_eq!(direct.get("plausibility"), Some(9.0));
    assert_eq!(report.delta.get("creativity"), Some(0.0));
}

#[test]
fn malformed_record_aborts_by_default_and_is_skipped_on_request() {
    let temp = corpus_dir();
    std::fs::write(temp.path().join("earphone_0.json"), r#"[{"story": "only one"}]"#).unwrap();
    let loader = JsonSampleLoader::new(temp.path());
    let evaluator = TextEvaluator::new();

    let err = CorpusAggregator::new(spec(), FailurePolicy::Abort)
        .run_metric_pass(&loader, |text| evaluator.evaluate(text))
        .unwrap_err();
    match err {
        BenchError::Aborted { sample_id, .. } => assert_eq!(sample_id, "earphone_0"),
        other => panic!("unexpected error: {}", other),
    }

    let report = CorpusAggregator::new(spec(), FailurePolicy::Skip)
        .run_metric_pass(&loader, |text| evaluator.evaluate(text))
        .unwrap();
    assert_eq!(report.samples_counted, 1);
    assert_eq!(report.expected_samples, 2);
    assert_eq!(report.skipped, vec!["earphone_0".to_string()]);
    assert!(!report.is_complete());
}

#[test]
fn reports_round_trip_through_results_json() {
    let temp = corpus_dir();
    let loader = JsonSampleLoader::new(temp.path());
    let evaluator = TextEvaluator::new();
    let report = CorpusAggregator::new(spec(), FailurePolicy::Abort)
        .run_metric_pass(&loader, |text| evaluator.evaluate(text))
        .unwrap();

    let out = TempDir::new().unwrap();
    ReportGenerator::new().generate_all(&report, out.path()).unwrap();

    let loaded = JsonReporter::load(&out.path().join("results.json")).unwrap();
    assert_eq!(loaded.samples_counted, report.samples_counted);
    let original = report.flat();
    let reloaded = loaded.flat();
    assert_eq!(reloaded.keys().collect::<Vec<_>>(), original.keys().collect::<Vec<_>>());
    for (key, value) in &original {
        let back = reloaded[key];
        assert!(back == *value || (back - value).abs() < 1e-12, "{}", key);
    }

    let markdown = std::fs::read_to_string(out.path().join("results.md")).unwrap();
    assert!(markdown.contains("**Samples counted:** 2 / 2"));
}
