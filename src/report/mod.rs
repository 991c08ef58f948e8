//! @ai:module:intent Report generation for corpus evaluation results
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReportGenerator, JsonReporter, MarkdownReporter, ChartGenerator

pub mod charts;
pub mod json_report;
pub mod markdown_report;

pub use charts::{ChartGenerator, ChartGeneratorTrait};
pub use json_report::{JsonReporter, JsonReporterTrait};
pub use markdown_report::{MarkdownReporter, MarkdownReporterTrait};

use crate::metrics::CorpusReport;
use anyhow::Result;
use std::path::Path;

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    json: JsonReporter,
    markdown: MarkdownReporter,
    charts: ChartGenerator,
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self {
            json: JsonReporter::new(),
            markdown: MarkdownReporter::new(),
            charts: ChartGenerator::new(),
        }
    }

    /// @ai:intent Write results.json, results.md and the averages chart
    /// @ai:post chart rendering failures are logged, not returned
    /// @ai:effects fs:write
    pub fn generate_all(&self, report: &CorpusReport, output_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(output_dir)?;

        self.json.generate(report, &output_dir.join("results.json"))?;
        self.markdown
            .generate(report, &output_dir.join("results.md"))?;

        if let Err(e) = self.charts.generate_all(report, output_dir) {
            tracing::warn!("Chart rendering failed: {}", e);
        }

        tracing::info!("Reports generated in {}", output_dir.display());
        Ok(())
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::corpus::Variant;
    use crate::metrics::{CorpusReport, MetricVector, PassKind, SampleResult, VariantAverages};

    pub fn metrics_report() -> CorpusReport {
        let guided = MetricVector::new()
            .with("readability_grade", 6.5)
            .with("distinct_1", 0.72)
            .with("distinct_2", 0.95)
            .with("perplexity_proxy", 14.2);
        let direct = MetricVector::new()
            .with("readability_grade", 5.0)
            .with("distinct_1", 0.64)
            .with("distinct_2", 0.91)
            .with("perplexity_proxy", f64::INFINITY);

        CorpusReport {
            kind: PassKind::Metrics,
            timestamp: "2026-10-15T00:00:00Z".to_string(),
            model: None,
            repetitions: 1,
            expected_samples: 2,
            samples_counted: 1,
            skipped: vec!["drone_1".to_string()],
            delta: guided.minus(&direct),
            averages: vec![
                VariantAverages {
                    variant: Variant::ModelGuided,
                    metrics: guided.clone(),
                },
                VariantAverages {
                    variant: Variant::Direct,
                    metrics: direct.clone(),
                },
            ],
            samples: vec![
                SampleResult {
                    sample_id: "drone_0".to_string(),
                    variant: Variant::ModelGuided,
                    metrics: guided,
                },
                SampleResult {
                    sample_id: "drone_0".to_string(),
                    variant: Variant::Direct,
                    metrics: direct,
                },
            ],
        }
    }
}
