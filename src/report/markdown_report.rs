//! @ai:module:intent Markdown report generation
//! @ai:module:layer infrastructure
//! @ai:module:public_api MarkdownReporter
//! @ai:module:stateless true

use crate::corpus::Variant;
use crate::metrics::{CorpusReport, MetricVector};
use anyhow::Result;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// @ai:intent Trait for Markdown report generation
pub trait MarkdownReporterTrait: Send + Sync {
    /// @ai:intent Generate Markdown report from a corpus report
    fn generate(&self, report: &CorpusReport, output_path: &Path) -> Result<()>;
}

/// @ai:intent Generates Markdown reports from corpus results
pub struct MarkdownReporter;

impl MarkdownReporter {
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Format a metric value; non-finite values print as inf/nan
    /// @ai:effects pure
    pub fn format_value(value: f64) -> String {
        if value.is_finite() {
            format!("{:.4}", value)
        } else {
            value.to_string()
        }
    }

    /// @ai:intent Format a delta value with sign
    /// @ai:effects pure
    fn format_delta(value: f64) -> String {
        if !value.is_finite() {
            value.to_string()
        } else if value >= 0.0 {
            format!("+{:.4}", value)
        } else {
            format!("{:.4}", value)
        }
    }

    /// @ai:intent Header with run metadata and partial-run warning
    /// @ai:effects pure
    fn generate_summary(report: &CorpusReport) -> String {
        let mut output = String::new();

        writeln!(output, "# Story Evaluation Results").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "**Pass:** {}", report.kind.as_str()).unwrap();
        writeln!(output, "**Date:** {}", report.timestamp).unwrap();
        if let Some(model) = &report.model {
            writeln!(output, "**Judge model:** {}", model).unwrap();
        }
        writeln!(output, "**Repetitions:** {}", report.repetitions).unwrap();
        writeln!(
            output,
            "**Samples counted:** {} / {}",
            report.samples_counted, report.expected_samples
        )
        .unwrap();
        writeln!(output).unwrap();

        if !report.is_complete() {
            writeln!(
                output,
                "> **Partial run:** {} sample(s) skipped ({}). Averages divide by {} samples.",
                report.skipped.len(),
                report.skipped.join(", "),
                report.samples_counted
            )
            .unwrap();
            writeln!(output).unwrap();
        }

        output
    }

    /// @ai:intent Averages table, one row per metric
    /// @ai:effects pure
    fn generate_averages_table(report: &CorpusReport) -> String {
        let mut output = String::new();
        let empty = MetricVector::new();
        let guided = report.averages_for(Variant::ModelGuided).unwrap_or(&empty);
        let direct = report.averages_for(Variant::Direct).unwrap_or(&empty);

        writeln!(output, "## Averages").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "| Metric | {} | {} | Delta |",
            Variant::ModelGuided.display_name(),
            Variant::Direct.display_name()
        )
        .unwrap();
        writeln!(output, "|--------|--------------|--------|-------|").unwrap();

        for (name, guided_value) in guided.iter() {
            let direct_value = direct.get(name).unwrap_or(f64::NAN);
            let delta = report.delta.get(name).unwrap_or(f64::NAN);

            writeln!(
                output,
                "| {} | {} | {} | {} |",
                name,
                Self::format_value(guided_value),
                Self::format_value(direct_value),
                Self::format_delta(delta)
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    /// @ai:intent Per-sample table listing the values behind the averages
    /// @ai:effects pure
    fn generate_sample_section(report: &CorpusReport) -> String {
        let mut output = String::new();
        let Some(first) = report.samples.first() else {
            return output;
        };
        let names = first.metrics.names();

        writeln!(output, "## Per-sample Results").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Sample | Variant | {} |", names.join(" | ")).unwrap();
        writeln!(output, "|--------|---------|{}", "------|".repeat(names.len())).unwrap();

        for sample in &report.samples {
            let values: Vec<String> = names
                .iter()
                .map(|name| Self::format_value(sample.metrics.get(name).unwrap_or(f64::NAN)))
                .collect();

            writeln!(
                output,
                "| {} | {} | {} |",
                sample.sample_id,
                sample.variant,
                values.join(" | ")
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownReporterTrait for MarkdownReporter {
    /// @ai:effects fs:write
    fn generate(&self, report: &CorpusReport, output_path: &Path) -> Result<()> {
        let mut content = String::new();

        content.push_str(&Self::generate_summary(report));
        content.push_str(&Self::generate_averages_table(report));
        content.push_str(&Self::generate_sample_section(report));

        std::fs::write(output_path, content)?;
        Ok(())
    }
}
