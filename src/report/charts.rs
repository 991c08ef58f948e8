//! @ai:module:intent Chart generation for corpus reports
//! @ai:module:layer infrastructure
//! @ai:module:public_api ChartGenerator
//! @ai:module:stateless true

use crate::corpus::Variant;
use crate::metrics::CorpusReport;
use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;

const BAR_WIDTH: f64 = 0.35;

/// @ai:intent Trait for chart generation
pub trait ChartGeneratorTrait: Send + Sync {
    /// @ai:intent Generate all charts from a report
    fn generate_all(&self, report: &CorpusReport, output_dir: &Path) -> Result<Vec<String>>;
}

/// @ai:intent One metric's averages for both variants; non-finite values are `None`
#[derive(Debug, Clone, PartialEq)]
pub struct BarGroup {
    pub metric: String,
    pub model_guided: Option<f64>,
    pub direct: Option<f64>,
}

/// @ai:intent Collect chartable averages, one group per metric
/// @ai:effects pure
pub fn bar_groups(report: &CorpusReport) -> Vec<BarGroup> {
    let Some(guided) = report.averages_for(Variant::ModelGuided) else {
        return Vec::new();
    };
    let direct = report.averages_for(Variant::Direct);

    guided
        .iter()
        .map(|(name, value)| BarGroup {
            metric: name.to_string(),
            model_guided: Some(value).filter(|v| v.is_finite()),
            direct: direct
                .and_then(|d| d.get(name))
                .filter(|v| v.is_finite()),
        })
        .collect()
}

/// @ai:intent Y range covering every finite bar and the zero baseline
/// @ai:post start < end
/// @ai:effects pure
pub fn value_range(groups: &[BarGroup]) -> (f64, f64) {
    let values = groups
        .iter()
        .flat_map(|g| [g.model_guided, g.direct])
        .flatten();

    let (min, max) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = ((max - min) * 0.1).max(0.1);
    (min - if min < 0.0 { pad } else { 0.0 }, max + pad)
}

/// @ai:intent Generates charts from corpus reports
pub struct ChartGenerator;

impl ChartGenerator {
    /// @ai:intent Create a new chart generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Grouped bar chart of variant averages per metric
    /// @ai:effects fs:write
    fn generate_averages_chart(&self, report: &CorpusReport, output_path: &Path) -> Result<()> {
        let groups = bar_groups(report);
        let (y_min, y_max) = value_range(&groups);

        let root = BitMapBackend::new(output_path, (900, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Model-guided vs Direct ({} pass)", report.kind.as_str()),
                ("sans-serif", 28),
            )
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..groups.len().max(1) as f64, y_min..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(groups.len() * 2 + 1)
            .y_desc("Average")
            .x_desc("Metric")
            .x_label_formatter(&|x| {
                let index = x.floor() as usize;
                if (x - index as f64 - 0.5).abs() < 1e-6 {
                    groups
                        .get(index)
                        .map(|g| g.metric.clone())
                        .unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .draw()?;

        chart
            .draw_series(groups.iter().enumerate().filter_map(|(i, g)| {
                let left = i as f64 + 0.5 - BAR_WIDTH;
                g.model_guided.map(|v| {
                    Rectangle::new([(left, 0.0), (left + BAR_WIDTH, v)], BLUE.mix(0.7).filled())
                })
            }))?
            .label(Variant::ModelGuided.display_name())
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], BLUE.mix(0.7).filled()));

        chart
            .draw_series(groups.iter().enumerate().filter_map(|(i, g)| {
                let left = i as f64 + 0.5;
                g.direct.map(|v| {
                    Rectangle::new([(left, 0.0), (left + BAR_WIDTH, v)], GREEN.mix(0.7).filled())
                })
            }))?
            .label(Variant::Direct.display_name())
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], GREEN.mix(0.7).filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

impl Default for ChartGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartGeneratorTrait for ChartGenerator {
    /// @ai:intent Generate all charts
    /// @ai:effects fs:write
    fn generate_all(&self, report: &CorpusReport, output_dir: &Path) -> Result<Vec<String>> {
        std::fs::create_dir_all(output_dir)?;

        let mut generated = Vec::new();

        let averages_path = output_dir.join("averages.png");
        self.generate_averages_chart(report, &averages_path)?;
        generated.push("averages.png".to_string());

        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::metrics_report;

    #[test]
    fn test_bar_groups_drop_non_finite_values() {
        let groups = bar_groups(&metrics_report());
        assert_eq!(groups.len(), 4);

        let perplexity = groups
            .iter()
            .find(|g| g.metric == "perplexity_proxy")
            .unwrap();
        assert_eq!(perplexity.model_guided, Some(14.2));
        assert_eq!(perplexity.direct, None);
    }

    #[test]
    fn test_value_range_covers_bars() {
        let groups = bar_groups(&metrics_report());
        let (lo, hi) = value_range(&groups);
        assert_eq!(lo, 0.0);
        assert!(hi > 14.2);
    }

    #[test]
    fn test_value_range_handles_negative_and_empty() {
        let groups = vec![BarGroup {
            metric: "readability_grade".to_string(),
            model_guided: Some(-2.0),
            direct: Some(3.0),
        }];
        let (lo, hi) = value_range(&groups);
        assert!(lo < -2.0);
        assert!(hi > 3.0);

        let (lo, hi) = value_range(&[]);
        assert!(lo < hi);
    }
}
