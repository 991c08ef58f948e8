//! @ai:module:intent JSON report generation
//! @ai:module:layer infrastructure
//! @ai:module:public_api JsonReporter
//! @ai:module:stateless true

use crate::metrics::CorpusReport;
use anyhow::{Context, Result};
use std::path::Path;

/// @ai:intent Trait for JSON report generation
pub trait JsonReporterTrait: Send + Sync {
    /// @ai:intent Write a report as pretty JSON
    fn generate(&self, report: &CorpusReport, output_path: &Path) -> Result<()>;
}

/// @ai:intent Generates and reads back JSON reports
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Load a report previously written by `generate`
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<CorpusReport> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read results file: {}", path.display()))?;
        let report = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse results file: {}", path.display()))?;
        Ok(report)
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporterTrait for JsonReporter {
    /// @ai:effects fs:write
    fn generate(&self, report: &CorpusReport, output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(output_path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Variant;
    use crate::report::fixtures::metrics_report;
    use tempfile::TempDir;

    #[test]
    fn test_written_report_loads_back() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("results.json");
        let report = metrics_report();

        JsonReporter::new().generate(&report, &output).unwrap();
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("\"samples_counted\": 1"));
        assert!(content.contains("\"inf\""));

        let loaded = JsonReporter::load(&output).unwrap();
        assert_eq!(loaded.skipped, vec!["drone_1"]);
        assert_eq!(
            loaded.averages_for(Variant::Direct).unwrap().get("perplexity_proxy"),
            Some(f64::INFINITY)
        );
    }
}
