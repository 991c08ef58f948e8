//! @ai:module:intent Metric vectors and corpus report types
//! @ai:module:layer domain
//! @ai:module:public_api MetricVector, MetricEntry, CorpusReport, VariantAverages, SampleResult, PassKind
//! @ai:module:stateless true

use crate::corpus::Variant;
use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const READABILITY_GRADE: &str = "readability_grade";
pub const DISTINCT_1: &str = "distinct_1";
pub const DISTINCT_2: &str = "distinct_2";
pub const PERPLEXITY_PROXY: &str = "perplexity_proxy";

/// Metric names produced by the text evaluator, in report order.
pub const ENGINE_METRICS: [&str; 4] = [READABILITY_GRADE, DISTINCT_1, DISTINCT_2, PERPLEXITY_PROXY];

/// Judge criteria, in the order the judge returns them.
pub const JUDGE_CRITERIA: [&str; 4] = ["fluency", "creativity", "attractiveness", "plausibility"];

/// @ai:intent One named metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub name: String,
    #[serde(with = "float_repr")]
    pub value: f64,
}

/// @ai:intent Fixed-shape, ordered mapping from metric name to value
/// @ai:effects pure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricVector {
    entries: Vec<MetricEntry>,
}

impl MetricVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Build a vector from parallel name and value lists
    /// @ai:pre names.len() == values.len()
    /// @ai:effects pure
    pub fn from_scores(names: &[&str], values: &[f64]) -> Result<Self> {
        if names.len() != values.len() {
            return Err(BenchError::protocol(format!(
                "expected {} scores, got {}",
                names.len(),
                values.len()
            )));
        }

        Ok(Self {
            entries: names
                .iter()
                .zip(values)
                .map(|(name, value)| MetricEntry {
                    name: name.to_string(),
                    value: *value,
                })
                .collect(),
        })
    }

    /// @ai:intent Append a metric, or overwrite it if the name already exists
    /// @ai:effects state:write
    pub fn set(&mut self, name: &str, value: f64) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.value = value,
            None => self.entries.push(MetricEntry {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|e| (e.name.as_str(), e.value))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// @ai:intent Element-wise add another vector, matching by name
    /// @ai:post metrics missing from self are appended in other's order
    /// @ai:effects state:write
    pub fn add_assign(&mut self, other: &MetricVector) {
        for (name, value) in other.iter() {
            match self.entries.iter_mut().find(|e| e.name == name) {
                Some(entry) => entry.value += value,
                None => self.entries.push(MetricEntry {
                    name: name.to_string(),
                    value,
                }),
            }
        }
    }

    /// @ai:intent Divide every value by a denominator
    /// @ai:effects pure
    pub fn divided_by(&self, denominator: f64) -> MetricVector {
        MetricVector {
            entries: self
                .entries
                .iter()
                .map(|e| MetricEntry {
                    name: e.name.clone(),
                    value: e.value / denominator,
                })
                .collect(),
        }
    }

    /// @ai:intent Element-wise `self - other` for metrics present in both
    /// @ai:effects pure
    pub fn minus(&self, other: &MetricVector) -> MetricVector {
        MetricVector {
            entries: self
                .entries
                .iter()
                .filter_map(|e| {
                    other.get(&e.name).map(|o| MetricEntry {
                        name: e.name.clone(),
                        value: e.value - o,
                    })
                })
                .collect(),
        }
    }
}

/// @ai:intent Which pass produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassKind {
    Metrics,
    Judge,
}

impl PassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassKind::Metrics => "metrics",
            PassKind::Judge => "judge",
        }
    }
}

/// @ai:intent Metrics for one variant of one counted sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleResult {
    pub sample_id: String,
    pub variant: Variant,
    pub metrics: MetricVector,
}

/// @ai:intent Corpus-level averages for one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantAverages {
    pub variant: Variant,
    pub metrics: MetricVector,
}

/// @ai:intent Complete result of a metric or judge pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusReport {
    pub kind: PassKind,
    pub timestamp: String,
    /// Judge model, when the pass used one
    #[serde(default)]
    pub model: Option<String>,
    /// Judge repetitions per story; 1 for the metric pass
    pub repetitions: u32,
    pub expected_samples: usize,
    /// Denominator of every average in this report
    pub samples_counted: usize,
    pub skipped: Vec<String>,
    pub averages: Vec<VariantAverages>,
    /// `model_guided - direct`, per metric
    pub delta: MetricVector,
    pub samples: Vec<SampleResult>,
}

impl CorpusReport {
    /// @ai:intent True when every enumerated sample was counted
    /// @ai:effects pure
    pub fn is_complete(&self) -> bool {
        self.samples_counted == self.expected_samples && self.skipped.is_empty()
    }

    pub fn averages_for(&self, variant: Variant) -> Option<&MetricVector> {
        self.averages
            .iter()
            .find(|a| a.variant == variant)
            .map(|a| &a.metrics)
    }

    /// @ai:intent Flatten averages to `variant.metric -> value` for export
    /// @ai:effects pure
    pub fn flat(&self) -> BTreeMap<String, f64> {
        self.averages
            .iter()
            .flat_map(|a| {
                a.metrics
                    .iter()
                    .map(move |(name, value)| (format!("{}.{}", a.variant, name), value))
            })
            .collect()
    }
}

/// Serializes non-finite floats as strings, since JSON has no infinity.
mod float_repr {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if value.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(s) => match s.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(serde::de::Error::custom(format!(
                    "invalid metric value: {}",
                    other
                ))),
            },
        }
    }
}
