//! @ai:module:intent Story sample records and corpus enumeration
//! @ai:module:layer domain
//! @ai:module:public_api StorySample, SampleId, Variant, CorpusSpec
//! @ai:module:stateless true

use crate::config::CorpusConfig;
use serde::{Deserialize, Serialize};

/// @ai:intent Which of the two generated stories in a sample record
/// @ai:effects pure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Element 0 of the record: story generated through the guided pipeline.
    ModelGuided,
    /// Element 1 of the record: story generated by a direct prompt.
    Direct,
}

impl Variant {
    /// Iteration order used everywhere a report lists variants.
    pub const ALL: [Variant; 2] = [Variant::ModelGuided, Variant::Direct];

    /// @ai:intent Convert variant to its report label
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::ModelGuided => "model_guided",
            Variant::Direct => "direct",
        }
    }

    /// @ai:intent Human-readable name for console output
    /// @ai:effects pure
    pub fn display_name(&self) -> &'static str {
        match self {
            Variant::ModelGuided => "Model-guided",
            Variant::Direct => "Direct",
        }
    }

    /// @ai:intent Position of this variant inside a sample record
    /// @ai:effects pure
    pub fn record_index(&self) -> usize {
        match self {
            Variant::ModelGuided => 0,
            Variant::Direct => 1,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Identifier of one corpus entry, e.g. `drone_3`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SampleId {
    pub category: String,
    pub index: u32,
}

impl SampleId {
    pub fn new(category: impl Into<String>, index: u32) -> Self {
        Self {
            category: category.into(),
            index,
        }
    }

    /// @ai:intent File name of the record for this sample
    /// @ai:effects pure
    pub fn file_name(&self) -> String {
        format!("{}.json", self)
    }
}

impl std::fmt::Display for SampleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.category, self.index)
    }
}

/// @ai:intent One corpus entry holding both story variants
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorySample {
    pub id: SampleId,
    pub model_guided: String,
    pub direct: String,
}

impl StorySample {
    pub fn new(id: SampleId, model_guided: impl Into<String>, direct: impl Into<String>) -> Self {
        Self {
            id,
            model_guided: model_guided.into(),
            direct: direct.into(),
        }
    }

    /// @ai:intent Story text for a variant
    /// @ai:effects pure
    pub fn text(&self, variant: Variant) -> &str {
        match variant {
            Variant::ModelGuided => &self.model_guided,
            Variant::Direct => &self.direct,
        }
    }
}

/// @ai:intent Fixed enumeration of categories crossed with sample indices
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSpec {
    pub categories: Vec<String>,
    pub samples_per_category: u32,
}

impl CorpusSpec {
    pub fn new(categories: Vec<String>, samples_per_category: u32) -> Self {
        Self {
            categories,
            samples_per_category,
        }
    }

    /// @ai:intent Every sample id in category-major order
    /// @ai:effects pure
    pub fn sample_ids(&self) -> Vec<SampleId> {
        self.categories
            .iter()
            .flat_map(|category| {
                (0..self.samples_per_category).map(move |index| SampleId::new(category.clone(), index))
            })
            .collect()
    }

    /// Number of samples a complete run counts.
    pub fn len(&self) -> usize {
        self.categories.len() * self.samples_per_category as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&CorpusConfig> for CorpusSpec {
    fn from(config: &CorpusConfig) -> Self {
        CorpusSpec::new(config.categories.clone(), config.samples_per_category)
    }
}
