//! @ai:module:intent JSON record loader for story samples
//! @ai:module:layer infrastructure
//! @ai:module:public_api SampleLoader, JsonSampleLoader, InMemoryLoader, discover_sample_files
//! @ai:module:stateless true

use crate::corpus::sample::{SampleId, StorySample, Variant};
use crate::error::{BenchError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent Trait for locating and loading one corpus entry
pub trait SampleLoader: Send + Sync {
    /// @ai:intent Load the sample with the given id
    fn load(&self, id: &SampleId) -> Result<StorySample>;
}

/// One element of a sample record. Extra fields written by the generator are ignored.
#[derive(Debug, Deserialize)]
struct StoryRecord {
    story: String,
}

/// @ai:intent Loads `{dir}/{category}_{index}.json` records
/// @ai:effects fs:read
#[derive(Debug, Clone)]
pub struct JsonSampleLoader {
    dir: PathBuf,
}

impl JsonSampleLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// @ai:intent Path of the record for a sample
    /// @ai:effects pure
    pub fn path_for(&self, id: &SampleId) -> PathBuf {
        self.dir.join(id.file_name())
    }

    /// @ai:intent Parse a record body into a sample
    /// @ai:pre content is the full text of one record file
    /// @ai:effects pure
    pub fn parse_record(id: &SampleId, content: &str) -> Result<StorySample> {
        let records: Vec<StoryRecord> = serde_json::from_str(content)
            .map_err(|e| BenchError::malformed(id.to_string(), format!("invalid record: {}", e)))?;

        if records.len() != Variant::ALL.len() {
            return Err(BenchError::malformed(
                id.to_string(),
                format!("expected 2 story variants, found {}", records.len()),
            ));
        }

        let mut stories = records.into_iter().map(|r| r.story);
        let model_guided = stories.next().unwrap_or_default();
        let direct = stories.next().unwrap_or_default();

        Ok(StorySample::new(id.clone(), model_guided, direct))
    }
}

impl SampleLoader for JsonSampleLoader {
    /// @ai:intent Read and parse one record file
    /// @ai:effects fs:read
    fn load(&self, id: &SampleId) -> Result<StorySample> {
        let path = self.path_for(id);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            BenchError::malformed(
                id.to_string(),
                format!("failed to read {}: {}", path.display(), e),
            )
        })?;

        Self::parse_record(id, &content)
    }
}

/// @ai:intent Serves samples from memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    samples: HashMap<SampleId, StorySample>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sample: StorySample) {
        self.samples.insert(sample.id.clone(), sample);
    }

    pub fn with_sample(mut self, sample: StorySample) -> Self {
        self.insert(sample);
        self
    }
}

impl SampleLoader for InMemoryLoader {
    fn load(&self, id: &SampleId) -> Result<StorySample> {
        self.samples
            .get(id)
            .cloned()
            .ok_or_else(|| BenchError::malformed(id.to_string(), "sample not found"))
    }
}

/// @ai:intent Find every JSON record below a directory, sorted
/// @ai:effects fs:read
pub fn discover_sample_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "json")
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    files.sort();
    files
}
