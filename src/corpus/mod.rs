//! @ai:module:intent Story corpus definitions and loading
//! @ai:module:layer domain
//! @ai:module:public_api StorySample, SampleId, Variant, CorpusSpec, SampleLoader, JsonSampleLoader, InMemoryLoader

pub mod loader;
pub mod sample;

pub use loader::{discover_sample_files, InMemoryLoader, JsonSampleLoader, SampleLoader};
pub use sample::{CorpusSpec, SampleId, StorySample, Variant};
