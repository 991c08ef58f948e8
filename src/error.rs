//! @ai:module:intent Error taxonomy for corpus evaluation runs
//! @ai:module:layer domain
//! @ai:module:public_api BenchError, Result
//! @ai:module:stateless true

use thiserror::Error;

/// @ai:intent Unified error type for metric and judge passes
#[derive(Error, Debug)]
pub enum BenchError {
    /// A corpus entry could not be turned into two story-variant strings.
    #[error("Malformed sample {sample_id}: {reason}")]
    MalformedSample { sample_id: String, reason: String },

    /// The judge answered, but the answer violates the score-vector contract.
    #[error("Judge protocol violation: {reason}")]
    JudgeProtocol { reason: String },

    /// The judge could not be reached, even after retries.
    #[error("Judge transport failure: {reason}")]
    JudgeTransport { reason: String },

    /// A metric vector's names differ from the first vector the run accumulated.
    #[error("Metric shape mismatch: expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("No samples were counted; averages are undefined")]
    EmptyCorpus,

    #[error("Run aborted at sample {sample_id} ({variant}): {source}")]
    Aborted {
        sample_id: String,
        variant: String,
        #[source]
        source: Box<BenchError>,
    },
}

impl BenchError {
    /// @ai:intent Build a malformed-sample error
    /// @ai:effects pure
    pub fn malformed(sample_id: impl Into<String>, reason: impl Into<String>) -> Self {
        BenchError::MalformedSample {
            sample_id: sample_id.into(),
            reason: reason.into(),
        }
    }

    /// @ai:intent Build a judge-protocol error
    /// @ai:effects pure
    pub fn protocol(reason: impl Into<String>) -> Self {
        BenchError::JudgeProtocol {
            reason: reason.into(),
        }
    }

    /// @ai:intent Attach the sample and variant that caused a fatal error
    /// @ai:effects pure
    pub fn aborted_at(self, sample_id: impl Into<String>, variant: impl Into<String>) -> Self {
        BenchError::Aborted {
            sample_id: sample_id.into(),
            variant: variant.into(),
            source: Box::new(self),
        }
    }

    pub fn is_malformed_sample(&self) -> bool {
        matches!(self, BenchError::MalformedSample { .. })
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
