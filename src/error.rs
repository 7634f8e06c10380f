//! Error types for the benchmarking and classification pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Raised by an executor when the backend rejects a model/tensor combination.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("execution failed: {reason}")]
pub struct ExecutionError {
    pub reason: String,
}

impl ExecutionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Input shape does not match what the model expects
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::new(format!(
            "input shape {:?} incompatible with expected {:?}",
            actual, expected
        ))
    }
}

/// Raised by an engine when an artifact cannot be loaded or bound to an executor.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to load model '{model}': {reason}")]
pub struct ModelLoadError {
    pub model: String,
    pub reason: String,
}

impl ModelLoadError {
    pub fn new(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            reason: reason.into(),
        }
    }
}

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum BenchError {
    /// No filesystem override and no bundled asset for the requested model
    #[error("could not find model '{name}' in the data directory or bundled assets")]
    ModelNotFound { name: String },

    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    /// Execution failure outside the timing collector (classification path)
    #[error("model '{model}' failed: {source}")]
    Execution {
        model: String,
        #[source]
        source: ExecutionError,
    },

    /// Source image could not be read
    #[error("image unavailable: {0}")]
    TextureUnavailable(String),

    #[error("failed to write stats to '{path}': {source}")]
    StatsWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BenchError {
    pub fn model_not_found(name: impl Into<String>) -> Self {
        BenchError::ModelNotFound { name: name.into() }
    }
}

/// Convenience result type for pipeline operations
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found_message() {
        let err = BenchError::model_not_found("Ghost");
        assert!(err.to_string().contains("'Ghost'"));
    }

    #[test]
    fn test_shape_mismatch_mentions_both_shapes() {
        let err = ExecutionError::shape_mismatch(&[1, 3, 224, 224], &[1, 224, 224, 3]);
        assert!(err.reason.contains("[1, 224, 224, 3]"));
        assert!(err.reason.contains("[1, 3, 224, 224]"));
    }

    #[test]
    fn test_load_error_converts() {
        let err: BenchError = ModelLoadError::new("AirNet", "truncated file").into();
        assert!(matches!(err, BenchError::ModelLoad(_)));
        assert!(err.to_string().contains("truncated file"));
    }
}
