//! Inference engine seam.
//!
//! The pipeline only needs to load an artifact, bind it to an executor on a
//! chosen backend, and run forward passes. Release is tied to `Drop`: an
//! executor owns its loaded model, and outputs are plain owned buffers.

use crate::error::{ExecutionError, ModelLoadError};
use crate::models::resolver::ModelSource;
use crate::preprocess::Tensor;
use serde::Deserialize;

/// Execution backend requested when creating an executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Plain CPU kernels. Required for benchmarking on emulated devices.
    #[default]
    Cpu,
    /// GPU or other accelerator when the engine has one, CPU otherwise
    Accelerated,
}

/// An inference engine capable of loading models and creating executors
pub trait InferenceEngine {
    /// Opaque loaded-model handle
    type Model;
    type Executor: Executor;

    fn load(&self, source: &ModelSource) -> Result<Self::Model, ModelLoadError>;

    /// Bind a loaded model to a new executor. The executor takes ownership of the model.
    fn create_executor(
        &self,
        model: Self::Model,
        backend: Backend,
    ) -> Result<Self::Executor, ModelLoadError>;
}

/// A stateful executor bound to one loaded model
pub trait Executor {
    /// Run one forward pass and return the primary output.
    ///
    /// Blocks until every output value is materialized.
    fn execute(&mut self, input: &Tensor) -> Result<Vec<f32>, ExecutionError>;
}

impl<X: Executor + ?Sized> Executor for Box<X> {
    fn execute(&mut self, input: &Tensor) -> Result<Vec<f32>, ExecutionError> {
        (**self).execute(input)
    }
}
