//! ONNX Runtime engine

use crate::error::{ExecutionError, ModelLoadError};
use crate::models::engine::{Backend, Executor, InferenceEngine};
use crate::models::resolver::ModelSource;
use crate::preprocess::Tensor;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Model artifact checked for readability but not yet bound to a session
pub struct OnnxModel {
    name: String,
    artifact: Artifact,
}

enum Artifact {
    File(PathBuf),
    Bytes(Arc<[u8]>),
}

/// Engine backed by ONNX Runtime sessions
pub struct OnnxEngine {
    /// Number of intra-op threads per session
    intra_threads: usize,
}

impl OnnxEngine {
    pub fn new() -> Result<Self, ModelLoadError> {
        Self::with_threads(1)
    }

    pub fn with_threads(intra_threads: usize) -> Result<Self, ModelLoadError> {
        ort::init()
            .with_name("edge-nn-bench")
            .commit()
            .map_err(|e| ModelLoadError::new("<runtime>", e.to_string()))?;
        info!(intra_threads, "ONNX Runtime initialized");
        Ok(Self {
            intra_threads: intra_threads.max(1),
        })
    }

    fn build_session(&self, model: &OnnxModel, backend: Backend) -> Result<Session, ort::Error> {
        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.intra_threads)?;

        builder = match backend {
            Backend::Cpu => {
                builder.with_execution_providers([CPUExecutionProvider::default().build()])?
            }
            Backend::Accelerated => builder.with_execution_providers([
                CUDAExecutionProvider::default().build(),
                CPUExecutionProvider::default().build(),
            ])?,
        };

        match &model.artifact {
            Artifact::File(path) => builder.commit_from_file(path),
            Artifact::Bytes(bytes) => builder.commit_from_memory(bytes),
        }
    }
}

impl InferenceEngine for OnnxEngine {
    type Model = OnnxModel;
    type Executor = OnnxExecutor;

    fn load(&self, source: &ModelSource) -> Result<OnnxModel, ModelLoadError> {
        let model = match source {
            ModelSource::File(path) => {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let metadata = std::fs::metadata(path)
                    .map_err(|e| ModelLoadError::new(&name, format!("{}: {}", path.display(), e)))?;
                if metadata.len() == 0 {
                    return Err(ModelLoadError::new(name, "model file is empty"));
                }
                OnnxModel {
                    name,
                    artifact: Artifact::File(path.clone()),
                }
            }
            ModelSource::Embedded(asset) => {
                if asset.bytes.is_empty() {
                    return Err(ModelLoadError::new(&asset.name, "bundled asset is empty"));
                }
                OnnxModel {
                    name: asset.name.clone(),
                    artifact: Artifact::Bytes(Arc::clone(&asset.bytes)),
                }
            }
        };

        debug!(model = %model.name, source = %source, "Model artifact loaded");
        Ok(model)
    }

    fn create_executor(
        &self,
        model: OnnxModel,
        backend: Backend,
    ) -> Result<OnnxExecutor, ModelLoadError> {
        info!(model = %model.name, backend = ?backend, threads = self.intra_threads, "Creating ONNX session");

        let session = self
            .build_session(&model, backend)
            .map_err(|e| ModelLoadError::new(&model.name, e.to_string()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| ModelLoadError::new(&model.name, "model declares no inputs"))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ModelLoadError::new(&model.name, "model declares no outputs"))?;

        info!(
            model = %model.name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(OnnxExecutor {
            name: model.name,
            session,
            input_name,
            output_name,
        })
    }
}

/// One ONNX Runtime session bound to one model
pub struct OnnxExecutor {
    name: String,
    session: Session,
    input_name: String,
    output_name: String,
}

impl OnnxExecutor {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Executor for OnnxExecutor {
    fn execute(&mut self, input: &Tensor) -> Result<Vec<f32>, ExecutionError> {
        use ort::value::Tensor as OrtTensor;

        let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let input_tensor = OrtTensor::from_array((shape, input.data().to_vec()))
            .map_err(|e| ExecutionError::new(format!("failed to create input tensor: {}", e)))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| ExecutionError::new(e.to_string()))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| ExecutionError::new(format!("missing output '{}'", self.output_name)))?;

        // Copying out forces every value to be materialized before returning
        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ExecutionError::new(format!("output is not an f32 tensor: {}", e)))?;

        Ok(data.to_vec())
    }
}
