//! In-process engine for unit tests

use crate::error::{ExecutionError, ModelLoadError};
use crate::models::engine::{Backend, Executor, InferenceEngine};
use crate::models::resolver::ModelSource;
use crate::preprocess::Tensor;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub struct StubModel {
    name: String,
}

/// Returns fixed scores per model name and counts executor lifetimes
#[derive(Default)]
pub struct StubEngine {
    default_scores: Vec<f32>,
    scores: HashMap<String, Vec<f32>>,
    expected_shape: Option<Vec<usize>>,
    fail_load: bool,
    created: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    backends: Mutex<Vec<Backend>>,
}

impl StubEngine {
    pub fn new(default_scores: Vec<f32>) -> Self {
        Self {
            default_scores,
            ..Self::default()
        }
    }

    pub fn with_scores(mut self, model: &str, scores: Vec<f32>) -> Self {
        self.scores.insert(model.to_string(), scores);
        self
    }

    /// Reject inputs whose shape differs
    pub fn expecting_input(mut self, shape: Vec<usize>) -> Self {
        self.expected_shape = Some(shape);
        self
    }

    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn executor_for(&self, name: &str) -> StubExecutor {
        self.created.fetch_add(1, Ordering::SeqCst);
        StubExecutor {
            scores: self
                .scores
                .get(name)
                .cloned()
                .unwrap_or_else(|| self.default_scores.clone()),
            expected_shape: self.expected_shape.clone(),
            released: Arc::clone(&self.released),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn backends(&self) -> Vec<Backend> {
        self.backends.lock().unwrap().clone()
    }
}

impl InferenceEngine for StubEngine {
    type Model = StubModel;
    type Executor = StubExecutor;

    fn load(&self, source: &ModelSource) -> Result<StubModel, ModelLoadError> {
        let name = match source {
            ModelSource::Embedded(asset) => asset.name.clone(),
            ModelSource::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        if self.fail_load {
            return Err(ModelLoadError::new(name, "stub refuses to load"));
        }
        Ok(StubModel { name })
    }

    fn create_executor(
        &self,
        model: StubModel,
        backend: Backend,
    ) -> Result<StubExecutor, ModelLoadError> {
        self.backends.lock().unwrap().push(backend);
        Ok(self.executor_for(&model.name))
    }
}

pub struct StubExecutor {
    scores: Vec<f32>,
    expected_shape: Option<Vec<usize>>,
    released: Arc<AtomicUsize>,
}

impl Executor for StubExecutor {
    fn execute(&mut self, input: &Tensor) -> Result<Vec<f32>, ExecutionError> {
        if let Some(expected) = &self.expected_shape {
            if expected.as_slice() != input.shape() {
                return Err(ExecutionError::shape_mismatch(expected, input.shape()));
            }
        }
        Ok(self.scores.clone())
    }
}

impl Drop for StubExecutor {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
