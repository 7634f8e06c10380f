//! Multi-model classification of a single image

use crate::error::{BenchError, Result};
use crate::models::engine::{Backend, Executor, InferenceEngine};
use crate::models::prediction::{resolve_prediction, LabelTable, UNKNOWN_LABEL};
use crate::models::resolver::{AssetStore, ModelResolver};
use crate::preprocess::ImagePreprocessor;
use crate::types::classification::{ClassificationEntry, ClassificationReport};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

struct ClassifierModel<X> {
    name: String,
    executor: X,
}

/// Runs every loaded model, in order, against one preprocessed image
pub struct Classifier<X> {
    models: Vec<ClassifierModel<X>>,
    preprocessor: ImagePreprocessor,
    labels_path: PathBuf,
}

impl<X: Executor> Classifier<X> {
    pub fn new(preprocessor: ImagePreprocessor, labels_path: impl Into<PathBuf>) -> Self {
        Self {
            models: Vec::new(),
            preprocessor,
            labels_path: labels_path.into(),
        }
    }

    /// Resolve, load and bind one executor per model name
    pub fn load<E, A>(
        engine: &E,
        resolver: &ModelResolver<A>,
        names: &[String],
        backend: Backend,
        preprocessor: ImagePreprocessor,
        labels_path: impl Into<PathBuf>,
    ) -> Result<Self>
    where
        E: InferenceEngine<Executor = X>,
        A: AssetStore,
    {
        let mut classifier = Self::new(preprocessor, labels_path);
        for name in names {
            let reference = resolver.resolve_named(name)?;
            let model = engine.load(&reference.source)?;
            let executor = engine.create_executor(model, backend)?;
            classifier.add_model(reference.name, executor);
        }

        info!(
            count = classifier.models.len(),
            backend = ?backend,
            "Classification models initialized"
        );
        Ok(classifier)
    }

    pub fn add_model(&mut self, name: impl Into<String>, executor: X) {
        self.models.push(ClassifierModel {
            name: name.into(),
            executor,
        });
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    /// Classify an already decoded image
    pub fn run_classification(&mut self, image: &DynamicImage) -> Result<ClassificationReport> {
        let input = self.preprocessor.from_image(image)?;
        let labels = LabelTable::load(&self.labels_path);

        let mut report = ClassificationReport::default();
        for model in &mut self.models {
            let scores = model
                .executor
                .execute(&input)
                .map_err(|source| BenchError::Execution {
                    model: model.name.clone(),
                    source,
                })?;

            let entry = match resolve_prediction(&scores, &labels) {
                Some(prediction) => ClassificationEntry {
                    model_name: model.name.clone(),
                    predicted_label: prediction.label,
                    confidence: prediction.confidence,
                },
                None => ClassificationEntry {
                    model_name: model.name.clone(),
                    predicted_label: UNKNOWN_LABEL.to_string(),
                    confidence: 0.0,
                },
            };
            drop(scores);

            debug!(
                model = %entry.model_name,
                label = %entry.predicted_label,
                confidence = entry.confidence,
                "Model prediction"
            );
            report.entries.push(entry);
        }

        Ok(report)
    }

    /// Decode an image file and classify it
    pub fn classify_file(&mut self, path: &Path) -> Result<ClassificationReport> {
        let image = image::open(path).map_err(|e| {
            BenchError::TextureUnavailable(format!("{}: {}", path.display(), e))
        })?;
        self.run_classification(&image)
    }
}
