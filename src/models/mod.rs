//! Model resolution, inference engines and prediction decoding

pub mod engine;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod prediction;
pub mod resolver;

pub use engine::{Backend, Executor, InferenceEngine};
#[cfg(feature = "onnx")]
pub use onnx::OnnxEngine;
pub use prediction::{resolve_prediction, LabelTable, Prediction};
pub use resolver::{AssetDir, AssetStore, EmbeddedAssets, ModelReference, ModelResolver, ModelSource};
