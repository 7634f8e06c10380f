//! Edge NN Bench Library
//!
//! Measures single-pass inference latency of neural network models on the
//! device they run on, and classifies images with several models at once.

pub mod config;
pub mod device;
pub mod error;
pub mod metrics;
pub mod models;
pub mod params;
pub mod pipeline;
pub mod preprocess;
pub mod sink;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::AppConfig;
pub use error::{BenchError, Result};
pub use metrics::BenchMetrics;
pub use params::ModelOverrides;
pub use pipeline::{BenchmarkRunner, Classifier};
pub use sink::StatsSink;
pub use types::{classification::ClassificationReport, record::BenchmarkRecord};
