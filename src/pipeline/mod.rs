//! Benchmark and classification pipelines

pub mod benchmark;
pub mod classify;

pub use benchmark::{BenchmarkRunner, BenchmarkSettings, TimingCollector};
pub use classify::Classifier;
