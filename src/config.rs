//! Configuration management for the benchmarking harness

use crate::models::engine::Backend;
use crate::preprocess::TensorLayout;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub benchmark: BenchmarkConfig,
    pub classification: ClassificationConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Filesystem locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Writable data directory: downloaded models and stats output
    pub data_dir: PathBuf,
    /// Directory holding bundled model assets
    pub assets_dir: PathBuf,
    /// Label table, one class name per line
    pub labels_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            assets_dir: PathBuf::from("assets"),
            labels_file: PathBuf::from("assets/imagenet_classes.txt"),
        }
    }
}

/// Single-model benchmark configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Model used when no override name is supplied
    pub default_model: Option<String>,
    /// Extension of downloaded model files
    pub model_extension: String,
    /// Delay before the pipeline starts, excluded from measurement
    pub settle_delay_ms: u64,
    pub input_height: usize,
    pub input_width: usize,
    pub input_channels: usize,
    pub layout: TensorLayout,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            default_model: Some("AirNet".to_string()),
            model_extension: "onnx".to_string(),
            settle_delay_ms: 3000,
            input_height: 224,
            input_width: 224,
            input_channels: 3,
            layout: TensorLayout::default(),
        }
    }
}

/// Multi-model classification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Models to run, in report order
    pub models: Vec<String>,
    pub image_width: u32,
    pub image_height: u32,
    pub backend: Backend,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            image_width: 224,
            image_height: 224,
            backend: Backend::Accelerated,
        }
    }
}

/// Inference engine tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Intra-op threads per session
    pub intra_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { intra_threads: 1 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path, layered with `NN_BENCH__*` env vars.
    /// A missing file falls back to defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("NN_BENCH").prefix_separator("__").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Directory where stats records are written
    pub fn stats_dir(&self) -> &Path {
        &self.paths.data_dir
    }
}
