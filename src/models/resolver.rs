//! Model resolution: decides which artifact a run uses.
//!
//! Order: a downloaded file named after the override in the data directory,
//! then a bundled asset named after the override (or the default model).

use crate::error::{BenchError, Result};
use crate::params::ModelOverrides;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Bundled model bytes
#[derive(Clone)]
pub struct AssetHandle {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHandle")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Where a model artifact comes from
#[derive(Debug, Clone)]
pub enum ModelSource {
    Embedded(AssetHandle),
    File(PathBuf),
}

impl ModelSource {
    pub fn is_file(&self) -> bool {
        matches!(self, ModelSource::File(_))
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, ModelSource::Embedded(_))
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Embedded(asset) => write!(f, "asset:{}", asset.name),
            ModelSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A resolved model. Always carries a source.
#[derive(Debug, Clone)]
pub struct ModelReference {
    pub name: String,
    /// Opaque bookkeeping value, passed through to the stats record
    pub hash: Option<String>,
    pub source: ModelSource,
}

/// Lookup of bundled model assets
pub trait AssetStore {
    fn load_asset(&self, name: &str) -> Option<AssetHandle>;
}

/// Compiled-in assets registered by the host, e.g. via `include_bytes!`
#[derive(Debug, Default, Clone)]
pub struct EmbeddedAssets {
    assets: HashMap<String, Arc<[u8]>>,
}

impl EmbeddedAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.assets.insert(name.into(), bytes.into());
    }

    pub fn with_asset(mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl AssetStore for EmbeddedAssets {
    fn load_asset(&self, name: &str) -> Option<AssetHandle> {
        self.assets.get(name).map(|bytes| AssetHandle {
            name: name.to_string(),
            bytes: Arc::clone(bytes),
        })
    }
}

/// Bundled assets shipped as files next to the binary
#[derive(Debug, Clone)]
pub struct AssetDir {
    root: PathBuf,
    extension: String,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }
}

impl AssetStore for AssetDir {
    fn load_asset(&self, name: &str) -> Option<AssetHandle> {
        let path = self.root.join(format!("{}.{}", name, self.extension));
        match std::fs::read(&path) {
            Ok(bytes) => Some(AssetHandle {
                name: name.to_string(),
                bytes: bytes.into(),
            }),
            Err(_) => None,
        }
    }
}

/// Resolves model names into references. Performs no caching.
pub struct ModelResolver<A> {
    data_dir: PathBuf,
    extension: String,
    default_model: Option<String>,
    assets: A,
}

impl<A: AssetStore> ModelResolver<A> {
    pub fn new(data_dir: impl Into<PathBuf>, assets: A) -> Self {
        Self {
            data_dir: data_dir.into(),
            extension: "onnx".to_string(),
            default_model: None,
            assets,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_default_model(mut self, name: Option<String>) -> Self {
        self.default_model = name;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn override_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", name, self.extension))
    }

    /// Resolve the model for a benchmark run
    pub fn resolve(&self, overrides: &ModelOverrides) -> Result<ModelReference> {
        self.resolve_with(overrides, true)
    }

    fn resolve_with(&self, overrides: &ModelOverrides, report_missing_file: bool) -> Result<ModelReference> {
        let hash = overrides.model_hash.clone();

        if let Some(name) = overrides.model_name.as_deref() {
            let path = self.override_path(name);
            if path.exists() {
                info!(model = %name, path = %path.display(), "Loading model from path");
                return Ok(ModelReference {
                    name: name.to_string(),
                    hash,
                    source: ModelSource::File(path),
                });
            }
            if report_missing_file {
                error!(model = %name, path = %path.display(), "Model file not found");
            } else {
                debug!(model = %name, path = %path.display(), "No downloaded model file, trying bundled assets");
            }
        }

        let Some(name) = overrides
            .model_name
            .as_deref()
            .or(self.default_model.as_deref())
        else {
            error!("No model name supplied and no default model configured");
            return Err(BenchError::model_not_found("<unspecified>"));
        };

        match self.assets.load_asset(name) {
            Some(asset) => {
                info!(model = %name, bytes = asset.bytes.len(), "Auto-loaded model from bundled assets");
                Ok(ModelReference {
                    name: name.to_string(),
                    hash,
                    source: ModelSource::Embedded(asset),
                })
            }
            None => {
                error!(
                    model = %name,
                    data_dir = %self.data_dir.display(),
                    "Could not find model in data directory or bundled assets"
                );
                Err(BenchError::model_not_found(name))
            }
        }
    }

    /// Resolve a plain model name: downloaded file first, then bundled asset.
    /// A missing downloaded file is expected here and only logged at debug.
    pub fn resolve_named(&self, name: &str) -> Result<ModelReference> {
        self.resolve_with(
            &ModelOverrides {
                model_name: Some(name.to_string()),
                model_hash: None,
            },
            false,
        )
    }
}
