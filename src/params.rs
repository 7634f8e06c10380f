//! Launch parameters: optional model name and hash supplied by whoever
//! started the process.

use std::collections::HashMap;
use tracing::warn;

pub const MODEL_NAME_KEY: &str = "model_name";
pub const MODEL_HASH_KEY: &str = "model_hash";

/// Source of optional string parameters.
///
/// Absence and retrieval failure are both `None`.
pub trait LaunchParams {
    fn get_optional_string(&self, key: &str) -> Option<String>;
}

/// Parameters read from `<PREFIX>_<KEY>` environment variables
#[derive(Debug, Clone)]
pub struct EnvParams {
    prefix: String,
}

impl EnvParams {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn var_name(&self, key: &str) -> String {
        format!("{}_{}", self.prefix, key.to_uppercase())
    }
}

impl Default for EnvParams {
    fn default() -> Self {
        Self::new("NN_BENCH")
    }
}

impl LaunchParams for EnvParams {
    fn get_optional_string(&self, key: &str) -> Option<String> {
        let var = self.var_name(key);
        match std::env::var(&var) {
            Ok(value) => Some(value),
            Err(std::env::VarError::NotPresent) => None,
            Err(e) => {
                warn!(variable = %var, error = %e, "Failed to read launch parameter");
                None
            }
        }
    }
}

/// Explicit key/value parameters, e.g. from command-line flags
#[derive(Debug, Clone, Default)]
pub struct MapParams(HashMap<String, String>);

impl MapParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.0.insert(key.to_string(), value);
        }
        self
    }
}

impl LaunchParams for MapParams {
    fn get_optional_string(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// Resolved override values for one benchmark run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelOverrides {
    pub model_name: Option<String>,
    pub model_hash: Option<String>,
}

impl ModelOverrides {
    pub fn new(model_name: Option<String>, model_hash: Option<String>) -> Self {
        Self {
            model_name: non_empty(model_name),
            model_hash: non_empty(model_hash),
        }
    }

    /// Read both keys from a parameter source; empty strings count as absent
    pub fn from_params(params: &dyn LaunchParams) -> Self {
        Self::new(
            params.get_optional_string(MODEL_NAME_KEY),
            params.get_optional_string(MODEL_HASH_KEY),
        )
    }

    /// Fill fields missing here from `fallback`
    pub fn or(self, fallback: ModelOverrides) -> Self {
        Self {
            model_name: self.model_name.or(fallback.model_name),
            model_hash: self.model_hash.or(fallback.model_hash),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_absent() {
        let params = MapParams::new()
            .set(MODEL_NAME_KEY, Some(String::new()))
            .set(MODEL_HASH_KEY, Some("  ".to_string()));
        assert_eq!(ModelOverrides::from_params(&params), ModelOverrides::default());
    }

    #[test]
    fn test_flags_take_precedence() {
        let flags = ModelOverrides::from_params(
            &MapParams::new().set(MODEL_NAME_KEY, Some("ResNet50".to_string())),
        );
        let env = ModelOverrides::new(Some("AirNet".to_string()), Some("deadbeef".to_string()));

        let merged = flags.or(env);
        assert_eq!(merged.model_name.as_deref(), Some("ResNet50"));
        assert_eq!(merged.model_hash.as_deref(), Some("deadbeef"));
    }

    #[test]
    fn test_env_params_missing_variable() {
        let params = EnvParams::new("NN_BENCH_TEST_UNSET_PREFIX");
        assert_eq!(params.get_optional_string(MODEL_NAME_KEY), None);
        assert_eq!(params.var_name(MODEL_HASH_KEY), "NN_BENCH_TEST_UNSET_PREFIX_MODEL_HASH");
    }
}
