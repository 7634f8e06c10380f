//! Persisted benchmark record

use serde::{Deserialize, Serialize};

/// Placeholder for device fields that could not be determined
pub const NOT_AVAILABLE: &str = "N/A";

/// Outcome of a benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
}

/// Coarse device metadata captured when a record is assembled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    pub memory_total_kb: String,
    #[serde(default = "not_available")]
    pub memory_free_kb: String,
    pub cpu_description: String,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

impl DeviceSnapshot {
    /// Snapshot with every queried field set to the placeholder
    pub fn unknown(timestamp: f64) -> Self {
        Self {
            timestamp,
            memory_total_kb: not_available(),
            memory_free_kb: not_available(),
            cpu_description: not_available(),
        }
    }
}

/// Result of one timed inference run. Field order is part of the file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub model_name: String,
    pub model_hash: String,
    pub duration_ns: u64,
    pub status: RunStatus,
    pub device_snapshot: DeviceSnapshot,
}

impl BenchmarkRecord {
    pub fn success(
        model_name: String,
        model_hash: String,
        duration_ns: u64,
        device_snapshot: DeviceSnapshot,
    ) -> Self {
        Self {
            model_name,
            model_hash,
            duration_ns,
            status: RunStatus::Success,
            device_snapshot,
        }
    }

    /// Failed run; duration is zero
    pub fn failure(model_name: String, model_hash: String, device_snapshot: DeviceSnapshot) -> Self {
        Self {
            model_name,
            model_hash,
            duration_ns: 0,
            status: RunStatus::Failure,
            device_snapshot,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}
