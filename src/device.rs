//! Best-effort device metadata for benchmark records

use crate::types::record::{DeviceSnapshot, NOT_AVAILABLE};
use chrono::Utc;
use sysinfo::System;

/// Source of device snapshots
pub trait DeviceProbe {
    fn snapshot(&self) -> DeviceSnapshot;
}

/// Queries the host through `sysinfo`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl DeviceProbe for SystemProbe {
    fn snapshot(&self) -> DeviceSnapshot {
        let system = System::new_all();

        let cpu_description = system
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .or_else(System::cpu_arch)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        DeviceSnapshot {
            timestamp: unix_timestamp(),
            memory_total_kb: format_kb(system.total_memory()),
            memory_free_kb: format_kb(system.free_memory()),
            cpu_description,
        }
    }
}

/// Snapshot with placeholders only, for hosts without system queries
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProbe;

impl DeviceProbe for NullProbe {
    fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot::unknown(unix_timestamp())
    }
}

/// Seconds since the Unix epoch with microsecond precision
pub fn unix_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// `"<n> kB"` from a byte count; zero means the value is unknown
fn format_kb(bytes: u64) -> String {
    if bytes == 0 {
        NOT_AVAILABLE.to_string()
    } else {
        format!("{} kB", bytes / 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_kb() {
        assert_eq!(format_kb(0), NOT_AVAILABLE);
        assert_eq!(format_kb(8 * 1024 * 1024), "8192 kB");
    }

    #[test]
    fn test_system_probe_fills_every_field() {
        let snapshot = SystemProbe.snapshot();
        assert!(snapshot.timestamp > 1_600_000_000.0);
        assert!(!snapshot.memory_total_kb.is_empty());
        assert!(!snapshot.memory_free_kb.is_empty());
        assert!(!snapshot.cpu_description.is_empty());
    }

    #[test]
    fn test_null_probe() {
        let snapshot = NullProbe.snapshot();
        assert_eq!(snapshot.memory_total_kb, NOT_AVAILABLE);
        assert_eq!(snapshot.cpu_description, NOT_AVAILABLE);
    }
}
