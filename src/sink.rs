//! Stats persistence: one JSON document per model name, last write wins

use crate::error::{BenchError, Result};
use crate::types::record::BenchmarkRecord;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

const STATS_SUFFIX: &str = "_stats.json";

/// Writes benchmark records under a stats directory
#[derive(Debug, Clone)]
pub struct StatsSink {
    dir: PathBuf,
}

impl StatsSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<model_name>_stats.json`
    pub fn path_for(&self, model_name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", model_name, STATS_SUFFIX))
    }

    /// Serialize and write a record, replacing any earlier one for the same model
    pub fn write(&self, record: &BenchmarkRecord) -> Result<PathBuf> {
        let path = self.path_for(&record.model_name);
        if escapes_dir(&record.model_name) {
            return Err(BenchError::StatsWrite {
                path,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "model name must stay inside the stats directory",
                ),
            });
        }
        let json = serde_json::to_string_pretty(record)?;

        // Nested model names write into subdirectories
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| BenchError::StatsWrite {
                path: path.clone(),
                source,
            })?;
        }
        std::fs::write(&path, json).map_err(|source| BenchError::StatsWrite {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), "Stats saved to: {}", path.display());
        info!("DONE {}", record.model_name);
        Ok(path)
    }

    /// Read the record stored for a model
    pub fn read(&self, model_name: &str) -> Result<BenchmarkRecord> {
        let json = std::fs::read_to_string(self.path_for(model_name))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Read every record in the directory, sorted by model name.
    /// Unparseable files are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<BenchmarkRecord>> {
        let mut records = Vec::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_stats = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(STATS_SUFFIX));
            if !is_stats {
                continue;
            }

            match std::fs::read_to_string(&path)
                .map_err(BenchError::from)
                .and_then(|json| serde_json::from_str::<BenchmarkRecord>(&json).map_err(BenchError::from))
            {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable stats file"),
            }
        }

        records.sort_by(|a, b| a.model_name.cmp(&b.model_name));
        Ok(records)
    }
}

fn escapes_dir(model_name: &str) -> bool {
    Path::new(model_name)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::DeviceSnapshot;

    fn record(name: &str, duration_ns: u64) -> BenchmarkRecord {
        BenchmarkRecord::success(
            name.to_string(),
            "hash".to_string(),
            duration_ns,
            DeviceSnapshot::unknown(1.0),
        )
    }

    #[test]
    fn test_creates_directory_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let sink = StatsSink::new(dir.path().join("nested").join("stats"));

        let path = sink.write(&record("AirNet", 10)).unwrap();

        assert_eq!(path, sink.dir().join("AirNet_stats.json"));
        assert_eq!(sink.read("AirNet").unwrap(), record("AirNet", 10));
    }

    #[test]
    fn test_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let sink = StatsSink::new(dir.path());

        sink.write(&record("AirNet", 10)).unwrap();
        sink.write(&record("AirNet", 20)).unwrap();

        assert_eq!(sink.read("AirNet").unwrap().duration_ns, 20);
        assert_eq!(sink.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_output_is_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let sink = StatsSink::new(dir.path());
        let path = sink.write(&record("AirNet", 10)).unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("\n  \"model_name\": \"AirNet\""));
    }

    #[test]
    fn test_read_all_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = StatsSink::new(dir.path());
        sink.write(&record("ResNet50", 30)).unwrap();
        sink.write(&record("AirNet", 10)).unwrap();
        std::fs::write(dir.path().join("AirNet.onnx"), b"model").unwrap();
        std::fs::write(dir.path().join("broken_stats.json"), b"{").unwrap();

        let records = sink.read_all().unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.model_name.as_str()).collect();
        assert_eq!(names, vec!["AirNet", "ResNet50"]);
    }

    #[test]
    fn test_nested_model_name_creates_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let sink = StatsSink::new(dir.path().join("stats"));

        let path = sink.write(&record("org/model", 10)).unwrap();

        assert_eq!(path, dir.path().join("stats").join("org").join("model_stats.json"));
        assert_eq!(sink.read("org/model").unwrap(), record("org/model", 10));
    }

    #[test]
    fn test_rejects_names_outside_stats_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sink = StatsSink::new(dir.path().join("stats"));

        let err = sink.write(&record("../escaped", 10)).unwrap_err();
        assert!(matches!(err, BenchError::StatsWrite { .. }));
        assert!(!dir.path().join("escaped_stats.json").exists());
        assert!(sink.write(&record("/abs/model", 10)).is_err());
    }
}
