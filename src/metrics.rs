//! Run statistics for batch benchmarking.

use crate::error::BenchError;
use crate::types::record::BenchmarkRecord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Instant;
use tracing::info;

/// Final state of one model in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failure,
    NotFound,
    Error(String),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }
}

/// Metrics collector for a batch of benchmark runs
pub struct BenchMetrics {
    /// Runs that produced a success record
    pub runs_succeeded: AtomicU64,
    /// Runs that produced a failure record
    pub runs_failed: AtomicU64,
    /// Runs that never reached execution
    pub runs_aborted: AtomicU64,
    /// Outcomes in submission order
    outcomes: RwLock<Vec<(String, RunOutcome)>>,
    /// Successful durations per model (nanoseconds)
    model_times: RwLock<HashMap<String, Vec<u64>>>,
    start_time: Instant,
}

impl BenchMetrics {
    pub fn new() -> Self {
        Self {
            runs_succeeded: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
            runs_aborted: AtomicU64::new(0),
            outcomes: RwLock::new(Vec::new()),
            model_times: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record a finished run
    pub fn record_run(&self, record: &BenchmarkRecord) {
        let outcome = if record.is_success() {
            self.runs_succeeded.fetch_add(1, Ordering::Relaxed);
            if let Ok(mut times) = self.model_times.write() {
                times
                    .entry(record.model_name.clone())
                    .or_default()
                    .push(record.duration_ns);
            }
            RunOutcome::Success
        } else {
            self.runs_failed.fetch_add(1, Ordering::Relaxed);
            RunOutcome::Failure
        };
        self.push_outcome(&record.model_name, outcome);
    }

    /// Record a run that stopped before a record was produced
    pub fn record_error(&self, model_name: &str, error: &BenchError) {
        self.runs_aborted.fetch_add(1, Ordering::Relaxed);
        let outcome = match error {
            BenchError::ModelNotFound { .. } => RunOutcome::NotFound,
            other => RunOutcome::Error(other.to_string()),
        };
        self.push_outcome(model_name, outcome);
    }

    fn push_outcome(&self, model_name: &str, outcome: RunOutcome) {
        if let Ok(mut outcomes) = self.outcomes.write() {
            outcomes.push((model_name.to_string(), outcome));
        }
    }

    pub fn outcomes(&self) -> Vec<(String, RunOutcome)> {
        self.outcomes
            .read()
            .map(|o| o.clone())
            .unwrap_or_default()
    }

    pub fn total_runs(&self) -> u64 {
        self.runs_succeeded.load(Ordering::Relaxed)
            + self.runs_failed.load(Ordering::Relaxed)
            + self.runs_aborted.load(Ordering::Relaxed)
    }

    pub fn all_succeeded(&self) -> bool {
        self.runs_failed.load(Ordering::Relaxed) == 0 && self.runs_aborted.load(Ordering::Relaxed) == 0
    }

    /// Duration statistics per model
    pub fn get_model_stats(&self) -> HashMap<String, ModelStats> {
        let Ok(times) = self.model_times.read() else {
            return HashMap::new();
        };

        times
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(model, samples)| {
                let mut sorted = samples.clone();
                sorted.sort_unstable();
                let count = sorted.len();
                let sum: u64 = sorted.iter().sum();
                (
                    model.clone(),
                    ModelStats {
                        runs: count as u64,
                        mean_ns: sum / count as u64,
                        p50_ns: sorted[count / 2],
                        p99_ns: sorted[((count as f64 * 0.99) as usize).min(count - 1)],
                    },
                )
            })
            .collect()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let outcomes = self.outcomes();
        let elapsed = self.start_time.elapsed();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║               BATCH BENCHMARK - SUMMARY                      ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Runs: {:>4}  succeeded: {:>4}  failed: {:>4}  aborted: {:>4}     ║",
            self.total_runs(),
            self.runs_succeeded.load(Ordering::Relaxed),
            self.runs_failed.load(Ordering::Relaxed),
            self.runs_aborted.load(Ordering::Relaxed)
        );
        info!("║ Wall time: {:>8.2}s                                         ║", elapsed.as_secs_f64());
        info!("╠══════════════════════════════════════════════════════════════╣");
        for (model, outcome) in &outcomes {
            let status = match outcome {
                RunOutcome::Success => "Success".to_string(),
                RunOutcome::Failure => "Failed (execution)".to_string(),
                RunOutcome::NotFound => "Failed (model not found)".to_string(),
                RunOutcome::Error(e) => format!("Failed ({})", e),
            };
            let icon = if outcome.is_success() { "✅" } else { "❌" };
            info!("║ {} {}: {}", icon, model, status);
        }
        info!("╚══════════════════════════════════════════════════════════════╝");

        let model_stats = self.get_model_stats();
        if !model_stats.is_empty() {
            info!("Model Inference Times (ns):");
            for (model, stats) in &model_stats {
                info!(
                    "  {}: mean={} p50={} p99={} (runs={})",
                    model, stats.mean_ns, stats.p50_ns, stats.p99_ns, stats.runs
                );
            }
        }
    }
}

impl Default for BenchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Model-specific statistics
#[derive(Debug)]
pub struct ModelStats {
    pub runs: u64,
    pub mean_ns: u64,
    pub p50_ns: u64,
    pub p99_ns: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::DeviceSnapshot;

    fn record(name: &str, duration_ns: u64, ok: bool) -> BenchmarkRecord {
        let snapshot = DeviceSnapshot::unknown(0.0);
        if ok {
            BenchmarkRecord::success(name.to_string(), String::new(), duration_ns, snapshot)
        } else {
            BenchmarkRecord::failure(name.to_string(), String::new(), snapshot)
        }
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = BenchMetrics::new();

        metrics.record_run(&record("AirNet", 100, true));
        metrics.record_run(&record("ResNet50", 0, false));
        metrics.record_error("Ghost", &BenchError::model_not_found("Ghost"));

        assert_eq!(metrics.total_runs(), 3);
        assert!(!metrics.all_succeeded());
        assert_eq!(
            metrics.outcomes(),
            vec![
                ("AirNet".to_string(), RunOutcome::Success),
                ("ResNet50".to_string(), RunOutcome::Failure),
                ("Ghost".to_string(), RunOutcome::NotFound),
            ]
        );
    }

    #[test]
    fn test_model_stats() {
        let metrics = BenchMetrics::new();
        for duration in [300, 100, 200] {
            metrics.record_run(&record("AirNet", duration, true));
        }
        metrics.record_run(&record("MobileNetV2", 0, false));

        let stats = metrics.get_model_stats();
        let airnet = &stats["AirNet"];
        assert_eq!(airnet.runs, 3);
        assert_eq!(airnet.mean_ns, 200);
        assert_eq!(airnet.p50_ns, 200);
        assert_eq!(airnet.p99_ns, 300);
        assert!(!stats.contains_key("MobileNetV2"));
    }
}
