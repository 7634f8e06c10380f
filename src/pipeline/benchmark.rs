//! Single-model benchmark: resolve, run once on a synthetic input, time, persist.
//!
//! Start-up is two-phase. [`BenchmarkRunner::settle`] waits for the host to
//! quiet down, then [`BenchmarkRunner::run_benchmark`] does the measured work.
//! The settle delay never enters the timed region.

use crate::config::BenchmarkConfig;
use crate::device::DeviceProbe;
use crate::error::Result;
use crate::models::engine::{Backend, Executor, InferenceEngine};
use crate::models::resolver::{AssetStore, ModelReference, ModelResolver};
use crate::params::ModelOverrides;
use crate::preprocess::{Tensor, TensorLayout};
use crate::sink::StatsSink;
use crate::types::record::BenchmarkRecord;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Shape of the synthetic input and the settle delay
#[derive(Debug, Clone)]
pub struct BenchmarkSettings {
    pub settle_delay: Duration,
    pub input_height: usize,
    pub input_width: usize,
    pub input_channels: usize,
    pub layout: TensorLayout,
}

impl BenchmarkSettings {
    pub fn from_config(config: &BenchmarkConfig) -> Self {
        Self {
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            input_height: config.input_height,
            input_width: config.input_width,
            input_channels: config.input_channels,
            layout: config.layout,
        }
    }

    pub fn synthetic_input(&self) -> Tensor {
        Tensor::synthetic(
            self.input_height,
            self.input_width,
            self.input_channels,
            self.layout,
        )
    }
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self::from_config(&BenchmarkConfig::default())
    }
}

/// Times one execution and assembles the record
pub struct TimingCollector<P> {
    probe: P,
}

impl<P: DeviceProbe> TimingCollector<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    /// Run `executor` once on `input`.
    ///
    /// The measured span covers execution up to fully materialized output.
    /// An `ExecutionError` becomes a failure record with zero duration.
    pub fn measure<X: Executor + ?Sized>(
        &self,
        executor: &mut X,
        input: &Tensor,
        model: &ModelReference,
    ) -> BenchmarkRecord {
        let model_hash = model.hash.clone().unwrap_or_default();

        let start = Instant::now();
        let outcome = executor.execute(input);
        let elapsed = start.elapsed();

        match outcome {
            Ok(output) => {
                // Successful runs always report a non-zero duration
                let duration_ns = u64::try_from(elapsed.as_nanos())
                    .unwrap_or(u64::MAX)
                    .max(1);
                info!(
                    model = %model.name,
                    duration_ns,
                    outputs = output.len(),
                    "Inference finished. Duration: {} ns",
                    duration_ns
                );
                drop(output);
                BenchmarkRecord::success(
                    model.name.clone(),
                    model_hash,
                    duration_ns,
                    self.probe.snapshot(),
                )
            }
            Err(e) => {
                error!(model = %model.name, error = %e, "Inference failed");
                BenchmarkRecord::failure(model.name.clone(), model_hash, self.probe.snapshot())
            }
        }
    }
}

/// Drives one benchmark run end to end
pub struct BenchmarkRunner<'e, E, A, P> {
    engine: &'e E,
    resolver: ModelResolver<A>,
    collector: TimingCollector<P>,
    sink: StatsSink,
    settings: BenchmarkSettings,
}

impl<'e, E, A, P> BenchmarkRunner<'e, E, A, P>
where
    E: InferenceEngine,
    A: AssetStore,
    P: DeviceProbe,
{
    pub fn new(
        engine: &'e E,
        resolver: ModelResolver<A>,
        sink: StatsSink,
        probe: P,
        settings: BenchmarkSettings,
    ) -> Self {
        Self {
            engine,
            resolver,
            collector: TimingCollector::new(probe),
            sink,
            settings,
        }
    }

    pub fn sink(&self) -> &StatsSink {
        &self.sink
    }

    /// Setup phase: wait out the settle delay
    pub async fn settle(&self) {
        if self.settings.settle_delay.is_zero() {
            return;
        }
        info!(delay_ms = self.settings.settle_delay.as_millis() as u64, "Waiting for host to settle");
        tokio::time::sleep(self.settings.settle_delay).await;
    }

    /// Settle, then benchmark
    pub async fn start(&self, overrides: &ModelOverrides) -> Result<BenchmarkRecord> {
        self.settle().await;
        self.run_benchmark(overrides)
    }

    /// Execution phase: resolve the model, run it once on a CPU executor,
    /// persist and return the record.
    ///
    /// Resolution and load failures propagate and write nothing. Execution
    /// failures are persisted as failure records.
    pub fn run_benchmark(&self, overrides: &ModelOverrides) -> Result<BenchmarkRecord> {
        let reference = self.resolver.resolve(overrides)?;
        info!(model = %reference.name, source = %reference.source, "Starting inference");

        let model = self.engine.load(&reference.source)?;
        let mut executor = self.engine.create_executor(model, Backend::Cpu)?;

        let input = self.settings.synthetic_input();
        let record = self.collector.measure(&mut executor, &input, &reference);
        drop(input);
        drop(executor);

        self.sink.write(&record)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::NullProbe;
    use crate::error::BenchError;
    use crate::models::resolver::{EmbeddedAssets, ModelSource};
    use crate::testing::StubEngine;
    use crate::types::record::RunStatus;

    fn settings(delay_ms: u64) -> BenchmarkSettings {
        BenchmarkSettings {
            settle_delay: Duration::from_millis(delay_ms),
            input_height: 4,
            input_width: 4,
            input_channels: 3,
            layout: TensorLayout::Nchw,
        }
    }

    fn runner<'e>(
        engine: &'e StubEngine,
        dir: &std::path::Path,
        delay_ms: u64,
    ) -> BenchmarkRunner<'e, StubEngine, EmbeddedAssets, NullProbe> {
        let assets = EmbeddedAssets::new().with_asset("AirNet", b"air".to_vec());
        let resolver = ModelResolver::new(dir, assets).with_default_model(Some("AirNet".into()));
        BenchmarkRunner::new(engine, resolver, StatsSink::new(dir), NullProbe, settings(delay_ms))
    }

    #[test]
    fn test_execution_error_becomes_failure_record() {
        let engine = StubEngine::new(vec![0.1, 0.9]).expecting_input(vec![1, 3, 224, 224]);
        let mut executor = engine.executor_for("AirNet");
        let reference = ModelReference {
            name: "AirNet".to_string(),
            hash: Some("abc".to_string()),
            source: ModelSource::File("AirNet.onnx".into()),
        };

        let collector = TimingCollector::new(NullProbe);
        let record = collector.measure(&mut executor, &Tensor::synthetic(4, 4, 3, TensorLayout::Nchw), &reference);

        assert_eq!(record.status, RunStatus::Failure);
        assert_eq!(record.duration_ns, 0);
        assert_eq!(record.model_hash, "abc");
    }

    #[test]
    fn test_success_has_positive_duration() {
        let engine = StubEngine::new(vec![0.1, 0.9]);
        let mut executor = engine.executor_for("AirNet");
        let reference = ModelReference {
            name: "AirNet".to_string(),
            hash: None,
            source: ModelSource::File("AirNet.onnx".into()),
        };

        let record = TimingCollector::new(NullProbe).measure(
            &mut executor,
            &Tensor::synthetic(2, 2, 3, TensorLayout::Nhwc),
            &reference,
        );

        assert_eq!(record.status, RunStatus::Success);
        assert!(record.duration_ns > 0);
        assert_eq!(record.model_hash, "");
    }

    #[test]
    fn test_run_benchmark_persists_and_releases_executor() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::new(vec![0.2, 0.8]);
        let runner = runner(&engine, dir.path(), 0);

        let record = runner.run_benchmark(&ModelOverrides::default()).unwrap();

        assert!(record.is_success());
        assert_eq!(runner.sink().read("AirNet").unwrap(), record);
        assert_eq!(engine.created(), 1);
        assert_eq!(engine.released(), 1);
        assert_eq!(engine.backends(), vec![Backend::Cpu]);
    }

    #[test]
    fn test_failed_execution_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::new(vec![0.2, 0.8]).expecting_input(vec![1, 224, 224, 3]);
        let runner = runner(&engine, dir.path(), 0);

        let record = runner.run_benchmark(&ModelOverrides::default()).unwrap();

        assert_eq!(record.status, RunStatus::Failure);
        assert_eq!(runner.sink().read("AirNet").unwrap().status, RunStatus::Failure);
        assert_eq!(engine.released(), 1);
    }

    #[test]
    fn test_not_found_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::new(vec![1.0]);
        let runner = runner(&engine, dir.path(), 0);

        let err = runner
            .run_benchmark(&ModelOverrides::new(Some("Ghost".into()), None))
            .unwrap_err();

        assert!(matches!(err, BenchError::ModelNotFound { .. }));
        assert!(!runner.sink().path_for("Ghost").exists());
        assert_eq!(engine.created(), 0);
    }

    #[test]
    fn test_load_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::new(vec![1.0]).failing_load();
        let runner = runner(&engine, dir.path(), 0);

        let err = runner.run_benchmark(&ModelOverrides::default()).unwrap_err();
        assert!(matches!(err, BenchError::ModelLoad(_)));
    }

    #[tokio::test]
    async fn test_settle_delay_excluded_from_duration() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::new(vec![0.5, 0.5]);
        let runner = runner(&engine, dir.path(), 50);

        let before = Instant::now();
        let record = runner.start(&ModelOverrides::default()).await.unwrap();

        assert!(before.elapsed() >= Duration::from_millis(50));
        assert!(record.is_success());
        assert!(record.duration_ns < Duration::from_millis(50).as_nanos() as u64);
    }
}
