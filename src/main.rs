//! Edge NN Bench - Main Entry Point
//!
//! Benchmarks one model per invocation (or a batch of models in sequence),
//! writing a stats record per model, and classifies images with several
//! models at once.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edge_nn_bench::{
    config::{AppConfig, LoggingConfig},
    device::SystemProbe,
    metrics::BenchMetrics,
    models::{AssetDir, ModelResolver, OnnxEngine},
    params::{EnvParams, MapParams, ModelOverrides, MODEL_HASH_KEY, MODEL_NAME_KEY},
    pipeline::{BenchmarkRunner, BenchmarkSettings, Classifier},
    preprocess::ImagePreprocessor,
    sink::StatsSink,
};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// On-device neural network inference benchmark
#[derive(Parser, Debug)]
#[command(name = "edge-nn-bench")]
#[command(version)]
#[command(about = "Time single-pass inference and classify images on this device", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "config/config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Benchmark one model on a synthetic input and write its stats record
    Bench {
        /// Model to benchmark; falls back to NN_BENCH_MODEL_NAME, then the configured default
        #[arg(long)]
        model_name: Option<String>,

        /// Opaque identifier copied into the record; falls back to NN_BENCH_MODEL_HASH
        #[arg(long)]
        model_hash: Option<String>,
    },

    /// Benchmark several models in sequence, one record each
    Batch {
        /// Models to benchmark, in order
        #[arg(default_values_t = ["AirNet".to_string(), "ResNet50".to_string(), "MobileNetV2".to_string()])]
        models: Vec<String>,

        /// Skip the settle delay between models
        #[arg(long, default_value = "false")]
        no_settle: bool,
    },

    /// Classify one image with every listed model
    Classify {
        /// Image file to classify
        #[arg(short, long)]
        image: PathBuf,

        /// Model to run (repeatable); defaults to the configured list
        #[arg(short, long = "model")]
        models: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_path(&cli.config)?;
    init_logging(&config.logging)?;
    info!(config = %cli.config.display(), "Configuration loaded");

    let engine = OnnxEngine::with_threads(config.engine.intra_threads)?;
    let resolver = ModelResolver::new(
        &config.paths.data_dir,
        AssetDir::new(&config.paths.assets_dir, &config.benchmark.model_extension),
    )
    .with_extension(&config.benchmark.model_extension)
    .with_default_model(config.benchmark.default_model.clone());

    match cli.command {
        Commands::Bench {
            model_name,
            model_hash,
        } => {
            let flags = MapParams::new()
                .set(MODEL_NAME_KEY, model_name)
                .set(MODEL_HASH_KEY, model_hash);
            let overrides = ModelOverrides::from_params(&flags)
                .or(ModelOverrides::from_params(&EnvParams::default()));

            let runner = BenchmarkRunner::new(
                &engine,
                resolver,
                StatsSink::new(config.stats_dir()),
                SystemProbe,
                BenchmarkSettings::from_config(&config.benchmark),
            );

            let record = runner.start(&overrides).await?;
            info!(
                model = %record.model_name,
                status = ?record.status,
                duration_ns = record.duration_ns,
                "Benchmark complete"
            );
        }

        Commands::Batch { models, no_settle } => {
            let mut settings = BenchmarkSettings::from_config(&config.benchmark);
            if no_settle {
                settings.settle_delay = std::time::Duration::ZERO;
            }
            let hash = ModelOverrides::from_params(&EnvParams::default()).model_hash;
            let runner = BenchmarkRunner::new(
                &engine,
                resolver,
                StatsSink::new(config.stats_dir()),
                SystemProbe,
                settings,
            );
            let metrics = BenchMetrics::new();

            info!(count = models.len(), "Starting batch benchmark: {:?}", models);
            for name in &models {
                let overrides = ModelOverrides::new(Some(name.clone()), hash.clone());
                match runner.start(&overrides).await {
                    Ok(record) => metrics.record_run(&record),
                    Err(e) => {
                        error!(model = %name, error = %e, "Benchmark aborted");
                        metrics.record_error(name, &e);
                    }
                }
            }

            metrics.print_summary();
            if !metrics.all_succeeded() {
                warn!("Some models failed; see summary above");
            }
        }

        Commands::Classify { image, models } => {
            let models = if models.is_empty() {
                config.classification.models.clone()
            } else {
                models
            };
            if models.is_empty() {
                anyhow::bail!("No models to classify with; pass --model or set classification.models");
            }

            let preprocessor = ImagePreprocessor::new(
                config.classification.image_width,
                config.classification.image_height,
                config.benchmark.layout,
            );
            let mut classifier = Classifier::load(
                &engine,
                &resolver,
                &models,
                config.classification.backend,
                preprocessor,
                &config.paths.labels_file,
            )?;

            let report = classifier
                .classify_file(&image)
                .with_context(|| format!("Failed to classify {}", image.display()))?;
            print!("{}", report);
            if let Some(label) = report.consensus() {
                info!(label = %label, "Most common prediction");
            }
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("edge_nn_bench={}", logging.level).parse()?);

    match logging.format.as_str() {
        "json" => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    Ok(())
}
