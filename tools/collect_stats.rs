//! Stats Collector
//!
//! Reads every stats record from the stats directory, logs a line per model
//! and checks recorded model hashes against expected ones.

use anyhow::{Context, Result};
use clap::Parser;
use edge_nn_bench::{
    config::AppConfig,
    sink::StatsSink,
    types::record::{BenchmarkRecord, RunStatus},
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "collect-stats")]
#[command(about = "Summarize benchmark stats records", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config/config.toml")]
    config: PathBuf,

    /// Stats directory; defaults to the configured data directory
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Expected model hash as NAME=HASH (repeatable)
    #[arg(long = "expect", value_parser = parse_expectation)]
    expectations: Vec<(String, String)>,
}

fn parse_expectation(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, hash)) if !name.is_empty() => Ok((name.to_string(), hash.to_string())),
        _ => Err(format!("expected NAME=HASH, got '{}'", raw)),
    }
}

/// Outcome of comparing one expected hash against the stored records
#[derive(Debug, PartialEq, Eq)]
enum HashCheck {
    Match,
    Mismatch { expected: String, recorded: String },
    Missing,
}

fn check_hashes(
    records: &[BenchmarkRecord],
    expectations: &[(String, String)],
) -> BTreeMap<String, HashCheck> {
    expectations
        .iter()
        .map(|(name, expected)| {
            let check = match records.iter().find(|r| &r.model_name == name) {
                None => HashCheck::Missing,
                Some(record) if &record.model_hash == expected => HashCheck::Match,
                Some(record) => HashCheck::Mismatch {
                    expected: expected.clone(),
                    recorded: record.model_hash.clone(),
                },
            };
            (name.clone(), check)
        })
        .collect()
}

/// Log filter covering this tool and the library, so skipped stats files are reported
fn log_filter() -> Result<tracing_subscriber::EnvFilter> {
    Ok(tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("collect_stats=info".parse()?)
        .add_directive("edge_nn_bench=info".parse()?))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(log_filter()?).init();

    let args = Args::parse();
    let config = AppConfig::load_from_path(&args.config)?;
    let dir = args.dir.unwrap_or_else(|| config.stats_dir().to_path_buf());

    let sink = StatsSink::new(&dir);
    let records = sink
        .read_all()
        .with_context(|| format!("Failed to read stats from {}", dir.display()))?;

    info!(dir = %dir.display(), count = records.len(), "Collected stats records");

    let mut succeeded = 0;
    for record in &records {
        match record.status {
            RunStatus::Success => {
                succeeded += 1;
                info!(
                    model = %record.model_name,
                    duration_ns = record.duration_ns,
                    duration_ms = format!("{:.3}", record.duration_ns as f64 / 1_000_000.0),
                    cpu = %record.device_snapshot.cpu_description,
                    "✅ {}",
                    record.model_name
                );
            }
            RunStatus::Failure => {
                warn!(model = %record.model_name, "❌ {} failed on device", record.model_name);
            }
        }
    }
    info!(
        total = records.len(),
        succeeded,
        failed = records.len() - succeeded,
        "Summary"
    );

    for (name, check) in check_hashes(&records, &args.expectations) {
        match check {
            HashCheck::Match => info!(model = %name, "Hash verification successful"),
            HashCheck::Mismatch { expected, recorded } => warn!(
                model = %name,
                expected = %expected,
                recorded = %recorded,
                "Hash mismatch"
            ),
            HashCheck::Missing => error!(model = %name, "No stats record for model"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_nn_bench::types::record::DeviceSnapshot;

    fn record(name: &str, hash: &str) -> BenchmarkRecord {
        BenchmarkRecord::success(name.to_string(), hash.to_string(), 10, DeviceSnapshot::unknown(0.0))
    }

    #[test]
    fn test_parse_expectation() {
        assert_eq!(
            parse_expectation("AirNet=abc123").unwrap(),
            ("AirNet".to_string(), "abc123".to_string())
        );
        assert!(parse_expectation("AirNet").is_err());
        assert!(parse_expectation("=abc").is_err());
    }

    #[test]
    fn test_check_hashes() {
        let records = vec![record("AirNet", "abc"), record("ResNet50", "old")];
        let expectations = vec![
            ("AirNet".to_string(), "abc".to_string()),
            ("ResNet50".to_string(), "new".to_string()),
            ("MobileNetV2".to_string(), "x".to_string()),
        ];

        let checks = check_hashes(&records, &expectations);
        assert_eq!(checks["AirNet"], HashCheck::Match);
        assert_eq!(
            checks["ResNet50"],
            HashCheck::Mismatch {
                expected: "new".to_string(),
                recorded: "old".to_string()
            }
        );
        assert_eq!(checks["MobileNetV2"], HashCheck::Missing);
    }

    #[test]
    fn test_log_filter_includes_library() {
        let filter = log_filter().unwrap().to_string();
        assert!(filter.contains("collect_stats=info"));
        assert!(filter.contains("edge_nn_bench=info"));
    }
}
