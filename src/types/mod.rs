//! Type definitions for benchmark records and classification reports

pub mod classification;
pub mod record;

pub use classification::{ClassificationEntry, ClassificationReport};
pub use record::{BenchmarkRecord, DeviceSnapshot, RunStatus, NOT_AVAILABLE};
