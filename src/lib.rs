pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3ObjectStore, S3StateStore};

pub use config::cli::{LocalObjectStore, LocalStateStore};
pub use config::toml_config::EtlConfig;
pub use core::ingest::{IngestJob, IngestReport, StreamConfig};
pub use core::transform::{SummaryConfig, SummaryJob, SummaryReport};
pub use utils::error::{EtlError, Result};
