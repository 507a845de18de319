pub mod cli;
pub mod lambda;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "storefront-etl")]
#[command(about = "Order and shipment ETL jobs for storefront platforms")]
pub struct CliConfig {
    /// Deployment configuration file
    #[arg(long, default_value = "etl.toml")]
    pub config: String,

    /// Root directory for the local object and state stores; defaults to the
    /// configuration file's data_dir
    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: JobCommand,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum JobCommand {
    /// Fetch one page of records and advance the stream's cursor
    Ingest {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        stream: String,
    },
    /// Summarize one month partition of raw objects into finance CSVs
    Summarize {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        stream: String,
        /// Partition year; defaults to the current year
        #[arg(long)]
        year: Option<i32>,
        /// Partition month; defaults to the current month
        #[arg(long)]
        month: Option<u32>,
    },
}
