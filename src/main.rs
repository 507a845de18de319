use anyhow::Context;
use chrono::Datelike;
use clap::Parser;
use storefront_etl::adapters::{self, LoggingScheduler};
use storefront_etl::config::{CliConfig, JobCommand};
use storefront_etl::core::ingest::IngestJob;
use storefront_etl::core::transform::SummaryJob;
use storefront_etl::utils::{logger, validation::Validate};
use storefront_etl::{EtlConfig, LocalObjectStore, LocalStateStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting storefront-etl");

    let config = EtlConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config))?;
    config.validate().context("configuration validation failed")?;

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data_dir().to_string());
    let objects = LocalObjectStore::new(format!("{data_dir}/objects"));
    let state = LocalStateStore::new(format!("{data_dir}/state"));

    match &cli.command {
        JobCommand::Ingest { tenant, stream } => {
            let tenant_config = config.tenant(tenant)?;
            let section = tenant_config.stream(stream)?;
            let fetcher = adapters::for_tenant(tenant_config)?;

            let job = IngestJob::new(
                fetcher,
                objects,
                state,
                LoggingScheduler,
                section.to_stream_config(tenant_config),
            );
            let report = job.run_once().await.context("ingestion invocation failed")?;

            println!(
                "page {}: fetched {}, wrote {}{}",
                report.page,
                report.fetched,
                report.written,
                if report.exhausted {
                    " (stream exhausted)"
                } else {
                    ""
                }
            );
        }
        JobCommand::Summarize {
            tenant,
            stream,
            year,
            month,
        } => {
            let tenant_config = config.tenant(tenant)?;
            let section = tenant_config.stream(stream)?;

            let today = chrono::Utc::now();
            let year = year.unwrap_or_else(|| today.year());
            let month = month.unwrap_or_else(|| today.month());

            let job = SummaryJob::new(
                objects,
                state,
                config.fee_schedule(),
                section.to_summary_config(tenant_config),
            );
            let report = job
                .run_once(year, month)
                .await
                .context("summary invocation failed")?;

            println!(
                "summarized {} of {} objects, watermark at {}",
                report.summarized,
                report.scanned,
                if report.watermark.is_empty() {
                    "<start>"
                } else {
                    &report.watermark
                }
            );
        }
    }

    Ok(())
}
