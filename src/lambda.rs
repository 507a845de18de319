#[cfg(feature = "lambda")]
use aws_config::BehaviorVersion;
#[cfg(feature = "lambda")]
use aws_sdk_s3::config::Region;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use chrono::Datelike;
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "lambda")]
use storefront_etl::adapters::{self, LoggingScheduler};
#[cfg(feature = "lambda")]
use storefront_etl::core::ingest::IngestJob;
#[cfg(feature = "lambda")]
use storefront_etl::core::transform::SummaryJob;
#[cfg(feature = "lambda")]
use storefront_etl::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use storefront_etl::{EtlConfig, LambdaConfig, S3ObjectStore, S3StateStore};

/// Trigger payload, mirroring the queue message that drove the original
/// functions. Fields fall back to environment variables so a bare scheduled
/// event works too.
#[cfg(feature = "lambda")]
#[derive(Deserialize)]
pub struct Request {
    pub site_name: Option<String>,
    pub stream: Option<String>,
    /// "ingest" (default) or "summarize"
    pub action: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[cfg(feature = "lambda")]
#[derive(Serialize)]
pub struct Response {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exhausted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summarized: Option<usize>,
}

#[cfg(feature = "lambda")]
fn event_or_env(value: Option<String>, var: &str) -> Option<String> {
    value.or_else(|| std::env::var(var).ok())
}

#[cfg(feature = "lambda")]
async fn function_handler(event: LambdaEvent<Request>) -> Result<Response, Error> {
    let lambda_config = LambdaConfig::from_env()?;
    let config = EtlConfig::from_file(&lambda_config.config_path)?;
    config.validate()?;

    let site_name = event_or_env(event.payload.site_name, "SITE_NAME")
        .ok_or_else(|| Error::from("event is missing site_name"))?;
    let stream = event_or_env(event.payload.stream, "STREAM")
        .ok_or_else(|| Error::from("event is missing stream"))?;
    let action = event_or_env(event.payload.action, "ACTION")
        .unwrap_or_else(|| "ingest".to_string());

    tracing::info!(%site_name, %stream, %action, "processing trigger event");

    let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_config = aws_sdk_s3::config::Builder::from(&aws)
        .region(Region::new(lambda_config.s3_region.clone()))
        .build();
    let s3 = S3Client::from_conf(s3_config);

    let objects = S3ObjectStore::new(s3.clone(), lambda_config.s3_bucket.clone());
    let state = S3StateStore::new(
        s3,
        lambda_config.s3_bucket.clone(),
        lambda_config.state_prefix.clone(),
    );

    let tenant = config.tenant(&site_name)?;
    let section = tenant.stream(&stream)?;

    match action.as_str() {
        "summarize" => {
            let today = chrono::Utc::now();
            let year = event.payload.year.unwrap_or_else(|| today.year());
            let month = event.payload.month.unwrap_or_else(|| today.month());

            let job = SummaryJob::new(
                objects,
                state,
                config.fee_schedule(),
                section.to_summary_config(tenant),
            );
            let report = job.run_once(year, month).await?;

            Ok(Response {
                message: format!("summarized {} objects", report.summarized),
                page: None,
                fetched: None,
                written: None,
                exhausted: None,
                summarized: Some(report.summarized),
            })
        }
        _ => {
            let fetcher = adapters::for_tenant(tenant)?;
            let job = IngestJob::new(
                fetcher,
                objects,
                state,
                LoggingScheduler,
                section.to_stream_config(tenant),
            );
            let report = job.run_once().await?;

            Ok(Response {
                message: format!(
                    "processed page {} ({} records)",
                    report.page, report.fetched
                ),
                page: Some(report.page),
                fetched: Some(report.fetched),
                written: Some(report.written),
                exhausted: Some(report.exhausted),
                summarized: None,
            })
        }
    }
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();
    run(service_fn(function_handler)).await
}
