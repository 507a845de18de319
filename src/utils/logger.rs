use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Human-oriented compact output for one-shot CLI invocations.
pub fn init_cli_logger(verbose: bool) {
    let directive = if verbose {
        "storefront_etl=debug,info"
    } else {
        "storefront_etl=info"
    };

    tracing_subscriber::registry()
        .with(env_filter(directive))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();
}

/// JSON output for Lambda, where CloudWatch ingests one structured event per
/// line and the invocation log is the only failure channel the jobs have.
pub fn init_lambda_logger() {
    tracing_subscriber::registry()
        .with(env_filter("storefront_etl=info"))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .json(),
        )
        .init();
}
