pub mod shipstation;
pub mod shopify;
pub mod woocommerce;

pub use shipstation::ShipStationFetcher;
pub use shopify::ShopifyFetcher;
pub use woocommerce::WooCommerceFetcher;

use crate::config::toml_config::{Platform, TenantConfig};
use crate::domain::ports::{PageFetcher, SchedulerControl};
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use async_trait::async_trait;

/// Build the vendor fetcher for a configured tenant.
pub fn for_tenant(tenant: &TenantConfig) -> Result<Box<dyn PageFetcher>> {
    match tenant.platform {
        Platform::Woocommerce => {
            let key = validate_required_field("consumer_key", &tenant.consumer_key)?;
            let secret = validate_required_field("consumer_secret", &tenant.consumer_secret)?;
            Ok(Box::new(WooCommerceFetcher::new(
                tenant.base_url.as_str(),
                key.as_str(),
                secret.as_str(),
            )?))
        }
        Platform::Shopify => {
            let token = validate_required_field("access_token", &tenant.access_token)?;
            let version = tenant
                .api_version
                .as_deref()
                .unwrap_or(shopify::DEFAULT_API_VERSION);
            Ok(Box::new(ShopifyFetcher::new(
                tenant.base_url.as_str(),
                token.as_str(),
                version,
            )?))
        }
        Platform::Shipstation => {
            let authorization = validate_required_field("authorization_key", &tenant.authorization_key)?;
            let store_id = validate_required_field("store_id", &tenant.store_id)?;
            Ok(Box::new(ShipStationFetcher::new(
                tenant.base_url.as_str(),
                authorization.as_str(),
                store_id.as_str(),
            )?))
        }
    }
}

/// Scheduler adapter for environments where the trigger is operated by hand
/// (CLI runs, tests): records the pause request in the log and nothing else.
/// Production deployments wire the real trigger control here.
#[derive(Debug, Clone, Default)]
pub struct LoggingScheduler;

#[async_trait]
impl SchedulerControl for LoggingScheduler {
    async fn pause(&self, job_name: &str) -> Result<()> {
        tracing::info!(%job_name, "pause requested for trigger (no scheduler attached)");
        Ok(())
    }
}
