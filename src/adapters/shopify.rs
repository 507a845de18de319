use crate::domain::model::{PageQuery, Record};
use crate::domain::ports::PageFetcher;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_API_VERSION: &str = "2024-04";

#[derive(Debug, Deserialize)]
struct OrdersEnvelope {
    #[serde(default)]
    orders: Vec<serde_json::Value>,
}

/// Shopify-compatible admin API order fetcher, authenticated with a shop
/// access token.
pub struct ShopifyFetcher {
    client: Client,
    base_url: String,
    access_token: String,
    api_version: String,
}

impl ShopifyFetcher {
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.into(),
            access_token: access_token.into(),
            api_version: api_version.into(),
        })
    }
}

#[async_trait]
impl PageFetcher for ShopifyFetcher {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Record>> {
        let url = format!(
            "{}/admin/api/{}/orders.json",
            self.base_url.trim_end_matches('/'),
            self.api_version
        );

        let mut request = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .header("X-Shopify-Access-Token", &self.access_token)
            .query(&[
                ("status", "any".to_string()),
                ("limit", query.page_size.to_string()),
                ("page", query.page.to_string()),
                ("order", "created_at asc".to_string()),
            ]);
        if let Some(after) = query.after {
            request = request.query(&[(
                "created_at_min",
                after.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            )]);
        }
        if let Some(before) = query.before {
            request = request.query(&[(
                "created_at_max",
                before.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            )]);
        }

        tracing::debug!(%url, page = query.page, "requesting Shopify orders");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::UpstreamStatus {
                status: status.as_u16(),
                url,
            });
        }

        let envelope: OrdersEnvelope = response.json().await?;
        Ok(envelope
            .orders
            .into_iter()
            .filter_map(Record::from_value)
            .collect())
    }
}
