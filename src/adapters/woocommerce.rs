use crate::domain::model::{PageQuery, Record};
use crate::domain::ports::PageFetcher;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// WooCommerce REST API (`wc/v3`) order fetcher. Authenticates with the
/// consumer key/secret pair over HTTP basic auth.
pub struct WooCommerceFetcher {
    client: Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
}

impl WooCommerceFetcher {
    pub fn new(
        base_url: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.into(),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        })
    }
}

#[async_trait]
impl PageFetcher for WooCommerceFetcher {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Record>> {
        let url = format!(
            "{}/wp-json/wc/v3/orders",
            self.base_url.trim_end_matches('/')
        );

        let mut request = self
            .client
            .get(&url)
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .query(&[
                ("page", query.page.to_string()),
                ("per_page", query.page_size.to_string()),
                ("order", "asc".to_string()),
                ("orderby", "date".to_string()),
            ]);
        if let Some(after) = query.after {
            request = request.query(&[("after", after.format("%Y-%m-%dT%H:%M:%SZ").to_string())]);
        }
        if let Some(before) = query.before {
            request = request.query(&[("before", before.format("%Y-%m-%dT%H:%M:%SZ").to_string())]);
        }

        tracing::debug!(%url, page = query.page, "requesting WooCommerce orders");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::UpstreamStatus {
                status: status.as_u16(),
                url,
            });
        }

        let items: Vec<serde_json::Value> = response.json().await?;
        Ok(items.into_iter().filter_map(Record::from_value).collect())
    }
}
