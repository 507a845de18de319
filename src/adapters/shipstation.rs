use crate::domain::model::{PageQuery, Record};
use crate::domain::ports::PageFetcher;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_BASE_URL: &str = "https://ssapi.shipstation.com";

#[derive(Debug, Deserialize)]
struct ShipmentsEnvelope {
    #[serde(default)]
    shipments: Vec<serde_json::Value>,
}

/// ShipStation shipments fetcher. The API takes a ready-made basic
/// authorization credential and date-only window bounds.
pub struct ShipStationFetcher {
    client: Client,
    base_url: String,
    authorization_key: String,
    store_id: String,
}

impl ShipStationFetcher {
    pub fn new(
        base_url: impl Into<String>,
        authorization_key: impl Into<String>,
        store_id: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.into(),
            authorization_key: authorization_key.into(),
            store_id: store_id.into(),
        })
    }
}

#[async_trait]
impl PageFetcher for ShipStationFetcher {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Record>> {
        let url = format!("{}/shipments", self.base_url.trim_end_matches('/'));

        let mut request = self
            .client
            .get(&url)
            .header("Authorization", format!("Basic {}", self.authorization_key))
            .query(&[
                ("storeId", self.store_id.clone()),
                ("page", query.page.to_string()),
                ("pageSize", query.page_size.to_string()),
                ("sortBy", "CreateDate".to_string()),
                ("sortDir", "ASC".to_string()),
                ("includeShipmentItems", "true".to_string()),
            ]);
        if let Some(after) = query.after {
            request = request.query(&[("shipDateStart", after.format("%Y-%m-%d").to_string())]);
        }
        if let Some(before) = query.before {
            request = request.query(&[("shipDateEnd", before.format("%Y-%m-%d").to_string())]);
        }

        tracing::debug!(%url, page = query.page, "requesting ShipStation shipments");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::UpstreamStatus {
                status: status.as_u16(),
                url,
            });
        }

        let envelope: ShipmentsEnvelope = response.json().await?;
        Ok(envelope
            .shipments
            .into_iter()
            .filter_map(Record::from_value)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn sends_store_window_and_basic_credential() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/shipments")
                .header("Authorization", "Basic c2VjcmV0")
                .query_param("storeId", "12345")
                .query_param("page", "1")
                .query_param("pageSize", "50")
                .query_param("sortBy", "CreateDate")
                .query_param("sortDir", "ASC")
                .query_param("shipDateStart", "2024-01-01")
                .query_param("shipDateEnd", "2024-01-31");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({
                    "shipments": [{"shipmentId": 9001, "orderNumber": "A-1"}]
                }));
        });

        let fetcher = ShipStationFetcher::new(server.base_url(), "c2VjcmV0", "12345").unwrap();
        let records = fetcher
            .fetch_page(&PageQuery {
                page: 1,
                page_size: 50,
                after: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                before: Some(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()),
            })
            .await
            .unwrap();

        mock.assert();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id("shipmentId").as_deref(), Some("9001"));
    }

    #[tokio::test]
    async fn auth_failure_propagates_as_upstream_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/shipments");
            then.status(401);
        });

        let fetcher = ShipStationFetcher::new(server.base_url(), "bad", "12345").unwrap();
        let err = fetcher
            .fetch_page(&PageQuery {
                page: 1,
                page_size: 50,
                after: None,
                before: None,
            })
            .await
            .unwrap_err();

        match err {
            EtlError::UpstreamStatus { status, .. } => assert_eq!(status, 401),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
