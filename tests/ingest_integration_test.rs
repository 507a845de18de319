use httpmock::prelude::*;
use storefront_etl::adapters::{self, LoggingScheduler};
use storefront_etl::core::ingest::IngestJob;
use storefront_etl::utils::validation::Validate;
use storefront_etl::{EtlConfig, LocalObjectStore, LocalStateStore};
use tempfile::TempDir;

fn config_for(server: &MockServer) -> EtlConfig {
    let toml = format!(
        r#"
        [fees]
        stripe = 2.9

        [[tenants]]
        name = "demo"
        platform = "woocommerce"
        base_url = "{}"
        consumer_key = "ck_test"
        consumer_secret = "cs_test"

        [[tenants.streams]]
        name = "woocommerce_orders"
        category = "Orders"
        windowed = true
        page_size = 2
        epoch_year = 2023
        "#,
        server.base_url()
    );
    let config = EtlConfig::from_toml_str(&toml).unwrap();
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn walks_pages_across_invocations_and_rolls_the_window() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let page_one = server.mock(|when, then| {
        when.method(GET)
            .path("/wp-json/wc/v3/orders")
            .query_param("page", "1")
            .query_param("per_page", "2")
            .query_param("order", "asc")
            .query_param("after", "2023-01-01T00:00:00Z")
            .query_param("before", "2023-01-31T23:59:59Z");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([
                {"id": 101, "date_created": "2023-01-05T08:00:00", "total": "10.00"},
                {"id": 102, "date_created": "2023-01-06T09:00:00", "total": "20.00"}
            ]));
    });
    let page_two = server.mock(|when, then| {
        when.method(GET)
            .path("/wp-json/wc/v3/orders")
            .query_param("page", "2");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([
                {"id": 103, "date_created": "2023-01-20T10:00:00", "total": "30.00"}
            ]));
    });

    let config = config_for(&server);
    let tenant = config.tenant("demo").unwrap();
    let section = tenant.stream("woocommerce_orders").unwrap();

    let objects = LocalObjectStore::new(temp_dir.path().join("objects"));
    let state = LocalStateStore::new(temp_dir.path().join("state"));
    let job = IngestJob::new(
        adapters::for_tenant(tenant).unwrap(),
        objects,
        state,
        LoggingScheduler,
        section.to_stream_config(tenant),
    );

    // First invocation: a full page, cursor moves to page 1.
    let report = job.run_once().await.unwrap();
    page_one.assert();
    assert_eq!(report.page, 1);
    assert_eq!(report.written, 2);
    assert!(!report.exhausted);

    let cursor_path = temp_dir
        .path()
        .join("state/demo-processing_state/woocommerce_orders.json");
    let doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&cursor_path).unwrap()).unwrap();
    assert_eq!(doc["last_processed_page"], 1);
    assert_eq!(doc["last_processed_month"], 1);
    assert_eq!(doc["last_processed_year"], 2023);

    // Second invocation: a short page, cursor resets and the window rolls.
    let report = job.run_once().await.unwrap();
    page_two.assert();
    assert_eq!(report.page, 2);
    assert!(report.exhausted);

    let doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&cursor_path).unwrap()).unwrap();
    assert_eq!(doc["last_processed_page"], 0);
    assert_eq!(doc["last_processed_month"], 2);
    assert_eq!(doc["last_processed_year"], 2023);

    // Raw objects land under the window's partition with exact paths.
    for id in [101, 102, 103] {
        let object_path = temp_dir
            .path()
            .join(format!("objects/demo/Orders/Unprocessed/2023/1/{id}.json"));
        assert!(object_path.exists(), "missing {object_path:?}");
    }
}

#[tokio::test]
async fn empty_months_roll_forward_one_per_invocation() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/wp-json/wc/v3/orders");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([]));
    });

    let config = config_for(&server);
    let tenant = config.tenant("demo").unwrap();
    let section = tenant.stream("woocommerce_orders").unwrap();

    let job = IngestJob::new(
        adapters::for_tenant(tenant).unwrap(),
        LocalObjectStore::new(temp_dir.path().join("objects")),
        LocalStateStore::new(temp_dir.path().join("state")),
        LoggingScheduler,
        section.to_stream_config(tenant),
    );

    for _ in 0..13 {
        job.run_once().await.unwrap();
    }

    // Thirteen empty windows starting at 2023-01: the cursor has crossed the
    // year boundary into 2024-02.
    let cursor_path = temp_dir
        .path()
        .join("state/demo-processing_state/woocommerce_orders.json");
    let doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&cursor_path).unwrap()).unwrap();
    assert_eq!(doc["last_processed_page"], 0);
    assert_eq!(doc["last_processed_month"], 2);
    assert_eq!(doc["last_processed_year"], 2024);
}

#[tokio::test]
async fn failed_fetch_leaves_state_for_identical_retry() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let failing = server.mock(|when, then| {
        when.method(GET).path("/wp-json/wc/v3/orders");
        then.status(500);
    });

    let config = config_for(&server);
    let tenant = config.tenant("demo").unwrap();
    let section = tenant.stream("woocommerce_orders").unwrap();

    let job = IngestJob::new(
        adapters::for_tenant(tenant).unwrap(),
        LocalObjectStore::new(temp_dir.path().join("objects")),
        LocalStateStore::new(temp_dir.path().join("state")),
        LoggingScheduler,
        section.to_stream_config(tenant),
    );

    assert!(job.run_once().await.is_err());
    failing.assert();

    // No cursor document was written: the next delivery retries page 1.
    let cursor_path = temp_dir
        .path()
        .join("state/demo-processing_state/woocommerce_orders.json");
    assert!(!cursor_path.exists());
}
