use storefront_etl::core::transform::SummaryJob;
use storefront_etl::domain::model::raw_object_path;
use storefront_etl::domain::ports::ObjectStore;
use storefront_etl::utils::validation::Validate;
use storefront_etl::{EtlConfig, LocalObjectStore, LocalStateStore};
use tempfile::TempDir;

const CONFIG: &str = r#"
    [settings]
    fee_flat_surcharge = ["shopify_payments"]

    [fees]
    stripe = 2.9

    [[tenants]]
    name = "demo"
    platform = "woocommerce"
    base_url = "https://demo.example.com"
    consumer_key = "ck"
    consumer_secret = "cs"

    [[tenants.streams]]
    name = "woocommerce_orders"
    category = "Orders"
    windowed = true
    page_size = 20
"#;

fn order_body(id: u64, total: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "id": id,
        "status": "completed",
        "currency": "USD",
        "discount_total": "0.00",
        "shipping_total": "4.99",
        "total": total,
        "total_tax": "1.10",
        "customer_id": 7,
        "payment_method": "stripe",
        "date_created": "2023-01-05T08:00:00",
        "date_created_gmt": "2023-01-05T16:00:00",
        "meta_data": [
            {"key": "_wc_cog_order_total_cost", "value": "12.40"}
        ],
        "refunds": [
            {"total": "-5.00"}
        ]
    }))
    .unwrap()
}

#[tokio::test]
async fn summarizes_raw_objects_into_finance_csvs() {
    let temp_dir = TempDir::new().unwrap();
    let objects = LocalObjectStore::new(temp_dir.path().join("objects"));
    let state = LocalStateStore::new(temp_dir.path().join("state"));

    objects
        .write(
            &raw_object_path("demo", "Orders", 2023, 1, "101"),
            &order_body(101, "50.00"),
        )
        .await
        .unwrap();
    objects
        .write(
            &raw_object_path("demo", "Orders", 2023, 1, "102"),
            &order_body(102, "80.00"),
        )
        .await
        .unwrap();

    let config = EtlConfig::from_toml_str(CONFIG).unwrap();
    config.validate().unwrap();
    let tenant = config.tenant("demo").unwrap();
    let section = tenant.stream("woocommerce_orders").unwrap();

    let job = SummaryJob::new(
        objects,
        state,
        config.fee_schedule(),
        section.to_summary_config(tenant),
    );

    let report = job.run_once(2023, 1).await.unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.summarized, 2);

    let csv_path = temp_dir
        .path()
        .join("objects/demo/Orders/Processed/Finance/2023/1/101.csv");
    let text = std::fs::read_to_string(&csv_path).unwrap();
    let mut lines = text.lines();

    let header = lines.next().unwrap();
    assert!(header.starts_with("id,status,currency"));
    assert!(header.ends_with("total_cogs,total_refunds,transaction_cost"));

    let row = lines.next().unwrap();
    assert!(row.starts_with("101,completed,USD,0.00,4.99,50.00,1.10,7,stripe"));
    // 50.00 * 2.9% = 1.45, refunds reported as positive totals.
    assert!(row.ends_with("12.40,5,1.45"));

    // Watermark persisted: the last object of the partition.
    let watermark_path = temp_dir
        .path()
        .join("state/demo-processing_state/woocommerce_orders_summary.json");
    let doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&watermark_path).unwrap()).unwrap();
    assert_eq!(
        doc["last_processed_object"],
        "demo/Orders/Unprocessed/2023/1/102.json"
    );

    // A second invocation finds nothing new past the watermark.
    let again = job.run_once(2023, 1).await.unwrap();
    assert_eq!(again.scanned, 0);
    assert_eq!(
        again.watermark,
        "demo/Orders/Unprocessed/2023/1/102.json"
    );
}
