use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifies one independent ingestion stream: a (tenant, data-category)
/// pair. Each stream owns exactly one cursor document and one watermark
/// document in the state store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamKey {
    pub tenant: String,
    pub stream: String,
}

impl StreamKey {
    pub fn new(tenant: impl Into<String>, stream: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            stream: stream.into(),
        }
    }

    /// State-store key of the ingestion cursor document.
    pub fn cursor_key(&self) -> String {
        format!("{}-processing_state/{}", self.tenant, self.stream)
    }

    /// State-store key of the summary transform's watermark document.
    pub fn watermark_key(&self) -> String {
        format!("{}-processing_state/{}_summary", self.tenant, self.stream)
    }
}

/// Persisted resumption state for one stream.
///
/// `page` is always "last successfully processed page", so the next fetch
/// requests `page + 1`. `month`/`year` are only meaningful for windowed
/// streams and only change on window exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "last_processed_page")]
    pub page: u32,
    #[serde(rename = "last_processed_month")]
    pub month: u32,
    #[serde(rename = "last_processed_year")]
    pub year: i32,
}

impl Cursor {
    /// The start-of-stream cursor used when no document exists yet.
    pub fn starting(epoch_year: i32) -> Self {
        Self {
            page: 0,
            month: 1,
            year: epoch_year,
        }
    }
}

/// Lexicographic "last fully processed object path" marker for the summary
/// transform. Distinct from the Cursor but persisted the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    #[serde(rename = "last_processed_object")]
    pub last_processed_object: String,
}

/// One vendor order or shipment, kept as the opaque JSON object the vendor
/// returned. Which fields carry the id and creation timestamp varies per
/// vendor, so access is by configured field name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Record {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(data) => Some(Self { data }),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Record id rendered as a path segment. Numeric ids keep their bare
    /// form (`12345`, not `"12345"`).
    pub fn id(&self, id_field: &str) -> Option<String> {
        match self.data.get(id_field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// (year, month) of the record's own creation timestamp, in the
    /// timestamp's local offset. Vendors disagree on format: WooCommerce and
    /// Shopify send RFC 3339, ShipStation sends a naive
    /// `%Y-%m-%dT%H:%M:%S%.f`.
    pub fn created_year_month(&self, timestamp_field: &str) -> Option<(i32, u32)> {
        let raw = self.data.get(timestamp_field)?.as_str()?;
        parse_vendor_timestamp(raw).map(|(y, m)| (y, m))
    }
}

pub fn parse_vendor_timestamp(raw: &str) -> Option<(i32, u32)> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some((dt.year(), dt.month()));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some((dt.year(), dt.month()));
    }
    None
}

/// One page request against a vendor API. Ascending order by creation time
/// is a fixed invariant of every job: it is what makes a short page a
/// reliable end-of-stream signal. Adapters must translate it, never drop it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub page_size: u32,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

/// Raw-object path: `{tenant}/{category}/Unprocessed/{year}/{month}/{id}.json`.
/// Month and year are plain integers with no zero padding; downstream
/// consumers depend on this exact shape.
pub fn raw_object_path(tenant: &str, category: &str, year: i32, month: u32, id: &str) -> String {
    format!("{tenant}/{category}/Unprocessed/{year}/{month}/{id}.json")
}

/// Fallback path for records without a usable timestamp.
pub fn unpartitioned_object_path(tenant: &str, category: &str, id: &str) -> String {
    format!("{tenant}/{category}/Unprocessed/{id}.json")
}

/// Listing prefix for one month partition, trailing slash included.
pub fn month_prefix(tenant: &str, category: &str, year: i32, month: u32) -> String {
    format!("{tenant}/{category}/Unprocessed/{year}/{month}/")
}

/// Derived-summary path for a raw object: `Unprocessed` becomes
/// `Processed/Finance` and the extension becomes `.csv`.
pub fn summary_object_path(raw_path: &str) -> String {
    let moved = raw_path.replacen("Unprocessed", "Processed/Finance", 1);
    match moved.strip_suffix(".json") {
        Some(stem) => format!("{stem}.csv"),
        None => format!("{moved}.csv"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cursor_starting_matches_defaults() {
        let cursor = Cursor::starting(2023);
        assert_eq!(
            cursor,
            Cursor {
                page: 0,
                month: 1,
                year: 2023
            }
        );
    }

    #[test]
    fn cursor_round_trips_document_field_names() {
        let cursor = Cursor {
            page: 7,
            month: 4,
            year: 2024,
        };
        let doc = serde_json::to_value(cursor).unwrap();
        assert_eq!(doc["last_processed_page"], 7);
        assert_eq!(doc["last_processed_month"], 4);
        assert_eq!(doc["last_processed_year"], 2024);
        let back: Cursor = serde_json::from_value(doc).unwrap();
        assert_eq!(back, cursor);
    }

    #[test]
    fn raw_path_has_no_zero_padding() {
        let path = raw_object_path("iheartdogs", "Orders", 2023, 4, "98765");
        assert_eq!(path, "iheartdogs/Orders/Unprocessed/2023/4/98765.json");
    }

    #[test]
    fn summary_path_rewrites_stage_and_extension() {
        let raw = "iheartdogs/Orders/Unprocessed/2023/4/98765.json";
        assert_eq!(
            summary_object_path(raw),
            "iheartdogs/Orders/Processed/Finance/2023/4/98765.csv"
        );
    }

    #[test]
    fn record_id_renders_numbers_bare() {
        let rec = Record::from_value(json!({"id": 42})).unwrap();
        assert_eq!(rec.id("id").as_deref(), Some("42"));

        let rec = Record::from_value(json!({"orderNumber": "A-100"})).unwrap();
        assert_eq!(rec.id("orderNumber").as_deref(), Some("A-100"));

        let rec = Record::from_value(json!({"id": null})).unwrap();
        assert_eq!(rec.id("id"), None);
    }

    #[test]
    fn created_year_month_accepts_both_vendor_formats() {
        let rfc = Record::from_value(json!({"date_created": "2024-02-29T10:15:00-07:00"})).unwrap();
        assert_eq!(rfc.created_year_month("date_created"), Some((2024, 2)));

        let naive = Record::from_value(json!({"createDate": "2023-11-03T08:30:00.5000000"})).unwrap();
        assert_eq!(naive.created_year_month("createDate"), Some((2023, 11)));

        let bad = Record::from_value(json!({"createDate": "yesterday"})).unwrap();
        assert_eq!(bad.created_year_month("createDate"), None);

        let missing = Record::from_value(json!({"id": 1})).unwrap();
        assert_eq!(missing.created_year_month("createDate"), None);
    }

    #[test]
    fn stream_key_state_keys() {
        let key = StreamKey::new("cannanine", "woocommerce_orders");
        assert_eq!(
            key.cursor_key(),
            "cannanine-processing_state/woocommerce_orders"
        );
        assert_eq!(
            key.watermark_key(),
            "cannanine-processing_state/woocommerce_orders_summary"
        );
    }
}
