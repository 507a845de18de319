use crate::core::cursor_store::CursorStore;
use crate::core::finance::{self, FeeSchedule};
use crate::domain::model::{month_prefix, summary_object_path, Record, StreamKey, Watermark};
use crate::domain::ports::{ObjectStore, StateStore};
use crate::utils::error::Result;
use serde_json::{Map, Value};

/// Default columns of the finance summary, matching the WooCommerce order
/// export this transform grew out of.
pub const DEFAULT_SUMMARY_COLUMNS: &[&str] = &[
    "id",
    "status",
    "currency",
    "discount_total",
    "shipping_total",
    "total",
    "total_tax",
    "customer_id",
    "payment_method",
    "date_created_gmt",
    "date_modified_gmt",
    "date_completed_gmt",
    "date_paid_gmt",
    "date_created",
    "date_modified",
    "date_completed",
    "date_paid",
    "total_cogs",
    "total_refunds",
    "transaction_cost",
];

pub const DEFAULT_MAX_OBJECTS: usize = 1000;

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub tenant: String,
    pub stream: String,
    pub category: String,
    pub columns: Vec<String>,
    /// Upper bound on objects handled per invocation; the watermark makes
    /// the next invocation pick up where this one stopped.
    pub max_objects: usize,
}

impl SummaryConfig {
    pub fn key(&self) -> StreamKey {
        StreamKey::new(self.tenant.clone(), self.stream.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryReport {
    /// Objects past the watermark that this invocation visited.
    pub scanned: usize,
    /// Objects that produced a summary CSV.
    pub summarized: usize,
    pub watermark: String,
}

/// Second-pass transform: walks one month partition of raw JSON objects in
/// lexicographic order, resumes from a persisted watermark, and writes one
/// flattened CSV summary per object with the computed financial fields.
///
/// The watermark advances past every visited object, including ones that
/// fail to parse; a bad object is logged and lost rather than wedging the
/// scan on it forever.
pub struct SummaryJob<O, S> {
    objects: O,
    cursors: CursorStore<S>,
    fees: FeeSchedule,
    config: SummaryConfig,
}

impl<O, S> SummaryJob<O, S>
where
    O: ObjectStore,
    S: StateStore,
{
    pub fn new(objects: O, state: S, fees: FeeSchedule, config: SummaryConfig) -> Self {
        Self {
            objects,
            cursors: CursorStore::new(state),
            fees,
            config,
        }
    }

    pub async fn run_once(&self, year: i32, month: u32) -> Result<SummaryReport> {
        let key = self.config.key();
        let watermark = self.cursors.load_watermark(&key).await?;
        let prefix = month_prefix(&self.config.tenant, &self.config.category, year, month);

        let paths = self.objects.list(&prefix).await?;
        tracing::info!(
            tenant = %self.config.tenant,
            stream = %self.config.stream,
            %prefix,
            listed = paths.len(),
            "scanning partition"
        );

        let mut last = watermark.last_processed_object.clone();
        let mut scanned = 0;
        let mut summarized = 0;

        for path in paths {
            if path <= last {
                continue;
            }
            if scanned >= self.config.max_objects {
                break;
            }
            scanned += 1;

            match self.summarize_object(&path).await {
                Ok(()) => summarized += 1,
                Err(e) => {
                    tracing::warn!(%path, error = %e, "failed to summarize object, skipping");
                }
            }
            last = path;
        }

        self.cursors
            .save_watermark(
                &key,
                &Watermark {
                    last_processed_object: last.clone(),
                },
            )
            .await?;

        tracing::info!(scanned, summarized, watermark = %last, "partition scan complete");
        Ok(SummaryReport {
            scanned,
            summarized,
            watermark: last,
        })
    }

    async fn summarize_object(&self, path: &str) -> Result<()> {
        let bytes = self.objects.read(path).await?;
        let value: Value = serde_json::from_slice(&bytes)?;
        let Some(record) = Record::from_value(value) else {
            return Err(crate::utils::error::EtlError::StorageError {
                path: path.to_string(),
                message: "object is not a JSON document".to_string(),
            });
        };

        let csv = self.render_summary(&record)?;
        self.objects.write(&summary_object_path(path), &csv).await
    }

    fn render_summary(&self, record: &Record) -> Result<Vec<u8>> {
        let mut cells = flatten(&record.data);

        if let Some(cogs) = finance::order_total_cogs(record) {
            cells.insert("total_cogs".to_string(), cogs);
        }
        cells.insert(
            "total_refunds".to_string(),
            finance::total_refunds(record).to_string(),
        );

        let total = record
            .field("total")
            .map(finance::number_like)
            .unwrap_or(0.0);
        let method = record.field("payment_method").and_then(Value::as_str);
        cells.insert(
            "transaction_cost".to_string(),
            self.fees.transaction_cost(total, method).to_string(),
        );

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.config.columns)?;
        let row: Vec<String> = self
            .config
            .columns
            .iter()
            .map(|column| cells.get(column).cloned().unwrap_or_default())
            .collect();
        writer.write_record(&row)?;

        writer
            .into_inner()
            .map_err(|e| crate::utils::error::EtlError::CsvError(e.into_error().into()))
    }
}

/// Dot-notation flattening of a JSON object: nested objects contribute
/// `parent.child` columns, scalars become their text form (null is an empty
/// cell), and arrays keep their JSON text so nothing is silently dropped.
fn flatten(data: &Map<String, Value>) -> std::collections::HashMap<String, String> {
    let mut out = std::collections::HashMap::new();
    flatten_into(&mut out, None, data);
    out
}

fn flatten_into(
    out: &mut std::collections::HashMap<String, String>,
    prefix: Option<&str>,
    data: &Map<String, Value>,
) {
    for (field, value) in data {
        let column = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(out, Some(&column), nested),
            Value::Array(_) => {
                out.insert(column, value.to_string());
            }
            other => {
                out.insert(column, finance::cell_text(other));
            }
        }
    }
}
