use crate::domain::model::{Cursor, StreamKey, Watermark};
use crate::domain::ports::StateStore;
use crate::utils::error::Result;

/// Typed access to cursor and watermark documents on top of a raw
/// [`StateStore`].
///
/// Reads are lenient the way the original state documents were: a missing
/// document, or a document missing a field, falls back to the start-of-stream
/// value instead of failing. Writes always persist the full document, so a
/// page reset and a window roll land as one durable write.
pub struct CursorStore<S> {
    store: S,
}

impl<S: StateStore> CursorStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn load(&self, key: &StreamKey, epoch_year: i32) -> Result<Cursor> {
        let starting = Cursor::starting(epoch_year);
        let Some(doc) = self.store.get(&key.cursor_key()).await? else {
            tracing::info!(
                tenant = %key.tenant,
                stream = %key.stream,
                "no existing cursor, starting from the beginning"
            );
            return Ok(starting);
        };

        Ok(Cursor {
            page: doc
                .get("last_processed_page")
                .and_then(|v| v.as_u64())
                .unwrap_or(u64::from(starting.page)) as u32,
            month: doc
                .get("last_processed_month")
                .and_then(|v| v.as_u64())
                .unwrap_or(u64::from(starting.month)) as u32,
            year: doc
                .get("last_processed_year")
                .and_then(|v| v.as_i64())
                .unwrap_or(i64::from(starting.year)) as i32,
        })
    }

    pub async fn save(&self, key: &StreamKey, cursor: Cursor) -> Result<()> {
        self.store
            .set(&key.cursor_key(), serde_json::to_value(cursor)?)
            .await
    }

    pub async fn load_watermark(&self, key: &StreamKey) -> Result<Watermark> {
        let Some(doc) = self.store.get(&key.watermark_key()).await? else {
            return Ok(Watermark::default());
        };

        Ok(Watermark {
            last_processed_object: doc
                .get("last_processed_object")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        })
    }

    pub async fn save_watermark(&self, key: &StreamKey, watermark: &Watermark) -> Result<()> {
        self.store
            .set(&key.watermark_key(), serde_json::to_value(watermark)?)
            .await
    }
}
