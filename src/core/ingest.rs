use crate::core::cursor_store::CursorStore;
use crate::core::window::MonthWindow;
use crate::domain::model::{
    raw_object_path, unpartitioned_object_path, Cursor, PageQuery, Record, StreamKey,
};
use crate::domain::ports::{ObjectStore, PageFetcher, SchedulerControl, StateStore};
use crate::utils::error::Result;
use chrono::Utc;

/// Per-stream parameters of the ingestion state machine. The plain and
/// windowed job families differ only in these values.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub tenant: String,
    /// Name of the cursor document, e.g. `woocommerce_orders`.
    pub stream: String,
    /// Path segment between tenant and `Unprocessed`, e.g. `Orders`.
    pub category: String,
    /// Windowed streams walk calendar months from `epoch_year` forward and
    /// partition objects by the window; plain streams partition by each
    /// record's own timestamp.
    pub windowed: bool,
    pub page_size: u32,
    pub epoch_year: i32,
    pub id_field: String,
    pub timestamp_field: String,
    /// Plain streams only: pause the external trigger once the stream is
    /// exhausted instead of letting it refetch an empty tail forever.
    pub pause_on_exhausted: bool,
    /// Windowed streams only: pause the external trigger when a roll moves
    /// the window past the current month. Off by default, matching the
    /// walk-forever behavior the backfills always had.
    pub stop_at_present: bool,
}

impl StreamConfig {
    pub fn key(&self) -> StreamKey {
        StreamKey::new(self.tenant.clone(), self.stream.clone())
    }

    /// Name handed to the scheduler when pausing this stream's trigger.
    pub fn trigger_name(&self) -> String {
        format!("{}-{}", self.tenant, self.stream)
    }
}

/// Outcome of one invocation, for trigger-side logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// The page this invocation fetched.
    pub page: u32,
    pub fetched: usize,
    pub written: usize,
    /// Whether the terminal check fired (short page: reset, and for windowed
    /// streams a window roll).
    pub exhausted: bool,
}

/// One paginated, resumable ingestion stream.
///
/// Every invocation fetches exactly one page, writes each record as an
/// object, and advances the persisted cursor. A short page is the
/// end-of-stream signal (fetches are ascending by creation time, so a short
/// page can only be the last one): the cursor resets to page 0 and, for
/// windowed streams, the window rolls forward one calendar month.
///
/// Invocations for the same (tenant, stream) must not run concurrently: the
/// cursor is plain read-modify-write with no store-side atomicity. That
/// exclusion is owned by the trigger (one scheduler job per stream, queue
/// concurrency of one), not enforced here.
pub struct IngestJob<F, O, S, C> {
    fetcher: F,
    objects: O,
    cursors: CursorStore<S>,
    scheduler: C,
    config: StreamConfig,
}

impl<F, O, S, C> IngestJob<F, O, S, C>
where
    F: PageFetcher,
    O: ObjectStore,
    S: StateStore,
    C: SchedulerControl,
{
    pub fn new(fetcher: F, objects: O, state: S, scheduler: C, config: StreamConfig) -> Self {
        Self {
            fetcher,
            objects,
            cursors: CursorStore::new(state),
            scheduler,
            config,
        }
    }

    pub async fn run_once(&self) -> Result<IngestReport> {
        let key = self.config.key();
        let cursor = self.cursors.load(&key, self.config.epoch_year).await?;
        let page = cursor.page + 1;
        let window = self
            .config
            .windowed
            .then(|| MonthWindow::new(cursor.year, cursor.month));

        let query = PageQuery {
            page,
            page_size: self.config.page_size,
            after: window.as_ref().map(MonthWindow::start),
            before: window.as_ref().map(MonthWindow::end),
        };

        tracing::info!(
            tenant = %self.config.tenant,
            stream = %self.config.stream,
            page,
            month = window.map(|w| w.month),
            year = window.map(|w| w.year),
            "fetching page"
        );

        // A fetch failure propagates and leaves the cursor untouched; the
        // next trigger delivery retries the same page.
        let records = self.fetcher.fetch_page(&query).await?;
        let fetched = records.len();
        tracing::info!(fetched, page, "fetched records");

        let mut written = 0;
        for record in &records {
            if self.persist_record(record, window).await {
                written += 1;
            }
        }

        // The page was fetched, so the cursor advances past it even when some
        // records failed to persist and even when the page was empty.
        self.cursors.save(&key, Cursor { page, ..cursor }).await?;

        let exhausted = fetched < self.config.page_size as usize;
        if exhausted {
            self.finish_stream(&key, cursor, window).await?;
        }

        Ok(IngestReport {
            page,
            fetched,
            written,
            exhausted,
        })
    }

    /// Write one record to the object sink. Failures are logged and the
    /// record is dropped: cursor correctness outranks completeness of any
    /// one page, and the object write is an idempotent overwrite anyway if
    /// the page is ever refetched.
    async fn persist_record(&self, record: &Record, window: Option<MonthWindow>) -> bool {
        let Some(id) = record.id(&self.config.id_field) else {
            tracing::warn!(
                id_field = %self.config.id_field,
                "record is missing its id field, skipping"
            );
            return false;
        };

        let path = self.object_path(record, &id, window);
        let bytes = match serde_json::to_vec(record) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%id, error = %e, "failed to serialize record, skipping");
                return false;
            }
        };

        match self.objects.write(&path, &bytes).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%id, %path, error = %e, "error uploading record, skipping");
                false
            }
        }
    }

    /// Windowed streams land every record of a window in that window's
    /// partition, regardless of the record's own timestamp (timezone skew can
    /// put a record just outside its window). Plain streams partition by the
    /// record's timestamp and fall back to an unpartitioned path when it is
    /// missing or unparseable.
    fn object_path(&self, record: &Record, id: &str, window: Option<MonthWindow>) -> String {
        let partition = match window {
            Some(w) => Some((w.year, w.month)),
            None => record.created_year_month(&self.config.timestamp_field),
        };

        match partition {
            Some((year, month)) => {
                raw_object_path(&self.config.tenant, &self.config.category, year, month, id)
            }
            None => unpartitioned_object_path(&self.config.tenant, &self.config.category, id),
        }
    }

    async fn finish_stream(
        &self,
        key: &StreamKey,
        cursor: Cursor,
        window: Option<MonthWindow>,
    ) -> Result<()> {
        match window {
            Some(current) => {
                let next = current.succ();
                // Page reset and window roll are one document write, so the
                // next invocation observes both or neither.
                self.cursors
                    .save(
                        key,
                        Cursor {
                            page: 0,
                            month: next.month,
                            year: next.year,
                        },
                    )
                    .await?;
                tracing::info!(
                    tenant = %self.config.tenant,
                    stream = %self.config.stream,
                    "window {}-{} complete, rolling to {}-{}",
                    current.year,
                    current.month,
                    next.year,
                    next.month
                );

                if self.config.stop_at_present && next.starts_after(Utc::now().date_naive()) {
                    tracing::info!(
                        tenant = %self.config.tenant,
                        stream = %self.config.stream,
                        "backfill caught up to the present, pausing trigger"
                    );
                    self.scheduler.pause(&self.config.trigger_name()).await?;
                }
            }
            None => {
                self.cursors.save(key, Cursor { page: 0, ..cursor }).await?;
                tracing::info!(
                    tenant = %self.config.tenant,
                    stream = %self.config.stream,
                    "stream exhausted, cursor reset"
                );

                if self.config.pause_on_exhausted {
                    self.scheduler.pause(&self.config.trigger_name()).await?;
                }
            }
        }
        Ok(())
    }
}
