use crate::domain::model::{PageQuery, Record};
use crate::utils::error::Result;
use async_trait::async_trait;

/// One page of records from a vendor API, ascending by creation time.
///
/// Transport and auth failures must propagate: the calling job treats a
/// failed fetch as fatal to the invocation and relies on trigger redelivery
/// for retry, so adapters do not retry or back off internally.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Record>>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Box<T> {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Record>> {
        (**self).fetch_page(query).await
    }
}

/// Blob-storage capability. `write` is an idempotent full overwrite keyed by
/// path; `list` returns paths under a prefix in lexicographic order, which
/// the summary transform's watermark scan depends on.
pub trait ObjectStore: Send + Sync {
    fn write(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn read(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    fn list(&self, prefix: &str) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

/// Small durable key-value documents (cursors, watermarks).
///
/// `get` returns `None` for an absent key; absence is a normal state, not an
/// error. `set` must be durable before it returns: the next invocation's
/// correctness depends on observing the write. The store provides no
/// atomicity across keys and no compare-and-swap; callers own the
/// read-modify-write cycle and must not run concurrently for the same key.
pub trait StateStore: Send + Sync {
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<serde_json::Value>>> + Send;

    fn set(
        &self,
        key: &str,
        document: serde_json::Value,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Pause the external trigger that drives a job. Invoked when a job reaches
/// a terminal condition (exhausted stream, or a backfill window that caught
/// up to the present). The real scheduler lives outside this crate.
#[async_trait]
pub trait SchedulerControl: Send + Sync {
    async fn pause(&self, job_name: &str) -> Result<()>;
}
