pub mod cursor_store;
pub mod finance;
pub mod ingest;
pub mod transform;
pub mod window;

pub use crate::domain::model::{Cursor, PageQuery, Record, StreamKey, Watermark};
pub use crate::domain::ports::{ObjectStore, PageFetcher, SchedulerControl, StateStore};
pub use crate::utils::error::Result;
