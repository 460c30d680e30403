//! Durable storage for timeline entries.

mod memory;
mod postgres;

use activity_core::errors::Result;
use activity_protocol::entity::ObjectRef;
use activity_protocol::timeline::{NewTimelineEntry, TimelineEntry};
use async_trait::async_trait;

pub use memory::MemoryTimelineStore;
pub use postgres::PgTimelineStore;

/// Append-only store of timeline rows.
#[async_trait]
pub trait TimelineStore: Send + Sync {
    /// Persists one row and returns it with its assigned identity.
    async fn insert(&self, entry: NewTimelineEntry) -> Result<TimelineEntry>;

    /// Persists all rows in one batched write. Returns the number of rows written.
    async fn insert_batch(&self, entries: Vec<NewTimelineEntry>) -> Result<u64>;

    /// Rows of `owner`, optionally restricted to a namespace, newest first.
    ///
    /// Equal timestamps are ordered by descending identity.
    async fn fetch(&self, owner: &ObjectRef, namespace: Option<&str>) -> Result<Vec<TimelineEntry>>;
}
