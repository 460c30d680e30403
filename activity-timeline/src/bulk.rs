use std::sync::Arc;

use activity_core::config::DEFAULT_BULK_BATCH_SIZE;
use activity_core::errors::{Result, TimelineError};
use activity_protocol::entity::{Entity, ObjectRef};
use activity_protocol::timeline::{ExtraData, Namespace, NewTimelineEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::registry::Registry;
use crate::store::TimelineStore;
use crate::writer::TimelineSink;

/// Counters describing the writes a [`BulkWriter`] performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkStats {
    pub batches: usize,
    pub rows: u64,
    pub buffered: usize,
}

struct BulkState {
    buffer: Vec<NewTimelineEntry>,
    created_at: Option<DateTime<Utc>>,
    batches: usize,
    rows: u64,
}

/// Buffering sink used by offline regeneration.
///
/// Entries carry an explicit, backdated `created_at` and are written in batches of
/// `batch_size`. One job owns a writer; it is not meant to be shared between jobs.
pub struct BulkWriter {
    registry: Arc<Registry>,
    store: Arc<dyn TimelineStore>,
    batch_size: usize,
    state: Mutex<BulkState>,
}

impl BulkWriter {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn TimelineStore>) -> Self {
        Self::with_batch_size(registry, store, DEFAULT_BULK_BATCH_SIZE)
    }

    pub fn with_batch_size(
        registry: Arc<Registry>,
        store: Arc<dyn TimelineStore>,
        batch_size: usize,
    ) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            registry,
            store,
            batch_size,
            state: Mutex::new(BulkState {
                buffer: Vec::with_capacity(batch_size),
                created_at: None,
                batches: 0,
                rows: 0,
            }),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Timestamp stamped on every entry buffered from now on.
    pub fn set_created_at(&self, created_at: DateTime<Utc>) {
        self.state.lock().created_at = Some(created_at);
    }

    pub fn stats(&self) -> BulkStats {
        let state = self.state.lock();
        BulkStats {
            batches: state.batches,
            rows: state.rows,
            buffered: state.buffer.len(),
        }
    }

    /// Buffers an already built entry, writing a batch once the buffer is full.
    pub async fn push_entry(&self, entry: NewTimelineEntry) -> Result<()> {
        let full = {
            let mut state = self.state.lock();
            state.buffer.push(entry);
            if state.buffer.len() >= self.batch_size {
                Some(std::mem::replace(
                    &mut state.buffer,
                    Vec::with_capacity(self.batch_size),
                ))
            } else {
                None
            }
        };

        match full {
            Some(batch) => self.write_batch(batch).await,
            None => Ok(()),
        }
    }

    /// Writes whatever is buffered. An empty buffer is not a batch.
    pub async fn flush(&self) -> Result<()> {
        let pending = std::mem::take(&mut self.state.lock().buffer);
        if pending.is_empty() {
            return Ok(());
        }
        self.write_batch(pending).await
    }

    async fn write_batch(&self, batch: Vec<NewTimelineEntry>) -> Result<()> {
        let size = batch.len();
        // The batch is moved into the store and dropped with the call.
        let written = self.store.insert_batch(batch).await?;

        let mut state = self.state.lock();
        state.batches += 1;
        state.rows += written;
        if size < self.batch_size {
            info!(batch = state.batches, rows = written, total = state.rows, "final timeline batch written");
        } else {
            debug!(batch = state.batches, rows = written, total = state.rows, "timeline batch written");
        }
        Ok(())
    }
}

#[async_trait]
impl TimelineSink for BulkWriter {
    async fn push(
        &self,
        owner: ObjectRef,
        source: &Entity,
        event_type: &str,
        namespace: &Namespace,
        extra: &ExtraData,
    ) -> Result<()> {
        let created_at = self.state.lock().created_at.ok_or_else(|| {
            TimelineError::invalid("bulk writes need an explicit created_at timestamp")
        })?;
        let mut entry =
            self.registry
                .build_entry(owner, source, event_type, namespace, extra, created_at)?;
        // Regenerated rows are not tied to a project.
        entry.project_id = None;
        self.push_entry(entry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTimelineStore;
    use activity_protocol::entity::UserSummary;
    use chrono::{Duration, TimeZone};

    fn user(id: i64) -> Entity {
        Entity::User(UserSummary {
            id: Some(id),
            username: format!("user{id}"),
        })
    }

    fn bulk(batch_size: usize) -> (BulkWriter, MemoryTimelineStore) {
        let store = MemoryTimelineStore::new();
        let writer = BulkWriter::with_batch_size(
            Arc::new(Registry::with_defaults()),
            Arc::new(store.clone()),
            batch_size,
        );
        (writer, store)
    }

    #[tokio::test]
    async fn push_without_timestamp_is_rejected() {
        let (writer, store) = bulk(10);
        let err = writer
            .push(ObjectRef::user(1), &user(1), "create", &Namespace::User(1), &ExtraData::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TimelineError::InvalidArgument(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn writes_full_batches_then_remainder() {
        let (writer, store) = bulk(1000);
        let base = Utc.with_ymd_and_hms(2014, 6, 1, 12, 0, 0).unwrap();

        for id in 1..=2500 {
            writer.set_created_at(base + Duration::seconds(id));
            writer
                .push(ObjectRef::user(id), &user(id), "create", &Namespace::User(id), &ExtraData::new())
                .await
                .unwrap();
        }
        assert_eq!(store.batch_sizes(), vec![1000, 1000]);
        assert_eq!(writer.stats().buffered, 500);

        writer.flush().await.unwrap();
        assert_eq!(store.batch_sizes(), vec![1000, 1000, 500]);
        assert_eq!(
            writer.stats(),
            BulkStats {
                batches: 3,
                rows: 2500,
                buffered: 0
            }
        );

        let entries = store.all();
        assert_eq!(entries.len(), 2500);
        assert!(entries
            .iter()
            .all(|entry| entry.created_at == base + Duration::seconds(entry.owner.id)));
    }

    #[tokio::test]
    async fn flushing_empty_buffer_is_a_noop() {
        let (writer, store) = bulk(2);
        writer.flush().await.unwrap();
        assert!(store.batch_sizes().is_empty());
        assert_eq!(writer.stats().batches, 0);
    }

    #[tokio::test]
    async fn bulk_rows_are_project_less() {
        let (writer, store) = bulk(1);
        writer.set_created_at(Utc::now());
        let project = Entity::Project(activity_protocol::entity::ProjectSummary {
            id: Some(4),
            ..Default::default()
        });
        writer
            .push(ObjectRef::project(4), &project, "create", &Namespace::Project(4), &ExtraData::new())
            .await
            .unwrap();
        assert_eq!(store.all()[0].project_id, None);
    }
}
