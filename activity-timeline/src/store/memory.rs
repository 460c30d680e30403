use std::sync::Arc;

use activity_core::errors::Result;
use activity_protocol::entity::ObjectRef;
use activity_protocol::timeline::{NewTimelineEntry, TimelineEntry};
use async_trait::async_trait;
use parking_lot::RwLock;

use super::TimelineStore;

#[derive(Default)]
struct MemoryState {
    entries: Vec<TimelineEntry>,
    next_id: i64,
    batch_sizes: Vec<usize>,
}

impl MemoryState {
    fn assign(&mut self, entry: NewTimelineEntry) -> TimelineEntry {
        self.next_id += 1;
        let stored = entry.into_entry(self.next_id);
        self.entries.push(stored.clone());
        stored
    }
}

/// In-memory timeline store used by tests and local tooling.
#[derive(Default, Clone)]
pub struct MemoryTimelineStore {
    inner: Arc<RwLock<MemoryState>>,
}

impl MemoryTimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sizes of every batched write, in call order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.inner.read().batch_sizes.clone()
    }

    /// Every stored row in insertion order.
    pub fn all(&self) -> Vec<TimelineEntry> {
        self.inner.read().entries.clone()
    }
}

#[async_trait]
impl TimelineStore for MemoryTimelineStore {
    async fn insert(&self, entry: NewTimelineEntry) -> Result<TimelineEntry> {
        Ok(self.inner.write().assign(entry))
    }

    async fn insert_batch(&self, entries: Vec<NewTimelineEntry>) -> Result<u64> {
        let mut inner = self.inner.write();
        let count = entries.len();
        inner.entries.reserve(count);
        for entry in entries {
            inner.assign(entry);
        }
        inner.batch_sizes.push(count);
        Ok(count as u64)
    }

    async fn fetch(&self, owner: &ObjectRef, namespace: Option<&str>) -> Result<Vec<TimelineEntry>> {
        let inner = self.inner.read();
        let mut entries: Vec<TimelineEntry> = inner
            .entries
            .iter()
            .filter(|entry| entry.owner == *owner)
            .filter(|entry| namespace.map_or(true, |ns| entry.namespace == ns))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_protocol::entity::EntityType;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn new_entry(owner: ObjectRef, namespace: &str, minute: i64) -> NewTimelineEntry {
        NewTimelineEntry {
            owner,
            namespace: namespace.to_string(),
            event_type: "tasks.task.create".into(),
            project_id: None,
            payload: json!({}),
            payload_type: EntityType::Task,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minute),
        }
    }

    #[tokio::test]
    async fn fetch_orders_newest_first_with_id_tiebreak() {
        let store = MemoryTimelineStore::new();
        let owner = ObjectRef::user(1);
        let a = store.insert(new_entry(owner, "default", 5)).await.unwrap();
        let b = store.insert(new_entry(owner, "default", 1)).await.unwrap();
        let c = store.insert(new_entry(owner, "default", 5)).await.unwrap();
        store.insert(new_entry(ObjectRef::user(2), "default", 9)).await.unwrap();

        let ids: Vec<i64> = store
            .fetch(&owner, None)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(ids, vec![c.id, a.id, b.id]);
    }

    #[tokio::test]
    async fn fetch_scopes_namespace_and_owner_kind() {
        let store = MemoryTimelineStore::new();
        store.insert(new_entry(ObjectRef::user(1), "user:1", 0)).await.unwrap();
        store.insert(new_entry(ObjectRef::user(1), "user:2", 0)).await.unwrap();
        store.insert(new_entry(ObjectRef::project(1), "project:1", 0)).await.unwrap();

        assert_eq!(store.fetch(&ObjectRef::user(1), Some("user:1")).await.unwrap().len(), 1);
        assert_eq!(store.fetch(&ObjectRef::user(1), None).await.unwrap().len(), 2);
        assert_eq!(store.fetch(&ObjectRef::project(1), None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn batches_are_recorded() {
        let store = MemoryTimelineStore::new();
        let owner = ObjectRef::user(1);
        let written = store
            .insert_batch((0..3).map(|m| new_entry(owner, "default", m)).collect())
            .await
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(store.batch_sizes(), vec![3]);
        assert_eq!(store.len(), 3);
    }
}
