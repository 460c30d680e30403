use std::sync::Arc;

use activity_core::errors::Result;
use activity_protocol::entity::{Entity, ObjectRef};
use activity_protocol::timeline::{ExtraData, Namespace, TimelineEntry};
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::registry::Registry;
use crate::store::TimelineStore;

/// Destination for timeline rows produced by fan-out.
///
/// The live path writes through [`TimelineWriter`] (optionally dispatched in the
/// background); regeneration writes through [`crate::BulkWriter`].
#[async_trait]
pub trait TimelineSink: Send + Sync {
    async fn push(
        &self,
        owner: ObjectRef,
        source: &Entity,
        event_type: &str,
        namespace: &Namespace,
        extra: &ExtraData,
    ) -> Result<()>;
}

/// Builds timeline rows through the registry and persists them one by one.
#[derive(Clone)]
pub struct TimelineWriter {
    registry: Arc<Registry>,
    store: Arc<dyn TimelineStore>,
}

impl TimelineWriter {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn TimelineStore>) -> Self {
        Self { registry, store }
    }

    /// Records `source`'s event on `owner`'s feed. One durable write.
    pub async fn record(
        &self,
        owner: ObjectRef,
        source: &Entity,
        event_type: &str,
        namespace: &Namespace,
        extra: &ExtraData,
    ) -> Result<TimelineEntry> {
        let entry =
            self.registry
                .build_entry(owner, source, event_type, namespace, extra, Utc::now())?;
        let stored = self.store.insert(entry).await?;
        debug!(
            owner = %stored.owner,
            namespace = %stored.namespace,
            event_type = %stored.event_type,
            id = stored.id,
            "timeline entry recorded"
        );
        Ok(stored)
    }

    /// Records the same event on every owner's feed, in iteration order.
    pub async fn record_many<I>(
        &self,
        owners: I,
        source: &Entity,
        event_type: &str,
        namespace: &Namespace,
        extra: &ExtraData,
    ) -> Result<Vec<TimelineEntry>>
    where
        I: IntoIterator<Item = ObjectRef> + Send,
        I::IntoIter: Send,
    {
        let mut stored = Vec::new();
        for owner in owners {
            stored.push(
                self.record(owner, source, event_type, namespace, extra)
                    .await?,
            );
        }
        Ok(stored)
    }
}

#[async_trait]
impl TimelineSink for TimelineWriter {
    async fn push(
        &self,
        owner: ObjectRef,
        source: &Entity,
        event_type: &str,
        namespace: &Namespace,
        extra: &ExtraData,
    ) -> Result<()> {
        self.record(owner, source, event_type, namespace, extra)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTimelineStore;
    use activity_core::errors::TimelineError;
    use activity_protocol::entity::{ProjectSummary, TicketInfo, UserSummary};
    use serde_json::json;

    fn task(id: Option<i64>) -> Entity {
        Entity::Task(TicketInfo {
            id,
            reference: 1,
            subject: "write tests".into(),
            project: ProjectSummary {
                id: Some(1),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    fn writer(registry: Arc<Registry>) -> (TimelineWriter, MemoryTimelineStore) {
        let store = MemoryTimelineStore::new();
        (TimelineWriter::new(registry, Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn recorded_entry_is_fetchable() {
        let registry = Arc::new(Registry::new());
        registry
            .register("tasks.task", "test", |entity, _| Ok(json!(entity.id())))
            .unwrap();
        let (writer, store) = writer(registry);

        writer
            .record(
                ObjectRef::user(1),
                &task(Some(3)),
                "test",
                &Namespace::Default,
                &ExtraData::new(),
            )
            .await
            .unwrap();

        let entries = store.fetch(&ObjectRef::user(1), None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, "tasks.task.test");
        assert_eq!(entries[0].namespace, "default");
        assert_eq!(entries[0].payload, json!(3));
    }

    #[tokio::test]
    async fn unregistered_event_aborts_write() {
        let (writer, store) = writer(Arc::new(Registry::new()));
        let err = writer
            .record(
                ObjectRef::user(1),
                &task(Some(3)),
                "create",
                &Namespace::Default,
                &ExtraData::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TimelineError::UnregisteredEventType(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unsaved_source_is_invalid() {
        let (writer, store) = writer(Arc::new(Registry::with_defaults()));
        let err = writer
            .record(
                ObjectRef::user(1),
                &task(None),
                "create",
                &Namespace::Default,
                &ExtraData::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TimelineError::InvalidArgument(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn re_registered_extractor_is_used_for_later_writes() {
        let registry = Arc::new(Registry::new());
        registry
            .register("users.user", "test", |_, _| Ok(json!("v1")))
            .unwrap();
        let (writer, store) = writer(registry.clone());
        let user = Entity::User(UserSummary {
            id: Some(1),
            username: "ann".into(),
        });

        writer
            .record(ObjectRef::user(1), &user, "test", &Namespace::Default, &ExtraData::new())
            .await
            .unwrap();
        registry
            .register("users.user", "test", |_, _| Ok(json!("v2")))
            .unwrap();
        writer
            .record(ObjectRef::user(1), &user, "test", &Namespace::Default, &ExtraData::new())
            .await
            .unwrap();

        let payloads: Vec<_> = store.all().into_iter().map(|e| e.payload).collect();
        assert_eq!(payloads, vec![json!("v1"), json!("v2")]);
    }

    #[tokio::test]
    async fn record_many_writes_once_per_owner() {
        let (writer, store) = writer(Arc::new(Registry::with_defaults()));
        let owners = vec![ObjectRef::user(1), ObjectRef::user(2), ObjectRef::project(1)];
        let stored = writer
            .record_many(
                owners,
                &task(Some(4)),
                "change",
                &Namespace::Project(1),
                &ExtraData::new(),
            )
            .await
            .unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(store.fetch(&ObjectRef::user(2), None).await.unwrap().len(), 1);
    }
}
