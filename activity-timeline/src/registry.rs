use std::collections::HashMap;
use std::sync::Arc;

use activity_core::errors::{Result, TimelineError};
use activity_protocol::entity::{Entity, EntityType, ObjectRef};
use activity_protocol::timeline::{ExtraData, Namespace, NewTimelineEntry};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;

use crate::extractors;

/// Turns a changed entity plus contextual data into a timeline payload.
pub type Extractor = Arc<dyn Fn(&Entity, &ExtraData) -> Result<Value> + Send + Sync>;

/// Derives the `<entity_type>.<event_type>` key, validating both halves.
pub fn event_key(entity_type: &str, event_type: &str) -> Result<String> {
    let kind: EntityType = entity_type.parse()?;
    kind.event_key(event_type)
}

/// Mapping from event type keys to payload extractors.
///
/// Filled once at startup and shared behind an `Arc`; lookups take a read lock only.
#[derive(Default)]
pub struct Registry {
    extractors: RwLock<HashMap<String, Extractor>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the stock extractors for every entity type and `create`/`change`/`delete`.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        extractors::register_defaults(&registry);
        registry
    }

    /// Stores `extractor` under `<entity_type>.<event_type>`, replacing any previous one.
    pub fn register<F>(&self, entity_type: &str, event_type: &str, extractor: F) -> Result<()>
    where
        F: Fn(&Entity, &ExtraData) -> Result<Value> + Send + Sync + 'static,
    {
        let key = event_key(entity_type, event_type)?;
        self.insert(key, Arc::new(extractor));
        Ok(())
    }

    /// Stores an extractor under an already validated key.
    pub(crate) fn insert(&self, key: String, extractor: Extractor) {
        self.extractors.write().insert(key, extractor);
    }

    pub fn resolve(&self, entity_type: &str, event_type: &str) -> Result<Extractor> {
        let key = event_key(entity_type, event_type)?;
        self.lookup(&key)
    }

    fn lookup(&self, key: &str) -> Result<Extractor> {
        self.extractors
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| TimelineError::UnregisteredEventType(key.to_string()))
    }

    /// Builds the row for `owner`'s feed without persisting it.
    pub fn build_entry(
        &self,
        owner: ObjectRef,
        source: &Entity,
        event_type: &str,
        namespace: &Namespace,
        extra: &ExtraData,
        created_at: DateTime<Utc>,
    ) -> Result<NewTimelineEntry> {
        owner.ensure_persisted()?;
        let source_ref = source.object_ref()?;
        let key = source_ref.kind.event_key(event_type)?;
        let extractor = self.lookup(&key)?;
        let payload = extractor(source, extra)?;

        Ok(NewTimelineEntry {
            owner,
            namespace: namespace.to_string(),
            event_type: key,
            project_id: source.project_id(),
            payload,
            payload_type: source_ref.kind,
            created_at,
        })
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.extractors.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.extractors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_protocol::entity::{ProjectSummary, TicketInfo};
    use serde_json::json;

    fn task() -> Entity {
        Entity::Task(TicketInfo {
            id: Some(5),
            reference: 40,
            subject: "ship it".into(),
            project: ProjectSummary {
                id: Some(2),
                slug: "p".into(),
                name: "P".into(),
                description: String::new(),
            },
            ..Default::default()
        })
    }

    #[test]
    fn key_derivation_validates_inputs() {
        assert_eq!(event_key("tasks.task", "test").unwrap(), "tasks.task.test");
        assert!(matches!(
            event_key("tasks.tusk", "test"),
            Err(TimelineError::InvalidArgument(_))
        ));
        assert!(matches!(
            event_key("tasks.task", ""),
            Err(TimelineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn missing_extractor_is_unregistered() {
        let registry = Registry::new();
        let err = registry.resolve("tasks.task", "create").err().unwrap();
        assert!(matches!(err, TimelineError::UnregisteredEventType(key) if key == "tasks.task.create"));
    }

    #[test]
    fn re_registration_overwrites() {
        let registry = Registry::new();
        registry
            .register("tasks.task", "test", |_, _| Ok(json!("first")))
            .unwrap();
        registry
            .register("tasks.task", "test", |_, _| Ok(json!("second")))
            .unwrap();

        assert_eq!(registry.len(), 1);
        let extractor = registry.resolve("tasks.task", "test").unwrap();
        assert_eq!(extractor(&task(), &ExtraData::new()).unwrap(), json!("second"));
    }

    #[test]
    fn builds_entry_with_project_and_key() {
        let registry = Registry::with_defaults();
        let entry = registry
            .build_entry(
                ObjectRef::user(1),
                &task(),
                "create",
                &Namespace::User(1),
                &ExtraData::new(),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(entry.event_type, "tasks.task.create");
        assert_eq!(entry.namespace, "user:1");
        assert_eq!(entry.project_id, Some(2));
        assert_eq!(entry.payload_type, EntityType::Task);
        assert_eq!(entry.payload["task"]["ref"], 40);
    }

    #[test]
    fn rejects_unsaved_owner() {
        let registry = Registry::with_defaults();
        let err = registry
            .build_entry(
                ObjectRef::user(0),
                &task(),
                "create",
                &Namespace::Default,
                &ExtraData::new(),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, TimelineError::InvalidArgument(_)));
    }

    #[test]
    fn defaults_cover_every_type() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.len(), EntityType::ALL.len() * 3);
        assert!(registry.keys().contains(&"wiki.wikilink.delete".to_string()));
    }

    #[test]
    fn default_keys_match_validated_derivation() {
        let registry = Registry::with_defaults();
        for kind in EntityType::ALL {
            for event in ["create", "change", "delete"] {
                assert!(registry.resolve(kind.type_name(), event).is_ok());
            }
        }
    }
}
