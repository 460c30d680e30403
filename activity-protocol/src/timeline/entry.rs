use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::{EntityType, ObjectRef};

/// Contextual data passed to extractors alongside the source entity.
pub type ExtraData = Map<String, Value>;

/// Timeline row as persisted by a store. Never mutated after the write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEntry {
    pub id: i64,
    pub owner: ObjectRef,
    pub namespace: String,
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    pub payload: Value,
    pub payload_type: EntityType,
    pub created_at: DateTime<Utc>,
}

/// Timeline row built by a writer and not yet assigned an identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTimelineEntry {
    pub owner: ObjectRef,
    pub namespace: String,
    pub event_type: String,
    pub project_id: Option<i64>,
    pub payload: Value,
    pub payload_type: EntityType,
    pub created_at: DateTime<Utc>,
}

impl NewTimelineEntry {
    pub fn into_entry(self, id: i64) -> TimelineEntry {
        TimelineEntry {
            id,
            owner: self.owner,
            namespace: self.namespace,
            event_type: self.event_type,
            project_id: self.project_id,
            payload: self.payload,
            payload_type: self.payload_type,
            created_at: self.created_at,
        }
    }
}
