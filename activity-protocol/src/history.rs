use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::Entity;

/// Kind of change captured by a history snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Create,
    Change,
    Delete,
}

impl HistoryKind {
    pub fn event_type(self) -> &'static str {
        match self {
            HistoryKind::Create => "create",
            HistoryKind::Change => "change",
            HistoryKind::Delete => "delete",
        }
    }
}

/// A history snapshot taken by the host application after a tracked mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub entity: Entity,
    pub actor_id: i64,
    /// Field name to `[old, new]` pairs.
    #[serde(default)]
    pub values_diff: Map<String, Value>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub comment_html: String,
    #[serde(default)]
    pub is_hidden: bool,
    /// Set while bulk-importing projects; such snapshots never reach timelines.
    #[serde(default)]
    pub importing: bool,
}

impl HistoryEntry {
    pub fn new(kind: HistoryKind, entity: Entity, actor_id: i64) -> Self {
        Self {
            kind,
            entity,
            actor_id,
            values_diff: Map::new(),
            comment: String::new(),
            comment_html: String::new(),
            is_hidden: false,
            importing: false,
        }
    }

    pub fn with_diff(mut self, field: &str, old: Value, new: Value) -> Self {
        self.values_diff
            .insert(field.to_string(), Value::Array(vec![old, new]));
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}
