use std::sync::Arc;

use activity_core::errors::Result;
use activity_protocol::entity::{Entity, MembershipInfo, UserSummary};
use activity_protocol::history::HistoryEntry;
use activity_protocol::timeline::ExtraData;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::fanout::FanOut;
use crate::writer::TimelineSink;

/// Entry points called by the host application after tracked mutations.
#[derive(Clone)]
pub struct TimelineHooks {
    fanout: FanOut,
    sink: Arc<dyn TimelineSink>,
}

impl TimelineHooks {
    pub fn new(fanout: FanOut, sink: Arc<dyn TimelineSink>) -> Self {
        Self { fanout, sink }
    }

    /// Records a history snapshot. Returns `false` when the snapshot is skipped
    /// (hidden changes and project imports).
    #[instrument(skip_all, fields(kind = ?entry.kind, actor = entry.actor_id))]
    pub async fn on_history_entry(&self, entry: &HistoryEntry) -> Result<bool> {
        if entry.importing || entry.is_hidden {
            debug!("history entry skipped");
            return Ok(false);
        }

        let mut extra = ExtraData::new();
        extra.insert(
            "values_diff".into(),
            Value::Object(entry.values_diff.clone()),
        );
        extra.insert("user".into(), json!({ "id": entry.actor_id }));
        extra.insert("comment".into(), Value::String(entry.comment.clone()));
        extra.insert(
            "comment_html".into(),
            Value::String(entry.comment_html.clone()),
        );

        self.fanout
            .push_to_timelines(
                self.sink.as_ref(),
                entry.entity.project_id(),
                entry.actor_id,
                &entry.entity,
                entry.kind.event_type(),
                &extra,
            )
            .await?;
        Ok(true)
    }

    /// New memberships are announced for the invited user; moving a membership to
    /// another user announces it for the new user and retracts it for the old one.
    pub async fn on_membership_saved(
        &self,
        previous: Option<&MembershipInfo>,
        current: &MembershipInfo,
    ) -> Result<()> {
        let previous_user = previous.and_then(member_id);
        let current_user = member_id(current);

        match previous {
            None => {
                if current_user.is_some() {
                    self.membership_event(current, "create").await?;
                }
            }
            Some(previous) if previous_user != current_user => {
                if current_user.is_some() {
                    self.membership_event(current, "create").await?;
                }
                if previous_user.is_some() {
                    self.membership_event(previous, "delete").await?;
                }
            }
            Some(_) => {}
        }
        Ok(())
    }

    pub async fn on_membership_deleted(&self, membership: &MembershipInfo) -> Result<()> {
        if member_id(membership).is_some() {
            self.membership_event(membership, "delete").await?;
        }
        Ok(())
    }

    pub async fn on_user_created(&self, user: &UserSummary) -> Result<()> {
        let source = Entity::User(user.clone());
        let actor = source.object_ref()?.id;
        self.fanout
            .push_to_timelines(
                self.sink.as_ref(),
                None,
                actor,
                &source,
                "create",
                &ExtraData::new(),
            )
            .await
    }

    async fn membership_event(&self, membership: &MembershipInfo, event_type: &str) -> Result<()> {
        let Some(user_id) = member_id(membership) else {
            return Ok(());
        };
        let source = Entity::Membership(membership.clone());
        self.fanout
            .push_to_timelines(
                self.sink.as_ref(),
                source.project_id(),
                user_id,
                &source,
                event_type,
                &ExtraData::new(),
            )
            .await
    }
}

fn member_id(membership: &MembershipInfo) -> Option<i64> {
    membership.user.as_ref().and_then(|user| user.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MemoryDirectory;
    use crate::registry::Registry;
    use crate::store::{MemoryTimelineStore, TimelineStore};
    use crate::writer::TimelineWriter;
    use activity_protocol::entity::{ObjectRef, ProjectSummary, RoleSummary, TicketInfo};
    use activity_protocol::history::HistoryKind;

    fn hooks() -> (TimelineHooks, MemoryTimelineStore) {
        let store = MemoryTimelineStore::new();
        let writer = TimelineWriter::new(Arc::new(Registry::with_defaults()), Arc::new(store.clone()));
        let fanout = FanOut::new(Arc::new(MemoryDirectory::new()));
        (TimelineHooks::new(fanout, Arc::new(writer)), store)
    }

    fn project() -> ProjectSummary {
        ProjectSummary {
            id: Some(1),
            slug: "ops".into(),
            name: "Ops".into(),
            ..Default::default()
        }
    }

    fn membership(user: Option<i64>) -> MembershipInfo {
        MembershipInfo {
            id: Some(8),
            project: project(),
            user: user.map(|id| UserSummary {
                id: Some(id),
                username: format!("user{id}"),
            }),
            role: RoleSummary {
                id: 2,
                name: "Dev".into(),
            },
            is_owner: false,
        }
    }

    fn task() -> Entity {
        Entity::Task(TicketInfo {
            id: Some(5),
            reference: 12,
            subject: "rotate keys".into(),
            project: project(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn hidden_and_imported_history_is_skipped() {
        let (hooks, store) = hooks();
        let mut hidden = HistoryEntry::new(HistoryKind::Change, task(), 3);
        hidden.is_hidden = true;
        let mut imported = HistoryEntry::new(HistoryKind::Create, task(), 3);
        imported.importing = true;

        assert!(!hooks.on_history_entry(&hidden).await.unwrap());
        assert!(!hooks.on_history_entry(&imported).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn history_entry_carries_diff_and_comment() {
        let (hooks, store) = hooks();
        let entry = HistoryEntry::new(HistoryKind::Change, task(), 3)
            .with_diff("status", json!("new"), json!("done"))
            .with_comment("finally");

        assert!(hooks.on_history_entry(&entry).await.unwrap());

        let feed = store.fetch(&ObjectRef::project(1), None).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].event_type, "tasks.task.change");
        assert_eq!(feed[0].payload["values_diff"]["status"], json!(["new", "done"]));
        assert_eq!(feed[0].payload["comment"], "finally");
        assert_eq!(feed[0].payload["user"], json!({"id": 3}));
    }

    #[tokio::test]
    async fn membership_user_change_creates_and_deletes() {
        let (hooks, store) = hooks();
        let before = membership(Some(4));
        let after = membership(Some(6));

        hooks.on_membership_saved(Some(&before), &after).await.unwrap();

        let new_member = store.fetch(&ObjectRef::user(6), None).await.unwrap();
        assert_eq!(new_member[0].event_type, "projects.membership.create");
        let old_member = store.fetch(&ObjectRef::user(4), None).await.unwrap();
        assert_eq!(old_member[0].event_type, "projects.membership.delete");
    }

    #[tokio::test]
    async fn pending_invitations_and_unchanged_users_write_nothing() {
        let (hooks, store) = hooks();
        hooks.on_membership_saved(None, &membership(None)).await.unwrap();
        hooks
            .on_membership_saved(Some(&membership(Some(4))), &membership(Some(4)))
            .await
            .unwrap();
        hooks.on_membership_deleted(&membership(None)).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn user_creation_lands_on_own_feed_only() {
        let (hooks, store) = hooks();
        hooks
            .on_user_created(&UserSummary {
                id: Some(9),
                username: "morpheus".into(),
            })
            .await
            .unwrap();
        let feed = store.all();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].owner, ObjectRef::user(9));
        assert_eq!(feed[0].project_id, None);
    }
}
