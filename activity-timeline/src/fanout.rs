use std::collections::BTreeSet;
use std::sync::Arc;

use activity_core::errors::Result;
use activity_protocol::entity::{Entity, ObjectRef};
use activity_protocol::timeline::{ExtraData, Namespace};
use tracing::debug;

use crate::providers::AccessProvider;
use crate::writer::TimelineSink;

/// Spreads one domain event over the feeds that should show it.
#[derive(Clone)]
pub struct FanOut {
    access: Arc<dyn AccessProvider>,
}

impl FanOut {
    pub fn new(access: Arc<dyn AccessProvider>) -> Self {
        Self { access }
    }

    /// Writes the event to the project feed, the actor's feed and every related person.
    ///
    /// Related people (assignee, watchers, project members) get the entry in the
    /// actor's namespace, so it shows on their profile feed but not on their own
    /// user feed.
    pub async fn push_to_timelines(
        &self,
        sink: &dyn TimelineSink,
        project_id: Option<i64>,
        actor_id: i64,
        source: &Entity,
        event_type: &str,
        extra: &ExtraData,
    ) -> Result<()> {
        let actor_namespace = Namespace::User(actor_id);

        if let Some(project_id) = project_id {
            sink.push(
                ObjectRef::project(project_id),
                source,
                event_type,
                &Namespace::Project(project_id),
                extra,
            )
            .await?;
        }

        sink.push(
            ObjectRef::user(actor_id),
            source,
            event_type,
            &actor_namespace,
            extra,
        )
        .await?;

        let related = self.related_people(project_id, actor_id, source).await?;
        debug!(
            actor = actor_id,
            related = related.len(),
            event_type,
            "fanning out timeline event"
        );
        for user_id in related {
            sink.push(
                ObjectRef::user(user_id),
                source,
                event_type,
                &actor_namespace,
                extra,
            )
            .await?;
        }

        Ok(())
    }

    async fn related_people(
        &self,
        project_id: Option<i64>,
        actor_id: i64,
        source: &Entity,
    ) -> Result<BTreeSet<i64>> {
        let mut related = BTreeSet::new();
        related.extend(source.assigned_to());
        related.extend(source.watchers().iter().copied());

        if let Some(project_id) = project_id {
            related.extend(self.access.project_member_ids(project_id).await?);
        }

        related.remove(&actor_id);
        Ok(related)
    }
}
