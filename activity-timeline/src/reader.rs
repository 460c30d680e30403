use std::sync::Arc;

use activity_core::errors::Result;
use activity_protocol::access::Viewer;
use activity_protocol::entity::ObjectRef;
use activity_protocol::timeline::{Namespace, TimelineEntry};
use tracing::debug;

use crate::filter;
use crate::providers::AccessProvider;
use crate::store::TimelineStore;

/// Read side of the timeline: owner feeds, optionally filtered for a viewer.
#[derive(Clone)]
pub struct TimelineReader {
    store: Arc<dyn TimelineStore>,
    access: Arc<dyn AccessProvider>,
}

impl TimelineReader {
    pub fn new(store: Arc<dyn TimelineStore>, access: Arc<dyn AccessProvider>) -> Self {
        Self { store, access }
    }

    /// Entries of `owner`, newest first.
    pub async fn fetch(
        &self,
        owner: &ObjectRef,
        namespace: Option<&Namespace>,
    ) -> Result<Vec<TimelineEntry>> {
        let namespace = namespace.map(ToString::to_string);
        let entries = self.store.fetch(owner, namespace.as_deref()).await?;
        debug!(%owner, namespace = ?namespace, count = entries.len(), "timeline fetched");
        Ok(entries)
    }

    pub async fn apply_viewer_filter(
        &self,
        entries: Vec<TimelineEntry>,
        viewer: Viewer,
    ) -> Result<Vec<TimelineEntry>> {
        filter::apply_viewer_filter(entries, viewer, self.access.as_ref()).await
    }

    /// Everything on the user's timeline: own actions plus events of related people.
    pub async fn profile_feed(
        &self,
        user_id: i64,
        viewer: Option<Viewer>,
    ) -> Result<Vec<TimelineEntry>> {
        self.feed(ObjectRef::user(user_id), None, viewer).await
    }

    /// Only the actions performed by the user.
    pub async fn user_feed(&self, user_id: i64, viewer: Option<Viewer>) -> Result<Vec<TimelineEntry>> {
        self.feed(
            ObjectRef::user(user_id),
            Some(Namespace::User(user_id)),
            viewer,
        )
        .await
    }

    pub async fn project_feed(
        &self,
        project_id: i64,
        viewer: Option<Viewer>,
    ) -> Result<Vec<TimelineEntry>> {
        self.feed(
            ObjectRef::project(project_id),
            Some(Namespace::Project(project_id)),
            viewer,
        )
        .await
    }

    async fn feed(
        &self,
        owner: ObjectRef,
        namespace: Option<Namespace>,
        viewer: Option<Viewer>,
    ) -> Result<Vec<TimelineEntry>> {
        let entries = self.fetch(&owner, namespace.as_ref()).await?;
        match viewer {
            Some(viewer) => self.apply_viewer_filter(entries, viewer).await,
            None => Ok(entries),
        }
    }
}
