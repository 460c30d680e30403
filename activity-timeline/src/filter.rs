//! Permission filtering of timeline entries.
//!
//! A [`VisibilityFilter`] is built once per viewer as a list of independent
//! predicates. An entry is visible when any predicate accepts it.

use std::collections::{BTreeSet, HashMap};

use activity_core::errors::Result;
use activity_protocol::access::{MembershipGrant, ProjectAccess, Viewer};
use activity_protocol::timeline::{permission_for, TimelineEntry, VIEW_PERMISSIONS};
use tracing::debug;

use crate::providers::AccessProvider;

type Predicate = Box<dyn Fn(&TimelineEntry, Option<&ProjectAccess>) -> bool + Send + Sync>;

/// OR-combination of visibility predicates for one viewer.
pub struct VisibilityFilter {
    viewer: Viewer,
    predicates: Vec<Predicate>,
}

impl VisibilityFilter {
    /// Builds the predicate list from the viewer's memberships.
    ///
    /// Memberships are ignored for anonymous viewers.
    pub fn new(viewer: Viewer, memberships: &[MembershipGrant]) -> Self {
        let mut predicates: Vec<Predicate> = Vec::new();
        predicates.push(Box::new(public_or_projectless));

        for (permission, entity_type) in VIEW_PERMISSIONS {
            predicates.push(Box::new(
                move |entry: &TimelineEntry, project: Option<&ProjectAccess>| {
                    entry.payload_type == entity_type
                        && project.is_some_and(|project| {
                            project.is_private && project.grants_anonymous(permission)
                        })
                },
            ));
        }

        if viewer.is_authenticated() {
            for grant in memberships {
                if !VIEW_PERMISSIONS
                    .iter()
                    .any(|(permission, _)| grant.allows(permission))
                {
                    continue;
                }
                let grant = grant.clone();
                predicates.push(Box::new(move |entry: &TimelineEntry, _: Option<&ProjectAccess>| {
                    entry.project_id == Some(grant.project_id)
                        && permission_for(entry.payload_type)
                            .is_some_and(|permission| grant.allows(permission))
                }));
            }
        }

        Self { viewer, predicates }
    }

    /// Loads the viewer's memberships through `access` and builds the filter.
    pub async fn for_viewer(viewer: Viewer, access: &dyn AccessProvider) -> Result<Self> {
        let memberships = match viewer.user_id() {
            Some(user_id) => access.memberships_of(user_id).await?,
            None => Vec::new(),
        };
        Ok(Self::new(viewer, &memberships))
    }

    pub fn viewer(&self) -> Viewer {
        self.viewer
    }

    pub fn is_visible(&self, entry: &TimelineEntry, project: Option<&ProjectAccess>) -> bool {
        self.predicates
            .iter()
            .any(|predicate| predicate(entry, project))
    }

    /// Keeps the visible entries, preserving order.
    pub fn apply(
        &self,
        entries: Vec<TimelineEntry>,
        projects: &HashMap<i64, ProjectAccess>,
    ) -> Vec<TimelineEntry> {
        let total = entries.len();
        let visible: Vec<_> = entries
            .into_iter()
            .filter(|entry| {
                let project = entry.project_id.and_then(|id| projects.get(&id));
                self.is_visible(entry, project)
            })
            .collect();
        debug!(
            viewer = ?self.viewer,
            total,
            visible = visible.len(),
            "timeline entries filtered"
        );
        visible
    }
}

fn public_or_projectless(entry: &TimelineEntry, project: Option<&ProjectAccess>) -> bool {
    match entry.project_id {
        None => true,
        Some(_) => project.is_some_and(|project| !project.is_private),
    }
}

/// Filters `entries` for `viewer`, loading project settings and memberships from `access`.
pub async fn apply_viewer_filter(
    entries: Vec<TimelineEntry>,
    viewer: Viewer,
    access: &dyn AccessProvider,
) -> Result<Vec<TimelineEntry>> {
    if entries.is_empty() {
        return Ok(entries);
    }

    let project_ids: Vec<i64> = entries
        .iter()
        .filter_map(|entry| entry.project_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let projects = access.projects(&project_ids).await?;
    let filter = VisibilityFilter::for_viewer(viewer, access).await?;

    Ok(filter.apply(entries, &projects))
}
