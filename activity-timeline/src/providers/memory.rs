use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use activity_core::errors::Result;
use activity_protocol::access::{MembershipGrant, ProjectAccess, UserProfile};
use async_trait::async_trait;
use parking_lot::RwLock;

use super::{AccessProvider, UserDirectory};

#[derive(Default)]
struct DirectoryState {
    projects: HashMap<i64, ProjectAccess>,
    memberships: Vec<MembershipGrant>,
    users: HashMap<i64, UserProfile>,
}

/// In-memory projects, memberships and users. Backs tests and local tooling.
#[derive(Default, Clone)]
pub struct MemoryDirectory {
    inner: Arc<RwLock<DirectoryState>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_project(&self, project: ProjectAccess) {
        self.inner.write().projects.insert(project.id, project);
    }

    /// Adds a membership, replacing an existing one for the same project and user.
    pub fn upsert_membership(&self, grant: MembershipGrant) {
        let mut inner = self.inner.write();
        inner
            .memberships
            .retain(|m| !(m.project_id == grant.project_id && m.user_id == grant.user_id));
        inner.memberships.push(grant);
    }

    pub fn remove_membership(&self, project_id: i64, user_id: i64) {
        self.inner
            .write()
            .memberships
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));
    }

    /// Replaces the permission list of a membership's role. Returns false when absent.
    pub fn set_role_permissions(&self, project_id: i64, user_id: i64, permissions: &[&str]) -> bool {
        let mut inner = self.inner.write();
        match inner
            .memberships
            .iter_mut()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
        {
            Some(grant) => {
                grant.permissions = permissions.iter().map(|p| p.to_string()).collect();
                true
            }
            None => false,
        }
    }

    pub fn upsert_user(&self, user: UserProfile) {
        self.inner.write().users.insert(user.id, user);
    }
}

#[async_trait]
impl AccessProvider for MemoryDirectory {
    async fn projects(&self, ids: &[i64]) -> Result<HashMap<i64, ProjectAccess>> {
        let inner = self.inner.read();
        Ok(ids
            .iter()
            .filter_map(|id| inner.projects.get(id).map(|p| (*id, p.clone())))
            .collect())
    }

    async fn memberships_of(&self, user_id: i64) -> Result<Vec<MembershipGrant>> {
        let inner = self.inner.read();
        Ok(inner
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn project_member_ids(&self, project_id: i64) -> Result<Vec<i64>> {
        let inner = self.inner.read();
        let ids: BTreeSet<i64> = inner
            .memberships
            .iter()
            .filter(|m| m.project_id == project_id)
            .map(|m| m.user_id)
            .collect();
        Ok(ids.into_iter().collect())
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find(&self, id: i64) -> Result<Option<UserProfile>> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn users_by_join_date(&self) -> Result<Vec<UserProfile>> {
        let mut users: Vec<UserProfile> = self.inner.read().users.values().cloned().collect();
        users.sort_by(|a, b| a.date_joined.cmp(&b.date_joined).then(a.id.cmp(&b.id)));
        Ok(users)
    }
}
