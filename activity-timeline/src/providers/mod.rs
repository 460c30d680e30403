//! Ports to the host application's project, membership and user data.

mod memory;
mod postgres;

use std::collections::HashMap;

use activity_core::errors::Result;
use activity_protocol::access::{MembershipGrant, ProjectAccess, UserProfile};
use async_trait::async_trait;

pub use memory::MemoryDirectory;
pub use postgres::PgDirectory;

/// Project visibility and membership lookups used by fan-out and feed filtering.
#[async_trait]
pub trait AccessProvider: Send + Sync {
    /// Visibility settings for the requested projects. Unknown ids are omitted.
    async fn projects(&self, ids: &[i64]) -> Result<HashMap<i64, ProjectAccess>>;

    /// Every membership held by `user_id`, with the permissions of its role.
    async fn memberships_of(&self, user_id: i64) -> Result<Vec<MembershipGrant>>;

    /// Users that are members of the project, ascending.
    async fn project_member_ids(&self, project_id: i64) -> Result<Vec<i64>>;
}

/// Read access to user profiles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<UserProfile>>;

    /// All users ordered by `date_joined`, oldest first.
    async fn users_by_join_date(&self) -> Result<Vec<UserProfile>>;
}
