use std::collections::HashMap;

use activity_core::db::DatabasePool;
use activity_core::errors::Result;
use activity_protocol::access::{MembershipGrant, ProjectAccess, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{AccessProvider, UserDirectory};

/// Reads projects, memberships, roles and users from the host application's tables.
///
/// Expects `projects_project`, `projects_membership`, `users_role` and `users_user`.
#[derive(Clone)]
pub struct PgDirectory {
    pool: DatabasePool,
}

impl PgDirectory {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ProjectRow {
    id: i64,
    is_private: bool,
    anon_permissions: Option<Vec<String>>,
}

#[derive(FromRow)]
struct MembershipRow {
    project_id: i64,
    user_id: i64,
    is_owner: bool,
    permissions: Option<Vec<String>>,
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    full_name: Option<String>,
    photo: Option<String>,
    date_joined: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        UserProfile {
            id: row.id,
            username: row.username,
            full_name: row.full_name.unwrap_or_default(),
            big_photo: row.photo.clone(),
            photo: row.photo,
            date_joined: row.date_joined,
        }
    }
}

#[async_trait]
impl AccessProvider for PgDirectory {
    async fn projects(&self, ids: &[i64]) -> Result<HashMap<i64, ProjectAccess>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, is_private, anon_permissions FROM projects_project WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.id,
                    ProjectAccess {
                        id: row.id,
                        is_private: row.is_private,
                        anon_permissions: row.anon_permissions.unwrap_or_default(),
                    },
                )
            })
            .collect())
    }

    async fn memberships_of(&self, user_id: i64) -> Result<Vec<MembershipGrant>> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT m.project_id, m.user_id, m.is_owner, r.permissions
            FROM projects_membership m
            LEFT JOIN users_role r ON r.id = m.role_id
            WHERE m.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| MembershipGrant {
                project_id: row.project_id,
                user_id: row.user_id,
                is_owner: row.is_owner,
                permissions: row.permissions.unwrap_or_default(),
            })
            .collect())
    }

    async fn project_member_ids(&self, project_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT user_id FROM projects_membership
            WHERE project_id = $1 AND user_id IS NOT NULL
            ORDER BY user_id
            "#,
        )
        .bind(project_id)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(ids)
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn find(&self, id: i64) -> Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, full_name, photo, date_joined FROM users_user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn users_by_join_date(&self) -> Result<Vec<UserProfile>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, full_name, photo, date_joined FROM users_user \
             ORDER BY date_joined, id",
        )
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
