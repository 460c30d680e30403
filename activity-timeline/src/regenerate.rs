use activity_core::errors::Result;
use activity_protocol::access::UserProfile;
use activity_protocol::entity::{Entity, UserSummary};
use activity_protocol::timeline::ExtraData;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::bulk::BulkWriter;
use crate::fanout::FanOut;
use crate::providers::UserDirectory;

/// Outcome of a regeneration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegenerationReport {
    pub users: usize,
    pub batches: usize,
    pub rows: u64,
}

/// Rebuilds the `users.user.create` entries of every user, backdated to their join date.
///
/// Users are processed oldest first and `progress` is called before each one.
/// The first failure aborts the run; rows of batches already written stay written.
pub async fn regenerate_user_creation<F>(
    directory: &dyn UserDirectory,
    fanout: &FanOut,
    bulk: &BulkWriter,
    mut progress: F,
) -> Result<RegenerationReport>
where
    F: FnMut(&UserProfile),
{
    let users = directory.users_by_join_date().await?;
    info!(users = users.len(), batch_size = bulk.batch_size(), "regenerating user timelines");

    for user in &users {
        progress(user);
        bulk.set_created_at(user.date_joined);

        let source = Entity::User(UserSummary {
            id: Some(user.id),
            username: user.username.clone(),
        });
        fanout
            .push_to_timelines(bulk, None, user.id, &source, "create", &creation_extra(user.id))
            .await?;
    }
    bulk.flush().await?;

    let stats = bulk.stats();
    let report = RegenerationReport {
        users: users.len(),
        batches: stats.batches,
        rows: stats.rows,
    };
    info!(?report, "user timelines regenerated");
    Ok(report)
}

fn creation_extra(user_id: i64) -> ExtraData {
    let mut extra = ExtraData::new();
    extra.insert("values_diff".into(), Value::Object(Map::new()));
    extra.insert("user".into(), json!({ "id": user_id }));
    extra
}
