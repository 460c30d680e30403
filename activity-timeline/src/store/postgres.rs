use activity_core::config::CoreConfig;
use activity_core::db::{DatabaseMigrator, DatabasePool};
use activity_core::errors::{Result, TimelineError};
use activity_protocol::entity::{EntityType, ObjectRef};
use activity_protocol::timeline::{NewTimelineEntry, TimelineEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::debug;

use super::TimelineStore;

const SELECT_COLUMNS: &str = "SELECT id, owner_type, owner_id, namespace, event_type, \
     project_id, payload, payload_type, created_at FROM timeline_entries";

/// Rows per INSERT statement; keeps bind parameters well under the Postgres limit.
const INSERT_CHUNK: usize = 1000;

/// Database-backed timeline store.
#[derive(Clone)]
pub struct PgTimelineStore {
    pool: DatabasePool,
}

impl PgTimelineStore {
    /// Connects to the database using the supplied configuration and ensures migrations ran.
    pub async fn from_config(config: &CoreConfig) -> Result<Self> {
        let pool = DatabasePool::connect(config).await?;
        Self::from_pool(pool).await
    }

    /// Builds the store from an existing database pool.
    pub async fn from_pool(pool: DatabasePool) -> Result<Self> {
        let store = Self { pool };
        store.run_migrations(&store.pool).await?;
        Ok(store)
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

#[async_trait]
impl DatabaseMigrator for PgTimelineStore {
    async fn run_migrations(&self, pool: &DatabasePool) -> Result<()> {
        sqlx::migrate!("./migrations").run(pool.inner()).await?;
        Ok(())
    }
}

#[async_trait]
impl TimelineStore for PgTimelineStore {
    async fn insert(&self, entry: NewTimelineEntry) -> Result<TimelineEntry> {
        let row = sqlx::query_as::<_, TimelineRow>(
            r#"
            INSERT INTO timeline_entries (
                owner_type, owner_id, namespace, event_type,
                project_id, payload, payload_type, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING
                id, owner_type, owner_id, namespace, event_type,
                project_id, payload, payload_type, created_at
            "#,
        )
        .bind(entry.owner.kind.type_name())
        .bind(entry.owner.id)
        .bind(&entry.namespace)
        .bind(&entry.event_type)
        .bind(entry.project_id)
        .bind(&entry.payload)
        .bind(entry.payload_type.type_name())
        .bind(entry.created_at)
        .fetch_one(self.pool.inner())
        .await?;

        row.try_into()
    }

    async fn insert_batch(&self, entries: Vec<NewTimelineEntry>) -> Result<u64> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.inner().begin().await?;
        let mut written = 0;
        for chunk in entries.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO timeline_entries (owner_type, owner_id, namespace, event_type, \
                 project_id, payload, payload_type, created_at) ",
            );
            builder.push_values(chunk, |mut row, entry| {
                row.push_bind(entry.owner.kind.type_name())
                    .push_bind(entry.owner.id)
                    .push_bind(&entry.namespace)
                    .push_bind(&entry.event_type)
                    .push_bind(entry.project_id)
                    .push_bind(&entry.payload)
                    .push_bind(entry.payload_type.type_name())
                    .push_bind(entry.created_at);
            });
            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        debug!(rows = written, "timeline batch committed");
        Ok(written)
    }

    async fn fetch(&self, owner: &ObjectRef, namespace: Option<&str>) -> Result<Vec<TimelineEntry>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_COLUMNS);
        builder.push(" WHERE owner_type = ");
        builder.push_bind(owner.kind.type_name());
        builder.push(" AND owner_id = ");
        builder.push_bind(owner.id);

        if let Some(namespace) = namespace {
            builder.push(" AND namespace = ");
            builder.push_bind(namespace);
        }

        builder.push(" ORDER BY created_at DESC, id DESC");

        let rows = builder
            .build_query_as::<TimelineRow>()
            .fetch_all(self.pool.inner())
            .await?;

        rows.into_iter().map(TimelineEntry::try_from).collect()
    }
}

#[derive(FromRow)]
struct TimelineRow {
    id: i64,
    owner_type: String,
    owner_id: i64,
    namespace: String,
    event_type: String,
    project_id: Option<i64>,
    payload: Value,
    payload_type: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TimelineRow> for TimelineEntry {
    type Error = TimelineError;

    fn try_from(row: TimelineRow) -> Result<Self> {
        let owner_kind: EntityType = row
            .owner_type
            .parse()
            .map_err(|_| TimelineError::Store(format!("corrupt owner_type {:?}", row.owner_type)))?;
        let payload_type: EntityType = row.payload_type.parse().map_err(|_| {
            TimelineError::Store(format!("corrupt payload_type {:?}", row.payload_type))
        })?;

        Ok(TimelineEntry {
            id: row.id,
            owner: ObjectRef::new(owner_kind, row.owner_id),
            namespace: row.namespace,
            event_type: row.event_type,
            project_id: row.project_id,
            payload: row.payload,
            payload_type,
            created_at: row.created_at,
        })
    }
}
