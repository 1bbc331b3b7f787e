use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AccountId, EventEnvelope, EventId, EventStoreError, Result, Snapshot, Version,
    store::{EventStore, validate_events_for_append},
};

/// PostgreSQL-backed event store implementation.
///
/// The append path runs in a single transaction: the current-version row is
/// locked and compared, the batch is inserted, and the version index is
/// updated. The `unique_account_version` constraint is the last-line guard
/// against writers that race past the version check.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a new PostgreSQL event store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_event(row: PgRow) -> Result<EventEnvelope> {
        Ok(EventEnvelope {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_type: row.try_get("event_type")?,
            account_id: AccountId::new(row.try_get::<String, _>("account_id")?),
            operator_id: row.try_get("operator_id")?,
            version: Version::new(row.try_get("version")?),
            timestamp: row.try_get("timestamp")?,
            payload: row.try_get("payload")?,
        })
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(
        &self,
        account_id: &AccountId,
        expected_version: Version,
        events: Vec<EventEnvelope>,
    ) -> Result<Version> {
        validate_events_for_append(&events)?;

        if events[0].account_id != *account_id {
            return Err(EventStoreError::InvalidBatch(format!(
                "batch is for account {}, append targets {}",
                events[0].account_id, account_id
            )));
        }

        let mut tx = self.pool.begin().await?;

        // Lock the version row for this account so concurrent appends
        // serialize here rather than on the unique constraint.
        let current: Option<i64> = sqlx::query_scalar(
            "SELECT current_version FROM account_versions WHERE account_id = $1 FOR UPDATE",
        )
        .bind(account_id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let actual = current.map(Version::new).unwrap_or_else(Version::initial);
        if actual != expected_version {
            return Err(EventStoreError::ConcurrencyConflict {
                account_id: account_id.clone(),
                expected: expected_version,
                actual,
            });
        }

        let mut new_version = actual;
        for event in &events {
            sqlx::query(
                r#"
                INSERT INTO events (id, account_id, operator_id, event_type, version, timestamp, payload)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(event.event_id.as_uuid())
            .bind(event.account_id.as_str())
            .bind(&event.operator_id)
            .bind(&event.event_type)
            .bind(event.version.as_i64())
            .bind(event.timestamp)
            .bind(&event.payload)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("unique_account_version")
                {
                    return EventStoreError::ConcurrencyConflict {
                        account_id: account_id.clone(),
                        expected: expected_version,
                        actual: event.version,
                    };
                }
                EventStoreError::Database(e)
            })?;

            new_version = event.version;
        }

        sqlx::query(
            r#"
            INSERT INTO account_versions (account_id, current_version)
            VALUES ($1, $2)
            ON CONFLICT (account_id) DO UPDATE SET current_version = $2
            "#,
        )
        .bind(account_id.as_str())
        .bind(new_version.as_i64())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(new_version)
    }

    async fn read_events(
        &self,
        account_id: &AccountId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, operator_id, event_type, version, timestamp, payload
            FROM events
            WHERE account_id = $1 AND version >= $2
            ORDER BY version ASC
            "#,
        )
        .bind(account_id.as_str())
        .bind(from_version.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn current_version(&self, account_id: &AccountId) -> Result<Option<Version>> {
        let version: Option<i64> = sqlx::query_scalar(
            "SELECT current_version FROM account_versions WHERE account_id = $1",
        )
        .bind(account_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(version.map(Version::new))
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO snapshots (account_id, version, timestamp, state)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (account_id) DO UPDATE
            SET version = $2, timestamp = $3, state = $4
            "#,
        )
        .bind(snapshot.account_id.as_str())
        .bind(snapshot.version.as_i64())
        .bind(snapshot.timestamp)
        .bind(&snapshot.state)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_snapshot(&self, account_id: &AccountId) -> Result<Option<Snapshot>> {
        let row = sqlx::query(
            "SELECT account_id, version, timestamp, state FROM snapshots WHERE account_id = $1",
        )
        .bind(account_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(Snapshot {
                account_id: AccountId::new(row.try_get::<String, _>("account_id")?),
                version: Version::new(row.try_get("version")?),
                timestamp: row.try_get("timestamp")?,
                state: row.try_get("state")?,
            })
        })
        .transpose()
    }
}
