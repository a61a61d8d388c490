//! PostgreSQL implementation of [`EventStore`].

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{validate_new, validate_patch, EventStore, StoreError};
use crate::config::DatabaseConfig;
use crate::models::{Event, EventPatch, NewEvent};

const EVENT_COLUMNS: &str =
    "id, title, description, date, location, organizer, image, created_at, updated_at";

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens the shared pool and brings the schema up to date. Called once at
    /// startup; the pool is reused by every request afterwards.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(config.url.expose_secret())
            .await
            .map_err(map_sqlx_error)?;

        info!(
            max_connections = config.max_connections,
            "Connected to event database"
        );

        sqlx::migrate!().run(&pool).await?;
        info!("Event migrations applied");

        Ok(Self::new(pool))
    }
}

/// Data exceptions (class 22) and integrity violations (class 23) are the
/// caller's fault; everything else is a store fault.
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db)
            if db
                .code()
                .map(|code| code.starts_with("22") || code.starts_with("23"))
                .unwrap_or(false) =>
        {
            StoreError::Validation(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut => StoreError::Unavailable("connection pool timed out".into()),
        sqlx::Error::PoolClosed => StoreError::Unavailable("connection pool closed".into()),
        sqlx::Error::Io(e) => StoreError::Unavailable(e.to_string()),
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn create(&self, event: NewEvent) -> Result<Event, StoreError> {
        validate_new(&event)?;

        let sql = format!(
            r#"
            INSERT INTO events (id, title, description, date, location, organizer, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {EVENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Event>(&sql)
            .bind(Uuid::new_v4())
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.date)
            .bind(&event.location)
            .bind(&event.organizer)
            .bind(&event.image)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list(&self) -> Result<Vec<Event>, StoreError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at DESC, id DESC");

        sqlx::query_as::<_, Event>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");

        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn update(&self, id: Uuid, patch: EventPatch) -> Result<Option<Event>, StoreError> {
        validate_patch(&patch)?;

        let sql = format!(
            r#"
            UPDATE events SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                date = COALESCE($4, date),
                location = COALESCE($5, location),
                organizer = CASE WHEN $6 THEN $7 ELSE organizer END,
                image = COALESCE($8, image),
                updated_at = GREATEST(NOW(), created_at)
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        );

        let (organizer_set, organizer) = match patch.organizer {
            Some(value) => (true, value),
            None => (false, None),
        };

        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.date)
            .bind(patch.location)
            .bind(organizer_set)
            .bind(organizer)
            .bind(patch.image)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
