//! Record store port and its adapters.
//!
//! Handlers only see [`EventStore`]; the Postgres adapter backs the running
//! service and the in-memory adapter backs tests and local experiments.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, EventPatch, NewEvent};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryEventStore;
pub use postgres::PgEventStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A supplied value violates a schema constraint.
    #[error("{0}")]
    Validation(String),

    #[error("event store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Persistent store for event records.
///
/// Implementations assign `id`, `created_at` and `updated_at`, and must keep
/// `created_at` non-decreasing in insertion order.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create(&self, event: NewEvent) -> Result<Event, StoreError>;

    /// All records, newest `created_at` first. Empty when nothing is stored.
    async fn list(&self) -> Result<Vec<Event>, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Event>, StoreError>;

    /// Applies only the fields present in `patch`. `None` when `id` is unknown.
    async fn update(&self, id: Uuid, patch: EventPatch) -> Result<Option<Event>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

fn require_text(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("`{field}` must not be blank")));
    }
    Ok(())
}

/// Schema rules shared by the adapters. Postgres enforces the same rules with
/// CHECK constraints.
pub(crate) fn validate_new(event: &NewEvent) -> Result<(), StoreError> {
    require_text("title", &event.title)?;
    require_text("description", &event.description)?;
    require_text("location", &event.location)?;
    Ok(())
}

pub(crate) fn validate_patch(patch: &EventPatch) -> Result<(), StoreError> {
    if let Some(title) = &patch.title {
        require_text("title", title)?;
    }
    if let Some(description) = &patch.description {
        require_text("description", description)?;
    }
    if let Some(location) = &patch.location {
        require_text("location", location)?;
    }
    Ok(())
}
