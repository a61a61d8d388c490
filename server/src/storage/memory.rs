//! In-memory event store.
//!
//! Useful for tests and for running the API without Postgres.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{validate_new, validate_patch, EventStore, StoreError};
use crate::models::{Event, EventPatch, NewEvent};

#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    // Insertion order; listing walks it backwards.
    events: Arc<RwLock<Vec<Event>>>,
    failure: Arc<RwLock<Option<String>>>,
    write_failure: Arc<RwLock<Option<String>>>,
    create_calls: Arc<AtomicUsize>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub async fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.write().await = Some(reason.into());
    }

    /// Makes create, update and delete fail while reads keep working.
    pub async fn fail_writes_with(&self, reason: impl Into<String>) {
        *self.write_failure.write().await = Some(reason.into());
    }

    pub async fn recover(&self) {
        *self.failure.write().await = None;
        *self.write_failure.write().await = None;
    }

    /// Number of times `create` was invoked, including rejected calls.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    async fn check_available(&self) -> Result<(), StoreError> {
        match self.failure.read().await.as_ref() {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    async fn check_writable(&self) -> Result<(), StoreError> {
        self.check_available().await?;
        match self.write_failure.read().await.as_ref() {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn create(&self, event: NewEvent) -> Result<Event, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable().await?;
        validate_new(&event)?;

        let mut events = self.events.write().await;

        // Wall clock may step backwards; creation order must not.
        let now = Utc::now();
        let created_at = events
            .last()
            .map(|last| last.created_at.max(now))
            .unwrap_or(now);

        let record = Event {
            id: Uuid::new_v4(),
            title: event.title,
            description: event.description,
            date: event.date,
            location: event.location,
            organizer: event.organizer,
            image: event.image,
            created_at,
            updated_at: created_at,
        };
        events.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<Event>, StoreError> {
        self.check_available().await?;
        let events = self.events.read().await;
        Ok(events.iter().rev().cloned().collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        self.check_available().await?;
        let events = self.events.read().await;
        Ok(events.iter().find(|event| event.id == id).cloned())
    }

    async fn update(&self, id: Uuid, patch: EventPatch) -> Result<Option<Event>, StoreError> {
        self.check_writable().await?;
        validate_patch(&patch)?;

        let mut events = self.events.write().await;
        let Some(event) = events.iter_mut().find(|event| event.id == id) else {
            return Ok(None);
        };

        patch.apply_to(event);
        event.updated_at = Utc::now().max(event.created_at);
        Ok(Some(event.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check_writable().await?;
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|event| event.id != id);
        Ok(events.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_event(title: &str) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: "Kickoff".to_string(),
            date: Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap(),
            location: "HQ".to_string(),
            organizer: None,
            image: Some(format!("memory://DevEvent/{title}")),
        }
    }

    #[tokio::test]
    async fn create_assigns_identity_and_timestamps() {
        let store = InMemoryEventStore::new();
        let event = store.create(new_event("Launch")).await.unwrap();

        assert_eq!(event.title, "Launch");
        assert_eq!(event.created_at, event.updated_at);
        assert_eq!(store.find(event.id).await.unwrap(), Some(event));
    }

    #[tokio::test]
    async fn create_rejects_blank_required_fields() {
        let store = InMemoryEventStore::new();
        let mut event = new_event("Launch");
        event.location = "   ".to_string();

        let err = store.create(event).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.is_empty().await);
        assert_eq!(store.create_calls(), 1);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = InMemoryEventStore::new();
        assert!(store.list().await.unwrap().is_empty());

        for title in ["first", "second", "third"] {
            store.create(new_event(title)).await.unwrap();
        }

        let listed = store.list().await.unwrap();
        let titles: Vec<_> = listed.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["third", "second", "first"]);
        assert!(listed
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[tokio::test]
    async fn update_changes_only_patched_fields() {
        let store = InMemoryEventStore::new();
        let original = store.create(new_event("Launch")).await.unwrap();

        let patch = EventPatch {
            title: Some("Relaunch".to_string()),
            ..Default::default()
        };
        let updated = store.update(original.id, patch).await.unwrap().unwrap();

        assert_eq!(updated.title, "Relaunch");
        assert_eq!(updated.description, original.description);
        assert_eq!(updated.image, original.image);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= original.updated_at);
    }

    #[tokio::test]
    async fn update_unknown_id_is_none() {
        let store = InMemoryEventStore::new();
        let result = store
            .update(Uuid::new_v4(), EventPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn update_rejects_blank_title() {
        let store = InMemoryEventStore::new();
        let original = store.create(new_event("Launch")).await.unwrap();
        let patch = EventPatch {
            title: Some(String::new()),
            ..Default::default()
        };

        let err = store.update(original.id, patch).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.find(original.id).await.unwrap().unwrap().title, "Launch");
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = InMemoryEventStore::new();
        let event = store.create(new_event("Launch")).await.unwrap();

        assert!(store.delete(event.id).await.unwrap());
        assert!(!store.delete(event.id).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_mode_surfaces_unavailable() {
        let store = InMemoryEventStore::new();
        store.fail_with("connection refused").await;
        assert!(matches!(
            store.list().await,
            Err(StoreError::Unavailable(_))
        ));

        store.recover().await;
        assert!(store.list().await.is_ok());
    }

    #[tokio::test]
    async fn write_failure_keeps_reads_working() {
        let store = InMemoryEventStore::new();
        let event = store.create(new_event("Launch")).await.unwrap();
        store.fail_writes_with("read-only replica").await;

        assert_eq!(store.find(event.id).await.unwrap(), Some(event.clone()));
        assert!(matches!(
            store.update(event.id, EventPatch::default()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.delete(event.id).await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.len().await, 1);
    }
}
