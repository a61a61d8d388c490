//! Event operation handlers.
//!
//! Every handler runs the same pipeline: decode the request, upload the
//! image when there is one, write to the store, and map the outcome through
//! [`AppError`] or the success envelopes.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assets::ImagePayload;
use crate::forms::EventForm;
use crate::state::AppState;
use crate::utils::error::{AppError, StoreAction};
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

/// Ids that are not UUIDs cannot exist in the store.
fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

async fn decode(multipart: Result<Multipart, MultipartRejection>) -> Result<EventForm, AppError> {
    let multipart = multipart.map_err(|rejection| AppError::Decode(rejection.body_text()))?;
    EventForm::from_multipart(multipart).await
}

async fn upload(state: &AppState, image: ImagePayload) -> Result<String, AppError> {
    let asset = state.uploader.upload(image, &state.upload_options).await?;
    Ok(asset.url)
}

/// No compensating delete is attempted for an image whose record write failed.
fn report_orphan(url: &str, reason: &dyn std::fmt::Display) {
    warn!(asset_url = %url, reason = %reason, "Uploaded image left without an event");
}

/// POST /events
pub async fn create_event(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let (mut event, image) = decode(multipart).await?.into_new_event()?;

    let url = upload(&state, image).await?;
    event.image = Some(url.clone());

    let record = state.store.create(event).await.map_err(|e| {
        report_orphan(&url, &e);
        AppError::store(StoreAction::Create)(e)
    })?;

    info!(event_id = %record.id, "Event created");
    Ok(created(record, "Event Created Successfully"))
}

/// GET /events
pub async fn list_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = state
        .store
        .list()
        .await
        .map_err(AppError::store(StoreAction::Fetch))?;

    debug!(count = events.len(), "Events listed");
    Ok(success(events, "Events Fetched Successfully"))
}

/// GET /events/:id
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&id).ok_or_else(|| AppError::NotFound(id.clone()))?;

    let event = state
        .store
        .find(event_id)
        .await
        .map_err(AppError::store(StoreAction::Fetch))?
        .ok_or(AppError::NotFound(id))?;

    Ok(success(event, "Event Fetched Successfully"))
}

/// PUT /events/:id
///
/// Existence is checked before the image is uploaded, so unknown ids never
/// cost an upload. A record deleted between the check and the write still
/// yields 404 and leaves the fresh image orphaned.
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&id).ok_or_else(|| AppError::NotFound(id.clone()))?;
    let (mut patch, image) = decode(multipart).await?.into_patch()?;

    let exists = state
        .store
        .find(event_id)
        .await
        .map_err(AppError::store(StoreAction::Update))?
        .is_some();
    if !exists {
        return Err(AppError::NotFound(id));
    }

    let uploaded = match image {
        Some(image) => Some(upload(&state, image).await?),
        None => None,
    };
    patch.image = uploaded.clone();

    let outcome = state.store.update(event_id, patch).await;
    let updated = match (outcome, uploaded) {
        (Ok(Some(event)), _) => event,
        (Ok(None), uploaded) => {
            if let Some(url) = uploaded {
                report_orphan(&url, &"event deleted during update");
            }
            return Err(AppError::NotFound(id));
        }
        (Err(e), uploaded) => {
            if let Some(url) = uploaded {
                report_orphan(&url, &e);
            }
            return Err(AppError::store(StoreAction::Update)(e));
        }
    };

    info!(event_id = %updated.id, "Event updated");
    Ok(success(updated, "Event Updated Successfully"))
}

/// DELETE /events?id=
///
/// Deleting an id that does not exist succeeds, so repeated deletes are
/// indistinguishable from the first.
pub async fn delete_event(
    State(state): State<AppState>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::Decode(rejection.body_text()))?;
    let raw = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or(AppError::MissingId)?;

    let removed = match parse_id(&raw) {
        Some(event_id) => state
            .store
            .delete(event_id)
            .await
            .map_err(AppError::store(StoreAction::Delete))?,
        None => false,
    };

    if removed {
        info!(event_id = %raw, "Event deleted");
    } else {
        debug!(event_id = %raw, "Delete requested for unknown event");
    }

    Ok(empty_success("Event Deleted Successfully"))
}
