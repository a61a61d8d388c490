use axum::extract::DefaultBodyLimit;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, with_security_headers, HttpConfig};
use crate::handlers::{
    create_event, delete_event, get_event, health_check, list_events, method_not_allowed,
    route_not_found, update_event,
};
use crate::state::AppState;

pub fn create_routes(state: AppState, http: &HttpConfig) -> Router {
    let router = Router::new()
        .route("/health", get(health_check).fallback(method_not_allowed))
        .route(
            "/events",
            get(list_events)
                .post(create_event)
                .delete(delete_event)
                .fallback(method_not_allowed),
        )
        .route(
            "/events/:id",
            get(get_event).put(update_event).fallback(method_not_allowed),
        )
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(http.max_upload_bytes))
        .with_state(state);

    with_security_headers(router, http.production)
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer(&http.allowed_origins))
}
