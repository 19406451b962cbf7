//! Router construction

use crate::AppState;
use crate::handlers;
use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route("/api/items/batch", put(handlers::batch_update_items))
        .route(
            "/api/items/{id}",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/api/items/{id}/move", post(handlers::move_item))
        .route(
            "/api/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route("/api/projects/{id}/reorder", post(handlers::reorder_project))
        .route("/api/next-actions", get(handlers::next_actions))
        .route("/api/calendar", get(handlers::calendar))
        .route("/api/review", get(handlers::review))
        .route("/api/system/export", get(handlers::export))
        .route("/api/system/import", post(handlers::import))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
