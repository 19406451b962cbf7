//! Request handlers

use crate::AppState;
use crate::error::{ApiError, ValidJson, ValidPath};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use gtd_core::{
    Item, ItemPatch, NewItem, NewProject, Project, ProjectPatch, ReviewSummary, Snapshot, rules,
    snapshot, views,
};
use serde::Deserialize;
use std::sync::Arc;

type ApiResult<T> = Result<T, ApiError>;

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// Items

pub async fn list_items(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Item>>> {
    let store = state.read()?;
    Ok(Json(store.items().into_iter().cloned().collect()))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<u64>,
) -> ApiResult<Json<Item>> {
    let store = state.read()?;
    store
        .item(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Item not found".into()))
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    ValidJson(new): ValidJson<NewItem>,
) -> ApiResult<impl IntoResponse> {
    let item = state.write()?.create_item(new)?;
    tracing::debug!(item = item.id, status = %item.status, "created item");
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<u64>,
    ValidJson(patch): ValidJson<ItemPatch>,
) -> ApiResult<Json<Item>> {
    let item = state.write()?.update_item(id, patch)?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<u64>,
) -> ApiResult<StatusCode> {
    state.write()?.delete_item(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// One entry of a batch update: an id plus any item fields
#[derive(Debug, Deserialize)]
pub struct BatchUpdate {
    id: u64,
    #[serde(flatten)]
    patch: ItemPatch,
}

pub async fn batch_update_items(
    State(state): State<Arc<AppState>>,
    ValidJson(updates): ValidJson<Vec<BatchUpdate>>,
) -> ApiResult<Json<serde_json::Value>> {
    let updates = updates.into_iter().map(|u| (u.id, u.patch)).collect();
    let updated = state.write()?.update_items(updates)?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}

/// Request to move an item to another project (`null` unassigns it)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveItemRequest {
    #[serde(default)]
    project_id: Option<u64>,
}

pub async fn move_item(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<u64>,
    ValidJson(req): ValidJson<MoveItemRequest>,
) -> ApiResult<Json<Item>> {
    let mut store = state.write()?;
    let item = rules::move_to_project(&mut store, id, req.project_id)?;
    Ok(Json(item))
}

// Projects

pub async fn list_projects(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Project>>> {
    let store = state.read()?;
    Ok(Json(store.projects().into_iter().cloned().collect()))
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<u64>,
) -> ApiResult<Json<Project>> {
    let store = state.read()?;
    store
        .project(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Project not found".into()))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    ValidJson(new): ValidJson<NewProject>,
) -> ApiResult<impl IntoResponse> {
    let project = state.write()?.create_project(new)?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<u64>,
    ValidJson(patch): ValidJson<ProjectPatch>,
) -> ApiResult<Json<Project>> {
    let project = state.write()?.update_project(id, patch)?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<u64>,
) -> ApiResult<StatusCode> {
    let mut store = state.write()?;
    rules::delete_project(&mut store, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reorder a project's items, either by moving one item to an index or by
/// sending the full order
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    #[serde(default)]
    item_ids: Option<Vec<u64>>,
    #[serde(default)]
    item_id: Option<u64>,
    #[serde(default)]
    index: Option<usize>,
}

pub async fn reorder_project(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<u64>,
    ValidJson(req): ValidJson<ReorderRequest>,
) -> ApiResult<Json<Vec<Item>>> {
    let mut store = state.write()?;
    let ordered = match req {
        ReorderRequest {
            item_ids: Some(ids),
            ..
        } => rules::apply_order(&mut store, id, &ids)?,
        ReorderRequest {
            item_id: Some(item_id),
            index: Some(index),
            ..
        } => rules::reorder(&mut store, id, item_id, index)?,
        _ => {
            return Err(ApiError::BadRequest(
                "Expected itemIds, or itemId and index".into(),
            ));
        }
    };
    Ok(Json(ordered))
}

// Review

pub async fn next_actions(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Item>>> {
    let store = state.read()?;
    let projects = store.projects();
    let items = store.items();
    Ok(Json(
        rules::next_actions(&projects, &items)
            .into_iter()
            .cloned()
            .collect(),
    ))
}

pub async fn calendar(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Item>>> {
    let store = state.read()?;
    let items = store.items();
    Ok(Json(views::calendar(&items).into_iter().cloned().collect()))
}

pub async fn review(State(state): State<Arc<AppState>>) -> ApiResult<Json<ReviewSummary>> {
    let store = state.read()?;
    let projects = store.projects();
    let items = store.items();
    Ok(Json(views::review(
        &projects,
        &items,
        Utc::now(),
        state.config.review.upcoming_days,
    )))
}

// System

pub async fn export(State(state): State<Arc<AppState>>) -> ApiResult<Json<Snapshot>> {
    let store = state.read()?;
    Ok(Json(snapshot::export(&store)))
}

pub async fn import(
    State(state): State<Arc<AppState>>,
    ValidJson(body): ValidJson<serde_json::Value>,
) -> ApiResult<Json<serde_json::Value>> {
    let report = snapshot::import(&mut *state.write()?, body)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Import successful",
        "projects": report.projects,
        "items": report.items,
    })))
}
