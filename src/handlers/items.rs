//! Item handlers

use axum::{extract::State, Json};

use super::{RecordId, ValidatedJson};
use crate::error::ApiError;
use crate::models::ItemCreate;
use crate::state::AppState;
use crate::store::Item;

/// POST /items
pub async fn create_item(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ItemCreate>,
) -> Result<Json<Item>, ApiError> {
    let item = state.content_store.create_item(req.name).await?;
    tracing::info!(item_id = item.id, "Item created");
    Ok(Json(item))
}

/// GET /items/:id
pub async fn get_item(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<Item>, ApiError> {
    Ok(Json(state.content_store.get_item(id).await?))
}
