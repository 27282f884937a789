//! Item routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::items;
use crate::state::AppState;

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/items", post(items::create_item))
        .route("/items/:id", get(items::get_item))
}
