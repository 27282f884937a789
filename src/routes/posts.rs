//! Post routes

use axum::{routing::get, Router};

use crate::handlers::posts;
use crate::state::AppState;

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/public", get(posts::list_public_posts))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
}
