pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::layout::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // One-shot layout
        .route("/api/v1/layout", post(handlers::handle_layout))
        // Grid sessions (mount, resize, item changes)
        .route("/api/v1/grids", post(handlers::handle_mount_grid))
        .route(
            "/api/v1/grids/:id",
            get(handlers::handle_get_grid).delete(handlers::handle_delete_grid),
        )
        .route(
            "/api/v1/grids/:id/resize",
            post(handlers::handle_resize_grid),
        )
        .route(
            "/api/v1/grids/:id/items",
            put(handlers::handle_set_grid_items),
        )
        .with_state(state)
}
