pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{get, post},
};

/// Todo routes, relative to the `/v1` prefix.
pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/todo", post(handlers::create_todo))
        .route("/todos", get(handlers::list_todos))
        .route(
            "/todo/{id}",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .post(handlers::complete_todo)
                .delete(handlers::delete_todo),
        )
        .with_state(state)
}
