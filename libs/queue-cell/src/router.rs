use std::sync::Arc;

use axum::{
    Extension,
    Router,
    routing::{get, patch, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::QueueMonitor;

pub fn token_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_tokens).post(handlers::create_token))
        .route("/{token_id}/status", patch(handlers::update_token_status))
        .route("/mine", get(handlers::get_my_token))
        .route("/mine/window", get(handlers::get_my_window))
        .route("/book", post(handlers::book_token))
        .route("/cancel", post(handlers::cancel_my_token))
        .route("/confirm-arrival", post(handlers::confirm_arrival))
        .layer(middleware::from_fn(auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}

/// Public live queue, served from the monitor's shared pollers.
pub fn queue_routes(monitor: Arc<QueueMonitor>) -> Router {
    Router::new()
        .route("/{doctor_id}/{date}", get(handlers::get_live_queue))
        .layer(Extension(monitor))
}
