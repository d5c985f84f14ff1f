use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/preview", post(handlers::preview_slots));

    let protected_routes = Router::new()
        .route("/", get(handlers::list_schedules))
        .route("/{doctor_id}", get(handlers::get_schedule))
        .route("/{doctor_id}/slots/{date}", get(handlers::get_available_slots))
        .layer(middleware::from_fn(auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
