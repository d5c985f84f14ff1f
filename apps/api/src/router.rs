use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use auth_cell::router::auth_routes;
use clinic_cell::router::clinic_routes;
use queue_cell::{queue_routes, token_routes, QueueMonitor};
use schedule_cell::router::schedule_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>, monitor: Arc<QueueMonitor>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic Queue API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/clinics", clinic_routes(state.clone()))
        .nest("/schedules", schedule_routes(state.clone()))
        .nest("/tokens", token_routes(state.clone()))
        .nest("/queue", queue_routes(monitor))
}
