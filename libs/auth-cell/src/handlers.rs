use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{LoginRequest, RegisterRequest, Session, SessionUser};
use shared_models::error::AppError;

use crate::services::AuthService;

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Session>, AppError> {
    debug!("Login attempt for {}", request.username);

    let auth_service = AuthService::new(&state);

    let session = auth_service.login(&request).await?;

    Ok(Json(session))
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let auth_service = AuthService::new(&state);

    let session = auth_service.register(&request).await?;

    Ok((StatusCode::CREATED, Json(session)))
}

#[axum::debug_handler]
pub async fn get_me(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
) -> Result<Json<SessionUser>, AppError> {
    let auth_service = AuthService::new(&state);

    let user = auth_service.me(&session).await?;

    Ok(Json(user))
}
