use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};

use schedule_cell::ConfirmationWindow;
use shared_config::AppConfig;
use shared_models::auth::Session;
use shared_models::error::AppError;

use crate::models::{
    ArrivalOutcome, BookTokenRequest, Coordinates, CreateTokenRequest, MyTokenResponse, QueueView,
    Token, UpdateStatusRequest,
};
use crate::services::{ArrivalService, QueueMonitor, TokenService};

#[derive(Debug, Deserialize)]
pub struct TokenListQuery {
    pub date: Option<NaiveDate>,
}

#[axum::debug_handler]
pub async fn list_tokens(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Query(query): Query<TokenListQuery>,
) -> Result<Json<Vec<Token>>, AppError> {
    let token_service = TokenService::new(&state);

    let tokens = token_service.list_tokens(&session, query.date).await?;

    Ok(Json(tokens))
}

#[axum::debug_handler]
pub async fn create_token(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Json(request): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<Token>), AppError> {
    let token_service = TokenService::new(&state);

    let token = token_service.create_token(&session, &request).await?;

    Ok((StatusCode::CREATED, Json(token)))
}

#[axum::debug_handler]
pub async fn update_token_status(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path(token_id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Token>, AppError> {
    let token_service = TokenService::new(&state);

    let token = token_service
        .update_status(&session, token_id, request.action, request.current_status)
        .await?;

    Ok(Json(token))
}

#[axum::debug_handler]
pub async fn get_my_token(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
) -> Result<Json<MyTokenResponse>, AppError> {
    let token_service = TokenService::new(&state);
    let now = Local::now().naive_local();

    let token = token_service.my_token(&session).await?;
    let confirmation_window = token.as_ref().and_then(|t| t.confirmation_window(now));

    Ok(Json(MyTokenResponse {
        window_message: confirmation_window.as_ref().and_then(ConfirmationWindow::message),
        available_actions: token
            .as_ref()
            .map(|t| t.status.available_actions())
            .unwrap_or_default(),
        confirmation_window,
        token,
    }))
}

/// Window for the patient's current token. Walk-ins and patients without a
/// token have none.
#[axum::debug_handler]
pub async fn get_my_window(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
) -> Result<Json<ConfirmationWindow>, AppError> {
    let token_service = TokenService::new(&state);
    let now = Local::now().naive_local();

    let token = token_service
        .my_token(&session)
        .await?
        .ok_or_else(|| AppError::NotFound("You have no active token.".to_string()))?;

    let window = token
        .confirmation_window(now)
        .ok_or_else(|| AppError::NotFound("This token has no confirmation window.".to_string()))?;

    Ok(Json(window))
}

#[axum::debug_handler]
pub async fn book_token(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Json(request): Json<BookTokenRequest>,
) -> Result<(StatusCode, Json<Token>), AppError> {
    let token_service = TokenService::new(&state);
    let now = Local::now().naive_local();

    let token = token_service.book(&session, &request, now).await?;

    Ok((StatusCode::CREATED, Json(token)))
}

#[axum::debug_handler]
pub async fn cancel_my_token(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let token_service = TokenService::new(&state);

    let message = token_service.cancel_mine(&session).await?;

    Ok(Json(json!({ "message": message })))
}

/// Looks up the patient's token first so a closed window is refused before
/// the position is sent.
#[axum::debug_handler]
pub async fn confirm_arrival(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Json(position): Json<Coordinates>,
) -> Result<Json<ArrivalOutcome>, AppError> {
    let token_service = TokenService::new(&state);
    let arrival_service = ArrivalService::new(&state);
    let now = Local::now().naive_local();

    let token = token_service.my_token(&session).await?;
    let outcome = arrival_service
        .confirm_arrival(&session, token.as_ref(), position, now)
        .await?;

    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn get_live_queue(
    Extension(monitor): Extension<Arc<QueueMonitor>>,
    Path((doctor_id, date)): Path<(i64, NaiveDate)>,
) -> Result<Json<QueueView>, AppError> {
    let today = Local::now().date_naive();

    let view = monitor.view(doctor_id, date, today).await?;

    Ok(Json(view))
}
