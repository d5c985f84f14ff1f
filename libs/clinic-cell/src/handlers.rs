use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};

use shared_config::AppConfig;
use shared_models::auth::Session;
use shared_models::error::AppError;

use crate::models::{ClinicListing, ClinicQuery, DoctorListing};
use crate::services::ClinicService;

#[axum::debug_handler]
pub async fn list_clinics(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ClinicQuery>,
) -> Result<Json<Vec<ClinicListing>>, AppError> {
    let clinic_service = ClinicService::new(&state);

    let clinics = clinic_service.list_clinics(&query).await?;

    Ok(Json(clinics))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<DoctorListing>>, AppError> {
    let clinic_service = ClinicService::new(&state);

    let doctors = clinic_service.list_doctors(&session).await?;

    Ok(Json(doctors))
}
