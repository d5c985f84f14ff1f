use std::sync::Arc;

use axum::{
    extract::{Path, State, Extension},
    Json,
};
use chrono::{Local, NaiveDate};

use shared_config::AppConfig;
use shared_models::auth::Session;
use shared_models::error::AppError;

use crate::models::{DoctorSchedule, SlotPreviewRequest, SlotsResponse};
use crate::services::ScheduleService;

#[axum::debug_handler]
pub async fn list_schedules(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<DoctorSchedule>>, AppError> {
    let schedule_service = ScheduleService::new(&state);

    let schedules = schedule_service.list_schedules(&session).await?;

    Ok(Json(schedules))
}

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<DoctorSchedule>, AppError> {
    let schedule_service = ScheduleService::new(&state);

    let schedule = schedule_service.get_schedule(&session, doctor_id).await?;

    Ok(Json(schedule))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Extension(session): Extension<Session>,
    Path((doctor_id, date)): Path<(i64, NaiveDate)>,
) -> Result<Json<SlotsResponse>, AppError> {
    let schedule_service = ScheduleService::new(&state);
    let now = Local::now().naive_local();

    let slots = schedule_service
        .available_slots(Some(&session), doctor_id, date, now)
        .await?;

    Ok(Json(SlotsResponse {
        doctor_id,
        date,
        total: slots.len(),
        slots,
    }))
}

/// Slot list for a schedule that has not been saved yet.
#[axum::debug_handler]
pub async fn preview_slots(
    Json(request): Json<SlotPreviewRequest>,
) -> Result<Json<SlotsResponse>, AppError> {
    let now = Local::now().naive_local();
    let slots = ScheduleService::preview_slots(&request.schedule, &request.booked_times, request.date, now)?;

    Ok(Json(SlotsResponse {
        doctor_id: request.schedule.doctor_id,
        date: request.date,
        total: slots.len(),
        slots,
    }))
}
