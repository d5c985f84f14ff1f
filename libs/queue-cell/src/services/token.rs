use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use shared_api_client::{ClinicApiClient, ClinicApiError, Method};
use shared_config::AppConfig;
use shared_models::auth::Session;
use schedule_cell::{format_slot, parse_time_of_day};

use crate::models::{
    BookTokenRequest, CreateTokenRequest, LiveQueueEntry, Token, TokenAction, TokenStatus,
};
use crate::services::queue::order_live_queue;

pub struct TokenService {
    client: ClinicApiClient,
}

impl TokenService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: ClinicApiClient::new(config),
        }
    }

    pub fn with_client(client: ClinicApiClient) -> Self {
        Self { client }
    }

    /// Staff view of the clinic's tokens; the backend defaults to today.
    #[instrument(skip(self, session))]
    pub async fn list_tokens(&self, session: &Session, date: Option<NaiveDate>) -> Result<Vec<Token>, ClinicApiError> {
        let path = match date {
            Some(date) => format!("/tokens/?date={}", date.format("%Y-%m-%d")),
            None => "/tokens/".to_string(),
        };
        self.client.get(&path, Some(session)).await
    }

    /// Walk-in or slot-bound token created at the front desk.
    #[instrument(skip(self, session, request), fields(doctor_id = request.assigned_doctor))]
    pub async fn create_token(&self, session: &Session, request: &CreateTokenRequest) -> Result<Token, ClinicApiError> {
        request.validate().map_err(ClinicApiError::Validation)?;

        let phone_number = request.normalized_phone().unwrap_or_default();
        let appointment_time = request
            .appointment_time
            .as_deref()
            .and_then(parse_time_of_day)
            .map(format_slot)
            .unwrap_or_default();

        let body = json!({
            "patient_name": request.patient_name.trim(),
            "patient_age": request.patient_age,
            "phone_number": phone_number,
            "assigned_doctor": request.assigned_doctor,
            "appointment_time": appointment_time,
        });

        let token: Token = self.client.post("/tokens/", Some(session), body).await?;
        info!("Created token {} ({})", token.label(), if token.is_walk_in() { "walk-in" } else { "slot" });
        Ok(token)
    }

    /// Requests a status transition. When the caller knows the current status
    /// and it is terminal, the request is refused without a round trip.
    #[instrument(skip(self, session))]
    pub async fn update_status(
        &self,
        session: &Session,
        token_id: i64,
        action: TokenAction,
        current_status: Option<TokenStatus>,
    ) -> Result<Token, ClinicApiError> {
        if let Some(current) = current_status.filter(TokenStatus::is_terminal) {
            return Err(ClinicApiError::Validation(format!("Cannot change status from {}.", current)));
        }

        let target = action.target_status();
        let path = format!("/tokens/{}/update_status/", token_id);
        let token: Token = self.client
            .patch(&path, Some(session), json!({ "status": target }))
            .await?;

        debug!("Token {} is now {}", token_id, token.status);
        Ok(token)
    }

    /// The patient's active or upcoming token, if any.
    pub async fn my_token(&self, session: &Session) -> Result<Option<Token>, ClinicApiError> {
        self.client
            .request_optional(Method::GET, "/tokens/get_my_token/", Some(session), None)
            .await
    }

    /// Patient self-booking of a slot. Past dates are refused locally.
    #[instrument(skip(self, session))]
    pub async fn book(&self, session: &Session, request: &BookTokenRequest, now: NaiveDateTime) -> Result<Token, ClinicApiError> {
        if request.date < now.date() {
            return Err(ClinicApiError::Validation("Cannot book appointments for past dates.".to_string()));
        }
        let time = parse_time_of_day(&request.time)
            .ok_or_else(|| ClinicApiError::Validation(format!("Invalid time slot: {}", request.time)))?;
        if request.date == now.date() && time < now.time() {
            return Err(ClinicApiError::Validation("That time slot has already passed.".to_string()));
        }

        let body = json!({
            "doctor_id": request.doctor_id,
            "date": request.date.format("%Y-%m-%d").to_string(),
            "time": format_slot(time),
        });

        let token: Token = self.client.post("/tokens/patient_create/", Some(session), body).await?;
        info!("Booked token {} with doctor {} on {} at {}", token.label(), request.doctor_id, request.date, format_slot(time));
        Ok(token)
    }

    /// Cancels the patient's own active token; returns the backend message.
    pub async fn cancel_mine(&self, session: &Session) -> Result<String, ClinicApiError> {
        let response: Value = self.client
            .post("/tokens/patient_cancel/", Some(session), json!({}))
            .await?;

        Ok(response
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Your token has been cancelled.")
            .to_string())
    }

    /// Public, anonymized live queue for one doctor and date.
    pub async fn live_queue(&self, doctor_id: i64, date: NaiveDate) -> Result<Vec<LiveQueueEntry>, ClinicApiError> {
        let path = format!("/patient/queue/{}/{}/", doctor_id, date.format("%Y-%m-%d"));
        let entries: Vec<LiveQueueEntry> = self.client.get(&path, None).await?;
        Ok(order_live_queue(entries))
    }
}
