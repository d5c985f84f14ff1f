use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use schedule_cell::{compute_confirmation_window, parse_time_of_day, ConfirmationWindow};
use shared_utils::validation::normalize_phone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Waiting,
    Confirmed,
    InConsultancy,
    Completed,
    Cancelled,
    Skipped,
}

impl TokenStatus {
    /// No further transitions are accepted from these.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TokenStatus::Completed | TokenStatus::Cancelled)
    }

    /// Statuses shown in the live queue.
    pub fn is_active(&self) -> bool {
        matches!(self, TokenStatus::Waiting | TokenStatus::Confirmed | TokenStatus::InConsultancy)
    }

    /// Live-queue ordering: in consultation first, then arrived, then waiting.
    pub fn queue_priority(&self) -> u8 {
        match self {
            TokenStatus::InConsultancy => 1,
            TokenStatus::Confirmed => 2,
            TokenStatus::Waiting => 3,
            _ => 4,
        }
    }

    /// Actions a staff view offers for a token in this status.
    pub fn available_actions(&self) -> Vec<TokenAction> {
        match self {
            TokenStatus::Waiting => vec![TokenAction::Confirm, TokenAction::Skip, TokenAction::Cancel],
            TokenStatus::Confirmed => vec![TokenAction::StartConsultation, TokenAction::Skip, TokenAction::Cancel],
            TokenStatus::InConsultancy => vec![TokenAction::Complete, TokenAction::Cancel],
            TokenStatus::Skipped => vec![TokenAction::Confirm, TokenAction::Cancel],
            TokenStatus::Completed | TokenStatus::Cancelled => Vec::new(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Waiting => "waiting",
            TokenStatus::Confirmed => "confirmed",
            TokenStatus::InConsultancy => "in_consultancy",
            TokenStatus::Completed => "completed",
            TokenStatus::Cancelled => "cancelled",
            TokenStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TokenStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "waiting" => Ok(TokenStatus::Waiting),
            "confirmed" => Ok(TokenStatus::Confirmed),
            "in_consultancy" => Ok(TokenStatus::InConsultancy),
            "completed" => Ok(TokenStatus::Completed),
            "cancelled" => Ok(TokenStatus::Cancelled),
            "skipped" => Ok(TokenStatus::Skipped),
            other => Err(format!("Unknown token status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenAction {
    Confirm,
    Cancel,
    Skip,
    StartConsultation,
    Complete,
}

impl TokenAction {
    pub fn target_status(&self) -> TokenStatus {
        match self {
            TokenAction::Confirm => TokenStatus::Confirmed,
            TokenAction::Cancel => TokenStatus::Cancelled,
            TokenAction::Skip => TokenStatus::Skipped,
            TokenAction::StartConsultation => TokenStatus::InConsultancy,
            TokenAction::Complete => TokenStatus::Completed,
        }
    }
}

impl FromStr for TokenAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "confirm" => Ok(TokenAction::Confirm),
            "cancel" => Ok(TokenAction::Cancel),
            "skip" => Ok(TokenAction::Skip),
            "start" | "start_consultation" => Ok(TokenAction::StartConsultation),
            "complete" => Ok(TokenAction::Complete),
            other => Err(format!("Unknown token action: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSummary {
    /// Absent on `get_my_token`, which sends the name only.
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicSummary {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl ClinicSummary {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            latitude: self.latitude?,
            longitude: self.longitude?,
        })
    }
}

/// One patient's place in a doctor's queue for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: i64,
    #[serde(default)]
    pub token_number: Option<String>,
    pub status: TokenStatus,
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    #[serde(default)]
    pub clinic_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub patient: Option<PatientSummary>,
    #[serde(default)]
    pub doctor: Option<DoctorSummary>,
    #[serde(default)]
    pub clinic: Option<ClinicSummary>,
}

impl Token {
    /// Walk-ins are queued by arrival rather than by slot.
    pub fn is_walk_in(&self) -> bool {
        self.appointment_time
            .as_deref()
            .map_or(true, |time| time.trim().is_empty())
    }

    /// `None` for walk-ins and tokens without a known date.
    pub fn confirmation_window(&self, now: NaiveDateTime) -> Option<ConfirmationWindow> {
        let time = self.appointment_time.as_deref()?;
        compute_confirmation_window(time, self.date?, now)
    }

    pub fn label(&self) -> String {
        self.token_number
            .clone()
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}

/// Anonymized row of the public live queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveQueueEntry {
    pub id: i64,
    #[serde(default)]
    pub token_number: Option<String>,
    pub status: TokenStatus,
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueView {
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub entries: Vec<LiveQueueEntry>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn validate(&self) -> Result<(), String> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("Latitude {} is out of range", self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("Longitude {} is out of range", self.longitude));
        }
        Ok(())
    }
}

/// Receptionist-created token; no `appointment_time` means walk-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    pub patient_name: String,
    pub patient_age: i32,
    pub phone_number: String,
    pub assigned_doctor: i64,
    #[serde(default)]
    pub appointment_time: Option<String>,
}

impl CreateTokenRequest {
    /// Phone number as sent to the backend, `None` when it is not valid.
    pub fn normalized_phone(&self) -> Option<String> {
        normalize_phone(&self.phone_number)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.patient_name.trim().is_empty() {
            return Err("Patient name is required.".to_string());
        }
        if !(1..=150).contains(&self.patient_age) {
            return Err("Patient age must be between 1 and 150.".to_string());
        }
        if self.normalized_phone().is_none() {
            return Err("Phone number must contain 10 to 15 digits.".to_string());
        }
        if let Some(time) = self.appointment_time.as_deref().filter(|t| !t.trim().is_empty()) {
            if parse_time_of_day(time).is_none() {
                return Err(format!("Invalid appointment time: {}", time));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookTokenRequest {
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub action: TokenAction,
    /// Status the caller last saw, if known.
    #[serde(default)]
    pub current_status: Option<TokenStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrivalResponse {
    pub token: Token,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrivalOutcome {
    pub token: Token,
    pub message: String,
    /// Advisory distance to the clinic, when the clinic location is known.
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyTokenResponse {
    pub token: Option<Token>,
    pub confirmation_window: Option<ConfirmationWindow>,
    pub window_message: Option<String>,
    pub available_actions: Vec<TokenAction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_in_request() -> CreateTokenRequest {
        CreateTokenRequest {
            patient_name: "Ravi Kumar".to_string(),
            patient_age: 52,
            phone_number: "+91 98765 43210".to_string(),
            assigned_doctor: 3,
            appointment_time: None,
        }
    }

    #[test]
    fn terminal_statuses_offer_no_actions() {
        assert!(TokenStatus::Completed.available_actions().is_empty());
        assert!(TokenStatus::Cancelled.available_actions().is_empty());
        assert!(!TokenStatus::Skipped.is_terminal());
        assert!(TokenStatus::Waiting.available_actions().contains(&TokenAction::Confirm));
    }

    #[test]
    fn actions_map_to_backend_statuses() {
        assert_eq!(TokenAction::StartConsultation.target_status().as_str(), "in_consultancy");
        assert_eq!("start".parse::<TokenAction>().unwrap(), TokenAction::StartConsultation);
        assert_eq!("Start-Consultation".parse::<TokenAction>().unwrap(), TokenAction::StartConsultation);
        assert!("teleport".parse::<TokenAction>().is_err());
    }

    #[test]
    fn status_round_trips_through_backend_names() {
        let status: TokenStatus = serde_json::from_str("\"in_consultancy\"").unwrap();
        assert_eq!(status, TokenStatus::InConsultancy);
        assert_eq!(serde_json::to_string(&TokenStatus::Skipped).unwrap(), "\"skipped\"");
        assert_eq!("In-Consultancy".parse::<TokenStatus>().unwrap(), TokenStatus::InConsultancy);
    }

    #[test]
    fn walk_in_request_is_valid() {
        let request = walk_in_request();
        assert!(request.validate().is_ok());
        assert_eq!(request.normalized_phone().as_deref(), Some("+919876543210"));
    }

    #[test]
    fn bad_requests_are_rejected() {
        let mut request = walk_in_request();
        request.patient_name = "  ".to_string();
        assert!(request.validate().is_err());

        let mut request = walk_in_request();
        request.patient_age = 0;
        assert!(request.validate().is_err());

        let mut request = walk_in_request();
        request.phone_number = "12345".to_string();
        assert!(request.validate().is_err());

        let mut request = walk_in_request();
        request.appointment_time = Some("quarter past nine".to_string());
        assert!(request.validate().is_err());
    }

    #[test]
    fn token_without_time_is_walk_in_and_has_no_window() {
        let token: Token = serde_json::from_value(serde_json::json!({
            "id": 5,
            "status": "waiting",
            "appointment_time": null,
            "date": "2024-06-12"
        }))
        .unwrap();

        let now = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap().and_hms_opt(9, 0, 0).unwrap();
        assert!(token.is_walk_in());
        assert!(token.confirmation_window(now).is_none());
        assert_eq!(token.label(), "#5");
    }

    #[test]
    fn coordinates_are_range_checked() {
        assert!(Coordinates { latitude: 12.97, longitude: 77.59 }.validate().is_ok());
        assert!(Coordinates { latitude: 91.0, longitude: 0.0 }.validate().is_err());
        assert!(Coordinates { latitude: 0.0, longitude: -181.0 }.validate().is_err());
        assert!(Coordinates { latitude: f64::NAN, longitude: 0.0 }.validate().is_err());
    }
}
