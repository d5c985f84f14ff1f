use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A doctor's working hours as stored by the backend. Times stay strings so
/// malformed data can reach slot derivation and degrade to "no slots".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSchedule {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(alias = "doctor")]
    pub doctor_id: i64,
    #[serde(default)]
    pub doctor_name: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub slot_duration_minutes: i32,
    #[serde(default)]
    pub max_slots_per_day: Option<i32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl DoctorSchedule {
    pub fn new(doctor_id: i64, start_time: &str, end_time: &str, slot_duration_minutes: i32) -> Self {
        Self {
            id: None,
            doctor_id,
            doctor_name: None,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            slot_duration_minutes,
            max_slots_per_day: None,
            is_active: true,
        }
    }

    pub fn with_max_slots(mut self, max_slots_per_day: i32) -> Self {
        self.max_slots_per_day = Some(max_slots_per_day);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPhase {
    NotToday,
    Upcoming,
    Open,
    Passed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub is_open: bool,
    pub phase: WindowPhase,
}

impl ConfirmationWindow {
    /// Inline hint for a patient waiting on the confirm button.
    pub fn message(&self) -> Option<String> {
        match self.phase {
            WindowPhase::Open => None,
            WindowPhase::Upcoming => Some(format!(
                "You can confirm arrival starting from {}",
                self.start.format("%-I:%M %p")
            )),
            WindowPhase::Passed => Some("Your confirmation window has passed.".to_string()),
            WindowPhase::NotToday => Some("Arrival can only be confirmed on the day of the appointment.".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotPreviewRequest {
    pub schedule: DoctorSchedule,
    #[serde(default)]
    pub booked_times: Vec<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotsResponse {
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub slots: Vec<String>,
    pub total: usize,
}
