use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, instrument};

use shared_api_client::{ClinicApiClient, ClinicApiError};
use shared_config::AppConfig;
use shared_models::auth::Session;

use crate::models::DoctorSchedule;
use crate::services::slots::{compute_slots, filter_past_slots, parse_time_of_day, format_slot};

pub struct ScheduleService {
    client: ClinicApiClient,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: ClinicApiClient::new(config),
        }
    }

    pub fn with_client(client: ClinicApiClient) -> Self {
        Self { client }
    }

    /// Schedules for every doctor in the caller's clinic.
    #[instrument(skip(self, session))]
    pub async fn list_schedules(&self, session: &Session) -> Result<Vec<DoctorSchedule>, ClinicApiError> {
        let schedules: Vec<DoctorSchedule> = self.client.get("/schedules/", Some(session)).await?;
        debug!("Fetched {} schedules", schedules.len());
        Ok(schedules)
    }

    pub async fn get_schedule(&self, session: &Session, doctor_id: i64) -> Result<DoctorSchedule, ClinicApiError> {
        self.list_schedules(session)
            .await?
            .into_iter()
            .find(|schedule| schedule.doctor_id == doctor_id)
            .ok_or_else(|| ClinicApiError::NotFound(format!("No schedule for doctor {}", doctor_id)))
    }

    /// Server-computed free slots, with already-started slots removed locally
    /// when `date` is today. The server list is never extended, only trimmed.
    #[instrument(skip(self, session))]
    pub async fn available_slots(
        &self,
        session: Option<&Session>,
        doctor_id: i64,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Vec<String>, ClinicApiError> {
        let path = format!("/doctors/{}/available-slots/{}/", doctor_id, date.format("%Y-%m-%d"));
        let raw: Vec<String> = self.client.get(&path, session).await?;

        let normalized = raw
            .iter()
            .filter_map(|slot| parse_time_of_day(slot))
            .map(format_slot)
            .collect();

        let slots = filter_past_slots(normalized, date, now);
        debug!("Doctor {} has {} of {} server slots left on {}", doctor_id, slots.len(), raw.len(), date);
        Ok(slots)
    }

    /// Slots for a schedule that has not been saved, computed locally. A
    /// schedule that could never produce slots is refused, not previewed empty.
    pub fn preview_slots(
        schedule: &DoctorSchedule,
        booked_times: &[String],
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Vec<String>, ClinicApiError> {
        if schedule.slot_duration_minutes <= 0 {
            return Err(ClinicApiError::Validation(
                "slot_duration_minutes must be greater than zero".to_string(),
            ));
        }
        for (field, value) in [("start_time", &schedule.start_time), ("end_time", &schedule.end_time)] {
            if parse_time_of_day(value).is_none() {
                return Err(ClinicApiError::Validation(format!("{} must be HH:MM, got {:?}", field, value)));
            }
        }
        Ok(compute_slots(schedule, booked_times, date, now))
    }
}
