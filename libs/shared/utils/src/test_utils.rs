use std::sync::Arc;

use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{ClinicRef, Role, Session, SessionUser};

pub struct TestConfig {
    pub clinic_api_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            clinic_api_url: "http://localhost:8000/api".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_api_url(url: &str) -> Self {
        Self {
            clinic_api_url: url.to_string(),
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig::with_api_url(self.clinic_api_url.clone())
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub token: String,
}

impl TestUser {
    pub fn new(username: &str, role: Role) -> Self {
        Self {
            id: 42,
            username: username.to_string(),
            role,
            token: format!("test-token-{}", username),
        }
    }

    pub fn patient(username: &str) -> Self {
        Self::new(username, Role::Patient)
    }

    pub fn doctor(username: &str) -> Self {
        Self::new(username, Role::Doctor)
    }

    pub fn receptionist(username: &str) -> Self {
        Self::new(username, Role::Receptionist)
    }

    pub fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    pub fn to_session(&self) -> Session {
        Session {
            token: self.token.clone(),
            user: Some(SessionUser {
                id: self.id,
                username: self.username.clone(),
                name: None,
                role: self.role,
                clinic: Some(ClinicRef { id: 1, name: "City Clinic".to_string() }),
            }),
        }
    }
}

pub struct MockClinicResponses;

impl MockClinicResponses {
    pub fn login_response(user: &TestUser) -> Value {
        json!({
            "token": user.token,
            "user": {
                "id": user.id,
                "username": user.username,
                "name": "Test User",
                "role": user.role,
                "clinic": { "id": 1, "name": "City Clinic" }
            }
        })
    }

    pub fn schedule_response(doctor_id: i64, start: &str, end: &str, duration: i64) -> Value {
        json!({
            "id": doctor_id * 10,
            "doctor_id": doctor_id,
            "doctor_name": "Dr. Mehta",
            "start_time": start,
            "end_time": end,
            "slot_duration_minutes": duration,
            "max_slots_per_day": null,
            "is_active": true
        })
    }

    pub fn token_response(id: i64, status: &str, appointment_time: Option<&str>, date: &str) -> Value {
        json!({
            "id": id,
            "token_number": format!("A{:03}", id),
            "status": status,
            "appointment_time": appointment_time,
            "date": date,
            "doctor_id": 3,
            "clinic_id": 1,
            "created_at": format!("{}T08:00:00Z", date),
            "patient": { "id": 11, "name": "Asha Rao", "age": 34, "phone_number": "+919876543210" },
            "doctor": { "id": 3, "name": "Dr. Mehta", "specialization": "General Medicine" },
            "clinic": { "id": 1, "name": "City Clinic", "latitude": 12.9716, "longitude": 77.5946 }
        })
    }

    /// `GET /tokens/get_my_token/` body: the serializer output with `doctor`
    /// and `clinic` replaced by name-only objects and `date` appended.
    pub fn my_token_response(id: i64, status: &str, appointment_time: Option<&str>, date: &str) -> Value {
        json!({
            "id": id,
            "token_number": format!("A{:03}", id),
            "patient": {
                "id": 11,
                "name": "Asha Rao",
                "age": 34,
                "user": { "id": 42, "username": "asha" },
                "phone_number": "+919876543210"
            },
            "doctor": { "name": "Dr. Mehta" },
            "doctor_id": 3,
            "created_at": format!("{}T13:30:00.512345+05:30", date),
            "status": status,
            "clinic": { "name": "City Clinic" },
            "clinic_id": 1,
            "appointment_time": appointment_time,
            "date": date
        })
    }

    pub fn clinic_listing(id: i64, name: &str, city: &str, doctors: Value) -> Value {
        json!({
            "id": id,
            "name": name,
            "address": "12 MG Road",
            "city": city,
            "doctors": doctors,
            "average_wait_time": 14.5,
            "total_tokens": 9
        })
    }

    pub fn doctor_listing(id: i64, name: &str, specialization: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "specialization": specialization,
            "user": { "id": id + 100, "username": format!("doctor{}", id) }
        })
    }

    pub fn queue_entry(id: i64, status: &str, appointment_time: Option<&str>, created_at: &str) -> Value {
        json!({
            "id": id,
            "token_number": format!("A{:03}", id),
            "status": status,
            "appointment_time": appointment_time,
            "created_at": created_at
        })
    }
}
