use std::sync::Arc;
use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Local, NaiveDate};
use tower::ServiceExt;
use serde_json::{json, Value};
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, header};

use schedule_cell::router::schedule_routes;
use schedule_cell::services::ScheduleService;
use schedule_cell::DoctorSchedule;
use shared_api_client::ClinicApiError;
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_utils::test_utils::{TestConfig, TestUser, MockClinicResponses};

fn create_test_app(config: AppConfig) -> Router {
    schedule_routes(Arc::new(config))
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_list_schedules_forwards_session() {
    let mock_server = MockServer::start().await;
    let user = TestUser::receptionist("frontdesk");

    Mock::given(method("GET"))
        .and(path("/schedules/"))
        .and(header("Authorization", user.auth_header()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockClinicResponses::schedule_response(3, "09:00:00", "17:00:00", 15),
            MockClinicResponses::schedule_response(4, "10:00:00", "13:00:00", 20),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(TestConfig::with_api_url(&mock_server.uri()).to_app_config());

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .header("authorization", format!("Bearer {}", user.token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response.as_array().unwrap().len(), 2);
    assert_eq!(json_response[0]["doctor_id"], 3);
    assert_eq!(json_response[1]["slot_duration_minutes"], 20);
}

#[tokio::test]
async fn test_protected_routes_require_authorization() {
    let app = create_test_app(TestConfig::default().to_app_config());

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_schedule_unknown_doctor_is_not_found() {
    let mock_server = MockServer::start().await;
    let user = TestUser::receptionist("frontdesk");

    Mock::given(method("GET"))
        .and(path("/schedules/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockClinicResponses::schedule_response(3, "09:00:00", "17:00:00", 15),
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(TestConfig::with_api_url(&mock_server.uri()).to_app_config());

    let request = Request::builder()
        .method("GET")
        .uri("/99")
        .header("authorization", user.auth_header())
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_available_slots_for_future_date_pass_through() {
    let mock_server = MockServer::start().await;
    let user = TestUser::patient("asha");
    let date = Local::now().date_naive() + chrono::Duration::days(2);

    Mock::given(method("GET"))
        .and(path(format!("/doctors/3/available-slots/{}/", date.format("%Y-%m-%d"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["09:00", "09:15", "09:45"])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(TestConfig::with_api_url(&mock_server.uri()).to_app_config());

    let request = Request::builder()
        .method("GET")
        .uri(format!("/3/slots/{}", date.format("%Y-%m-%d")))
        .header("authorization", user.auth_header())
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response["slots"], json!(["09:00", "09:15", "09:45"]));
    assert_eq!(json_response["total"], 3);
}

#[tokio::test]
async fn test_backend_rejection_is_surfaced() {
    let mock_server = MockServer::start().await;
    let user = TestUser::patient("asha");

    Mock::given(method("GET"))
        .and(path("/doctors/3/available-slots/2030-01-15/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "Invalid date format. Use YYYY-MM-DD."
        })))
        .mount(&mock_server)
        .await;

    let app = create_test_app(TestConfig::with_api_url(&mock_server.uri()).to_app_config());

    let request = Request::builder()
        .method("GET")
        .uri("/3/slots/2030-01-15")
        .header("authorization", user.auth_header())
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid date format. Use YYYY-MM-DD.");
}

#[tokio::test]
async fn test_preview_computes_locally() {
    let app = create_test_app(TestConfig::default().to_app_config());

    let request_body = json!({
        "schedule": {
            "doctor": 3,
            "start_time": "09:00",
            "end_time": "10:00",
            "slot_duration_minutes": 15,
            "max_slots_per_day": 3,
            "is_active": true
        },
        "booked_times": ["09:15"],
        "date": "2020-01-06"
    });

    let request = Request::builder()
        .method("POST")
        .uri("/preview")
        .header("content-type", "application/json")
        .body(Body::from(request_body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response["doctor_id"], 3);
    assert_eq!(json_response["slots"], json!(["09:00", "09:30", "09:45"]));
}

#[tokio::test]
async fn test_preview_rejects_schedules_that_cannot_produce_slots() {
    let cases = [
        ("09:00", "10:00", 0),
        ("9am", "10:00", 15),
        ("09:00", "25:00", 15),
    ];

    for (start, end, duration) in cases {
        let app = create_test_app(TestConfig::default().to_app_config());

        let request_body = json!({
            "schedule": {
                "doctor_id": 3,
                "start_time": start,
                "end_time": end,
                "slot_duration_minutes": duration
            },
            "date": "2020-01-06"
        });

        let request = Request::builder()
            .method("POST")
            .uri("/preview")
            .header("content-type", "application/json")
            .body(Body::from(request_body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{} - {} / {}", start, end, duration);
    }
}

#[test]
fn test_preview_names_the_malformed_field() {
    let schedule = DoctorSchedule::new(3, "09:00", "5pm", 15);
    let now = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap().and_hms_opt(8, 0, 0).unwrap();

    let result = ScheduleService::preview_slots(&schedule, &[], now.date(), now);
    assert_matches!(result, Err(ClinicApiError::Validation(msg)) if msg.contains("end_time"));
}

#[tokio::test]
async fn test_service_trims_past_slots_today() {
    let mock_server = MockServer::start().await;
    let session = TestUser::new("frontdesk", Role::Receptionist).to_session();
    let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();

    Mock::given(method("GET"))
        .and(path("/doctors/3/available-slots/2024-06-12/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["09:00", "09:30:00", "10:00"])))
        .mount(&mock_server)
        .await;

    let service = ScheduleService::new(&TestConfig::with_api_url(&mock_server.uri()).to_app_config());
    let now = today.and_hms_opt(9, 20, 0).unwrap();

    let slots = service.available_slots(Some(&session), 3, today, now).await.unwrap();
    assert_eq!(slots, vec!["09:30", "10:00"]);
}
