use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clinic_cell::router::clinic_routes;
use clinic_cell::{ClinicQuery, ClinicService};
use shared_api_client::{ClinicApiClient, ClinicApiError};
use shared_config::AppConfig;
use shared_utils::test_utils::{MockClinicResponses, TestConfig, TestUser};

fn create_test_app(config: AppConfig) -> Router {
    clinic_routes(Arc::new(config))
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn directory_backend() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/clinics/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockClinicResponses::clinic_listing(1, "City Clinic", "Bengaluru", json!([
                MockClinicResponses::doctor_listing(3, "Dr. Mehta", "General Medicine"),
                MockClinicResponses::doctor_listing(4, "Dr. Iyer", "Pediatrics"),
            ])),
            MockClinicResponses::clinic_listing(2, "Lake View", "Mysuru", json!([
                MockClinicResponses::doctor_listing(7, "Dr. Rao", "Dermatology"),
            ])),
        ])))
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_public_directory_needs_no_session() {
    let mock_server = directory_backend().await;
    let app = create_test_app(TestConfig::with_api_url(&mock_server.uri()).to_app_config());

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response.as_array().unwrap().len(), 2);
    assert_eq!(json_response[0]["doctors"][1]["specialization"], "Pediatrics");
    assert_eq!(json_response[0]["average_wait_time"], 14.5);
}

#[tokio::test]
async fn test_directory_filters_by_specialization() {
    let mock_server = directory_backend().await;
    let app = create_test_app(TestConfig::with_api_url(&mock_server.uri()).to_app_config());

    let request = Request::builder()
        .method("GET")
        .uri("/?specialization=derma")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response.as_array().unwrap().len(), 1);
    assert_eq!(json_response[0]["name"], "Lake View");
    assert_eq!(json_response[0]["doctors"][0]["id"], 7);
}

#[tokio::test]
async fn test_service_filters_by_city() {
    let mock_server = directory_backend().await;
    let config = TestConfig::with_api_url(&mock_server.uri()).to_app_config();
    let service = ClinicService::with_client(ClinicApiClient::new(&config));

    let query = ClinicQuery { city: Some("bengaluru".to_string()), specialization: None };
    let clinics = service.list_clinics(&query).await.unwrap();

    assert_eq!(clinics.len(), 1);
    assert_eq!(clinics[0].doctors.len(), 2);
    assert_eq!(clinics[0].total_tokens, Some(9));
}

#[tokio::test]
async fn test_staff_doctor_list_forwards_session() {
    let mock_server = MockServer::start().await;
    let user = TestUser::receptionist("frontdesk");

    Mock::given(method("GET"))
        .and(path("/doctors/"))
        .and(header("Authorization", user.auth_header()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockClinicResponses::doctor_listing(3, "Dr. Mehta", "General Medicine"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(TestConfig::with_api_url(&mock_server.uri()).to_app_config());

    let request = Request::builder()
        .method("GET")
        .uri("/doctors")
        .header("authorization", format!("Bearer {}", user.token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response[0]["name"], "Dr. Mehta");
}

#[tokio::test]
async fn test_doctor_list_requires_authorization() {
    let app = create_test_app(TestConfig::default().to_app_config());

    let request = Request::builder()
        .method("GET")
        .uri("/doctors")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_directory_outage_is_transport_error() {
    let config = TestConfig::with_api_url("http://127.0.0.1:9").to_app_config();
    let service = ClinicService::new(&config);

    let result = service.list_clinics(&ClinicQuery::default()).await;
    assert_matches!(result, Err(ClinicApiError::Transport(_)));
}
