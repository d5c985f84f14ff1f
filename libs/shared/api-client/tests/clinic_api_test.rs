use assert_matches::assert_matches;
use serde_json::{json, Value};
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, header};

use shared_api_client::{ClinicApiClient, ClinicApiError};
use shared_config::AppConfig;
use shared_models::auth::Session;

async fn client_for(server: &MockServer) -> ClinicApiClient {
    ClinicApiClient::new(&AppConfig::with_api_url(server.uri()))
}

#[tokio::test]
async fn test_get_sends_token_authorization() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tokens/"))
        .and(header("Authorization", "Token abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let session = Session::from_token("abc123");

    let tokens: Vec<Value> = client.get("/tokens/", Some(&session)).await.unwrap();
    assert!(tokens.is_empty());
}

#[tokio::test]
async fn test_business_rejection_carries_backend_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tokens/patient_create/"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "This slot was just booked. Please select another time."
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let session = Session::from_token("abc123");

    let result: Result<Value, _> = client
        .post("/tokens/patient_create/", Some(&session), json!({"doctor_id": 1}))
        .await;

    assert_matches!(
        result,
        Err(ClinicApiError::Rejected { status: 409, ref message }) if message.contains("just booked")
    );
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Invalid token."
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let result: Result<Value, _> = client.get("/me/", Some(&Session::from_token("stale"))).await;

    assert_matches!(result, Err(ClinicApiError::Auth(ref msg)) if msg == "Invalid token.");
}

#[tokio::test]
async fn test_request_optional_maps_404_to_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tokens/get_my_token/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "No active or upcoming appointments found."
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let result: Option<Value> = client
        .request_optional(reqwest::Method::GET, "/tokens/get_my_token/", Some(&Session::from_token("abc")), None)
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_undecodable_body_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/schedules/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let result: Result<Vec<Value>, _> = client.get("/schedules/", None).await;

    assert_matches!(result, Err(ClinicApiError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Nothing listens on port 9 locally.
    let client = ClinicApiClient::new(&AppConfig::with_api_url("http://127.0.0.1:9"));
    let result: Result<Value, _> = client.get("/schedules/", None).await;

    assert_matches!(result, Err(ClinicApiError::Transport(_)));
}
