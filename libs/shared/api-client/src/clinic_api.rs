use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_models::auth::Session;

use crate::error::ClinicApiError;

/// Thin REST client for the clinic backend. Every call takes the caller's
/// session explicitly; the client itself holds no credentials.
#[derive(Clone)]
pub struct ClinicApiClient {
    client: Client,
    base_url: String,
}

impl ClinicApiClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.api_base_url().to_string(),
        }
    }

    fn get_headers(&self, session: Option<&Session>) -> Result<HeaderMap, ClinicApiError> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(session) = session {
            let value = HeaderValue::from_str(&session.authorization_value())
                .map_err(|_| ClinicApiError::Auth("Session token contains invalid characters".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            session: Option<&Session>, body: Option<Value>)
                            -> Result<T, ClinicApiError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let headers = self.get_headers(session)?;

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = extract_error_message(&text)
                .unwrap_or_else(|| format!("Request failed with status {}", status));
            if status.is_server_error() {
                error!("API error ({}): {}", status, message);
            } else {
                debug!("API rejected request ({}): {}", status, message);
            }

            return Err(match status {
                StatusCode::UNAUTHORIZED => ClinicApiError::Auth(message),
                StatusCode::NOT_FOUND => ClinicApiError::NotFound(message),
                _ => ClinicApiError::Rejected { status: status.as_u16(), message },
            });
        }

        // Some mutation endpoints answer with an empty body.
        let payload = if text.trim().is_empty() { "null" } else { text.as_str() };

        serde_json::from_str::<T>(payload)
            .map_err(|e| ClinicApiError::Decode(format!("{} ({})", e, path)))
    }

    /// Like [`request`](Self::request) but maps a 404 to `None`.
    pub async fn request_optional<T>(&self, method: Method, path: &str,
                                     session: Option<&Session>, body: Option<Value>)
                                     -> Result<Option<T>, ClinicApiError>
    where T: DeserializeOwned {
        match self.request(method, path, session, body).await {
            Ok(value) => Ok(Some(value)),
            Err(ClinicApiError::NotFound(msg)) => {
                debug!("{} not found: {}", path, msg);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, session: Option<&Session>) -> Result<T, ClinicApiError> {
        self.request(Method::GET, path, session, None).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, session: Option<&Session>, body: Value) -> Result<T, ClinicApiError> {
        self.request(Method::POST, path, session, Some(body)).await
    }

    pub async fn patch<T: DeserializeOwned>(&self, path: &str, session: Option<&Session>, body: Value) -> Result<T, ClinicApiError> {
        self.request(Method::PATCH, path, session, Some(body)).await
    }
}

/// The backend reports failures as `{"error": ..}`, DRF as `{"detail": ..}`,
/// and serializer failures as `{"field": ["msg", ..]}`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    if let Some(msg) = value.get("error").and_then(Value::as_str) {
        return Some(msg.to_string());
    }
    if let Some(msg) = value.get("detail").and_then(Value::as_str) {
        return Some(msg.to_string());
    }

    let fields = value.as_object()?;
    let parts: Vec<String> = fields.iter()
        .filter_map(|(field, messages)| {
            let first = messages.as_array()?.first()?.as_str()?;
            Some(format!("{}: {}", field, first))
        })
        .collect();

    if parts.is_empty() { None } else { Some(parts.join("; ")) }
}
