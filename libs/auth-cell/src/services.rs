use serde_json::json;
use tracing::{info, instrument};

use shared_api_client::{ClinicApiClient, ClinicApiError};
use shared_config::AppConfig;
use shared_models::auth::{LoginRequest, LoginResponse, MeResponse, RegisterRequest, Session, SessionUser};
use shared_utils::validation::normalize_phone;

pub struct AuthService {
    client: ClinicApiClient,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: ClinicApiClient::new(config),
        }
    }

    pub fn with_client(client: ClinicApiClient) -> Self {
        Self { client }
    }

    /// Exchanges credentials for a backend token. Staff logins go through the
    /// staff endpoint, which refuses non-staff accounts.
    #[instrument(skip(self, request), fields(username = %request.username, staff = request.staff))]
    pub async fn login(&self, request: &LoginRequest) -> Result<Session, ClinicApiError> {
        if request.username.trim().is_empty() || request.password.is_empty() {
            return Err(ClinicApiError::Validation("Username and password are required.".to_string()));
        }

        let path = if request.staff { "/login/staff/" } else { "/login/" };
        let body = json!({
            "username": request.username.trim(),
            "password": request.password,
        });

        let response: LoginResponse = self.client.post(path, None, body).await?;
        info!("Logged in {} as {}", response.user.username, response.user.role);

        Ok(Session::from(response))
    }

    /// Creates a patient account and returns its session. The backend wants
    /// the phone number in international form, so a leading `+` is required.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<Session, ClinicApiError> {
        let username = request.username.trim();
        let name = request.name.trim();
        if username.is_empty() || request.password.is_empty() || name.is_empty() {
            return Err(ClinicApiError::Validation("Username, password and name are required.".to_string()));
        }
        if request.password != request.password_confirmation {
            return Err(ClinicApiError::Validation("Password fields didn't match.".to_string()));
        }
        if !(1..=150).contains(&request.age) {
            return Err(ClinicApiError::Validation("Age must be between 1 and 150.".to_string()));
        }
        let phone_number = normalize_phone(&request.phone_number)
            .filter(|phone| phone.starts_with('+'))
            .ok_or_else(|| ClinicApiError::Validation(
                "Phone number must start with '+' followed by 10 to 15 digits.".to_string(),
            ))?;

        let body = json!({
            "username": username,
            "password": request.password,
            "password2": request.password_confirmation,
            "name": name,
            "age": request.age,
            "phone_number": phone_number,
        });

        let response: LoginResponse = self.client.post("/register/patient/", None, body).await?;
        info!("Registered patient {}", response.user.username);

        Ok(Session::from(response))
    }

    /// Profile behind the session's token.
    pub async fn me(&self, session: &Session) -> Result<SessionUser, ClinicApiError> {
        let response: MeResponse = self.client.get("/me/", Some(session)).await?;
        Ok(response.user)
    }

    /// Fills in the profile of a token-only session.
    pub async fn refresh(&self, session: &Session) -> Result<Session, ClinicApiError> {
        let user = self.me(session).await?;
        Ok(Session {
            token: session.token.clone(),
            user: Some(user),
        })
    }
}
