use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum ClinicApiError {
    /// The request never produced an HTTP response (connect, timeout, TLS).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The backend answered but refused the request on a business rule.
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Refused locally before anything was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ClinicApiError {
    /// Message suitable for showing inline to the user.
    pub fn user_message(&self) -> String {
        match self {
            ClinicApiError::Transport(_) => "Could not reach the clinic server. Please try again.".to_string(),
            ClinicApiError::Auth(msg)
            | ClinicApiError::NotFound(msg)
            | ClinicApiError::Validation(msg)
            | ClinicApiError::Decode(msg) => msg.clone(),
            ClinicApiError::Rejected { message, .. } => message.clone(),
        }
    }
}

impl From<ClinicApiError> for AppError {
    fn from(err: ClinicApiError) -> Self {
        match err {
            ClinicApiError::Transport(e) => AppError::ExternalService(e.to_string()),
            ClinicApiError::Auth(msg) => AppError::Auth(msg),
            ClinicApiError::NotFound(msg) => AppError::NotFound(msg),
            ClinicApiError::Rejected { status: 409, message } => AppError::Conflict(message),
            ClinicApiError::Rejected { status, message } => AppError::Rejected { status, message },
            ClinicApiError::Validation(msg) => AppError::ValidationError(msg),
            ClinicApiError::Decode(msg) => AppError::ExternalService(msg),
        }
    }
}
