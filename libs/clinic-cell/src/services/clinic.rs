use tracing::{debug, instrument};

use shared_api_client::{ClinicApiClient, ClinicApiError};
use shared_config::AppConfig;
use shared_models::auth::Session;

use crate::models::{ClinicListing, ClinicQuery, DoctorListing};
use crate::services::directory::filter_clinics;

pub struct ClinicService {
    client: ClinicApiClient,
}

impl ClinicService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: ClinicApiClient::new(config),
        }
    }

    pub fn with_client(client: ClinicApiClient) -> Self {
        Self { client }
    }

    /// Public clinic directory with each clinic's doctors, narrowed locally.
    #[instrument(skip(self))]
    pub async fn list_clinics(&self, query: &ClinicQuery) -> Result<Vec<ClinicListing>, ClinicApiError> {
        let clinics: Vec<ClinicListing> = self.client.get("/public/clinics/", None).await?;
        let total = clinics.len();

        let clinics = filter_clinics(clinics, query);
        debug!("{} of {} clinics match", clinics.len(), total);
        Ok(clinics)
    }

    /// Doctors of the staff member's own clinic.
    pub async fn list_doctors(&self, session: &Session) -> Result<Vec<DoctorListing>, ClinicApiError> {
        self.client.get("/doctors/", Some(session)).await
    }
}
