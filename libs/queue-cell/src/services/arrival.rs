use chrono::NaiveDateTime;
use serde_json::json;
use tracing::{info, instrument, warn};

use shared_api_client::{ClinicApiClient, ClinicApiError};
use shared_config::AppConfig;
use shared_models::auth::Session;

use crate::models::{ArrivalOutcome, ArrivalResponse, Coordinates, Token, TokenStatus};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let (lat1, lon1) = (from.latitude.to_radians(), from.longitude.to_radians());
    let (lat2, lon2) = (to.latitude.to_radians(), to.longitude.to_radians());
    let (dlat, dlon) = (lat2 - lat1, lon2 - lon1);

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// GPS-gated arrival confirmation. The backend enforces both the geofence and
/// the time window; the checks here only avoid requests that cannot succeed.
pub struct ArrivalService {
    client: ClinicApiClient,
    geofence_radius_km: f64,
}

impl ArrivalService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: ClinicApiClient::new(config),
            geofence_radius_km: config.geofence_radius_km,
        }
    }

    /// Distance to the token's clinic, if the clinic location is known.
    pub fn distance_to_clinic(&self, token: &Token, position: Coordinates) -> Option<f64> {
        let clinic = token.clinic.as_ref()?.coordinates()?;
        Some(haversine_km(position, clinic))
    }

    pub fn within_geofence(&self, distance_km: f64) -> bool {
        distance_km <= self.geofence_radius_km
    }

    /// Posts the patient's position. `token` is the patient's current token if
    /// already fetched; with it, a closed window is refused locally.
    #[instrument(skip(self, session, token))]
    pub async fn confirm_arrival(
        &self,
        session: &Session,
        token: Option<&Token>,
        position: Coordinates,
        now: NaiveDateTime,
    ) -> Result<ArrivalOutcome, ClinicApiError> {
        position.validate().map_err(ClinicApiError::Validation)?;

        let mut distance_km = None;

        if let Some(token) = token {
            if token.status != TokenStatus::Waiting {
                return Err(ClinicApiError::Validation(format!(
                    "Token {} is {}, only waiting tokens can confirm arrival.",
                    token.label(),
                    token.status
                )));
            }

            if let Some(window) = token.confirmation_window(now) {
                if !window.is_open {
                    let message = window.message().unwrap_or_else(|| "Confirmation window is closed.".to_string());
                    return Err(ClinicApiError::Validation(message));
                }
            }

            distance_km = self.distance_to_clinic(token, position);
            if let Some(distance) = distance_km.filter(|d| !self.within_geofence(*d)) {
                warn!(
                    "Patient appears {:.1} km from clinic (limit {:.1} km), sending anyway",
                    distance, self.geofence_radius_km
                );
            }
        }

        let body = json!({
            "latitude": position.latitude,
            "longitude": position.longitude,
        });

        let response: ArrivalResponse = self.client
            .post("/tokens/confirm_arrival/", Some(session), body)
            .await?;

        info!("Arrival confirmed for token {}", response.token.label());

        Ok(ArrivalOutcome {
            message: response.message.unwrap_or_else(|| "Arrival confirmed successfully!".to_string()),
            token: response.token,
            distance_km,
        })
    }
}
