use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorListing {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub specialization: Option<String>,
}

/// A clinic with the doctors patients can book, as listed publicly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicListing {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub doctors: Vec<DoctorListing>,
    /// Predicted wait in minutes.
    #[serde(default)]
    pub average_wait_time: Option<f64>,
    /// Tokens issued today.
    #[serde(default)]
    pub total_tokens: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClinicQuery {
    pub city: Option<String>,
    pub specialization: Option<String>,
}
