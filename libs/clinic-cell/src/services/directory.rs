use crate::models::{ClinicListing, ClinicQuery};

fn matches(value: Option<&str>, needle: &str) -> bool {
    value.map_or(false, |value| value.to_lowercase().contains(needle))
}

/// Narrows the public clinic list. `city` matches case-insensitively on the
/// clinic; `specialization` keeps only matching doctors and drops clinics
/// left without any.
pub fn filter_clinics(clinics: Vec<ClinicListing>, query: &ClinicQuery) -> Vec<ClinicListing> {
    let city = query.city.as_deref().map(str::trim).filter(|c| !c.is_empty()).map(str::to_lowercase);
    let specialization = query
        .specialization
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    clinics
        .into_iter()
        .filter(|clinic| city.as_deref().map_or(true, |city| matches(clinic.city.as_deref(), city)))
        .filter_map(|mut clinic| {
            let Some(wanted) = specialization.as_deref() else {
                return Some(clinic);
            };
            clinic.doctors.retain(|doctor| matches(doctor.specialization.as_deref(), wanted));
            (!clinic.doctors.is_empty()).then_some(clinic)
        })
        .collect()
}
