pub mod clinic;
pub mod directory;

pub use clinic::ClinicService;
pub use directory::filter_clinics;
