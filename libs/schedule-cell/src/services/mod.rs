pub mod schedule;
pub mod slots;
pub mod window;

pub use schedule::ScheduleService;
pub use slots::{compute_slots, filter_past_slots, format_slot, parse_time_of_day};
pub use window::compute_confirmation_window;
