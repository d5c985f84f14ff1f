pub mod arrival;
pub mod monitor;
pub mod poller;
pub mod queue;
pub mod token;

pub use arrival::{haversine_km, ArrivalService};
pub use monitor::{QueueLimits, QueueMonitor};
pub use poller::{PollSnapshot, QueuePoller};
pub use queue::{order_live_queue, queue_position};
pub use token::TokenService;
