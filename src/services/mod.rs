pub mod events;
pub mod registrations;
pub mod workflow;

pub use events::{EventRepository, EventView};
pub use registrations::RegistrationRepository;
pub use workflow::{CapacityView, RegistrationWorkflow};
