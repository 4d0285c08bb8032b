pub mod event;
pub mod registration;

pub use event::{CapacityStatus, Event, EventPatch, NewEvent};
pub use registration::{NewRegistration, Registration};
