pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AvailabilityError, AvailabilitySlot, GenerateSlotsRequest, NewSlot};
pub use services::availability::AvailabilityService;
pub use services::generator::{generate_slots, SlotSequence};
