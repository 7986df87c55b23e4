pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{BookingConfirmation, BookingError, BookingRequest, CustomerNotification};
pub use services::booking::BookingService;
