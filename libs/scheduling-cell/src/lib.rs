pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Appointment, AppointmentStatus, AvailabilityQuery, BlackoutEntry, BookAppointmentRequest,
    BookingConfirmation, SchedulingError, SlotDefinition, SlotView, Weekday,
};
