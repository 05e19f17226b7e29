pub mod availability;
pub mod booking;
pub mod ledger;
pub mod listing;

pub use availability::AvailabilityResolver;
pub use booking::BookingService;
pub use ledger::{appointment_store, AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore};
pub use listing::ListingService;
