use std::sync::Arc;

use auth_cell::{user_directory, UserDirectory};
use provider_cell::{provider_directory, ProviderDirectory};
use shared_config::AppConfig;

use crate::services::{appointment_store, AppointmentStore, AvailabilityResolver, BookingService, ListingService};

/// Router state. The provider and user directories are shared with the
/// provider and auth cells so every router sees the same stores.
#[derive(Clone)]
pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn AppointmentStore>,
    pub providers: Arc<dyn ProviderDirectory>,
    pub users: Arc<dyn UserDirectory>,
}

impl AppointmentState {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn AppointmentStore>,
        providers: Arc<dyn ProviderDirectory>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self { config, store, providers, users }
    }

    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let store = appointment_store(&config);
        let providers = provider_directory(&config);
        let users = user_directory(&config);
        Self::new(config, store, providers, users)
    }

    pub fn booking(&self) -> BookingService {
        BookingService::new(self.store.clone(), self.providers.clone(), self.config.booking_validation)
    }

    pub fn availability(&self) -> AvailabilityResolver {
        AvailabilityResolver::new(self.store.clone(), self.providers.clone())
    }

    pub fn listing(&self) -> ListingService {
        ListingService::new(self.store.clone(), self.providers.clone(), self.users.clone())
    }
}
