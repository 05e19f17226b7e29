use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use provider_cell::{generate_slots, ProviderDirectory};

use crate::models::{present, AppointmentError, AvailabilityQuery};
use crate::services::ledger::AppointmentStore;

/// Free slots for a provider, date and service: the generated grid minus the
/// times that already hold a CONFIRMED booking.
pub struct AvailabilityResolver {
    store: Arc<dyn AppointmentStore>,
    providers: Arc<dyn ProviderDirectory>,
}

impl AvailabilityResolver {
    pub fn new(store: Arc<dyn AppointmentStore>, providers: Arc<dyn ProviderDirectory>) -> Self {
        Self { store, providers }
    }

    pub async fn get_availability(&self, query: AvailabilityQuery) -> Result<Vec<String>, AppointmentError> {
        let (Some(provider_id), Some(date), Some(service_type)) = (
            present(query.provider_id),
            present(query.date),
            present(query.service_type),
        ) else {
            return Err(AppointmentError::InvalidInput(
                "providerId, date, serviceType required".to_string(),
            ));
        };

        let provider_id = Uuid::parse_str(&provider_id).map_err(|_| AppointmentError::ProviderNotFound)?;
        let provider = self.providers
            .find_provider(provider_id)
            .await?
            .ok_or(AppointmentError::ProviderNotFound)?;
        let service = provider
            .find_service(&service_type)
            .ok_or(AppointmentError::ServiceNotFound)?;

        let grid = generate_slots(
            &provider.default_working_hours.start,
            &provider.default_working_hours.end,
            service.duration_minutes,
        );

        let booked: HashSet<String> = self.store
            .confirmed_for(provider_id, &date)
            .await?
            .into_iter()
            .map(|a| a.time)
            .collect();

        debug!("Provider {} on {}: {} slots, {} booked", provider_id, date, grid.len(), booked.len());

        Ok(grid.into_iter().filter(|slot| !booked.contains(slot)).collect())
    }
}
