use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use provider_cell::{generate_slots, ProviderDirectory};
use shared_config::BookingValidation;
use shared_models::auth::User;

use crate::models::{
    is_calendar_date, Appointment, AppointmentError, BookAppointmentRequest, NewAppointment,
};
use crate::services::ledger::AppointmentStore;

pub(crate) fn caller_id(user: &User) -> Result<Uuid, AppointmentError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppointmentError::InvalidInput("Caller id is not a valid UUID".to_string()))
}

/// Books and cancels appointments. Slot uniqueness is left to the store; this
/// service never reads before it writes.
pub struct BookingService {
    store: Arc<dyn AppointmentStore>,
    providers: Arc<dyn ProviderDirectory>,
    validation: BookingValidation,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        providers: Arc<dyn ProviderDirectory>,
        validation: BookingValidation,
    ) -> Self {
        Self { store, providers, validation }
    }

    pub async fn book(&self, request: BookAppointmentRequest, user: &User) -> Result<Appointment, AppointmentError> {
        let user_id = caller_id(user)?;
        let request = request.into_new_appointment()?;

        if self.validation == BookingValidation::Strict {
            self.check_bookable(&request).await?;
        }

        debug!("Booking {} {} with provider {} for user {}",
               request.date, request.time, request.provider_id, user_id);

        let appointment = self.store
            .insert_confirmed(Appointment::confirmed(request, user_id))
            .await?;

        info!("Appointment {} confirmed for {} {}", appointment.id, appointment.date, appointment.time);
        Ok(appointment)
    }

    /// Owners may cancel their own appointments; admins may cancel any.
    pub async fn cancel(&self, appointment_id: &str, caller: &User) -> Result<Appointment, AppointmentError> {
        let id = Uuid::parse_str(appointment_id).map_err(|_| AppointmentError::NotFound)?;

        let appointment = self.store
            .find_by_id(id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if !appointment.is_owned_by(&caller.id) && !caller.is_admin() {
            warn!("User {} tried to cancel appointment {} owned by {}", caller.id, id, appointment.user_id);
            return Err(AppointmentError::Forbidden);
        }

        let cancelled = self.store.mark_cancelled(id).await?;
        info!("Appointment {} cancelled by {}", id, caller.id);
        Ok(cancelled)
    }

    async fn check_bookable(&self, request: &NewAppointment) -> Result<(), AppointmentError> {
        let provider = self.providers
            .find_provider(request.provider_id)
            .await?
            .ok_or(AppointmentError::ProviderNotFound)?;

        if !is_calendar_date(&request.date) {
            return Err(AppointmentError::InvalidInput("date must be a YYYY-MM-DD calendar date".to_string()));
        }

        let service = provider
            .find_service(&request.service_type)
            .ok_or(AppointmentError::ServiceNotFound)?;

        let grid = generate_slots(
            &provider.default_working_hours.start,
            &provider.default_working_hours.end,
            service.duration_minutes,
        );
        if !grid.contains(&request.time) {
            return Err(AppointmentError::InvalidInput(format!(
                "{} is not a {} slot for this provider", request.time, service.name
            )));
        }

        Ok(())
    }
}
