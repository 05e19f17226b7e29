use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::try_join;
use uuid::Uuid;

use auth_cell::UserDirectory;
use provider_cell::ProviderDirectory;
use shared_models::auth::User;

use crate::models::{
    AdminAppointment, Appointment, AppointmentError, AppointmentFilter, MyAppointment,
    ProviderSummary, UserSummary,
};
use crate::services::booking::caller_id;
use crate::services::ledger::AppointmentStore;

/// Read-side listings. Appointments are fetched first, then the referenced
/// providers and users are looked up in bulk and merged in.
pub struct ListingService {
    store: Arc<dyn AppointmentStore>,
    providers: Arc<dyn ProviderDirectory>,
    users: Arc<dyn UserDirectory>,
}

impl ListingService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        providers: Arc<dyn ProviderDirectory>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self { store, providers, users }
    }

    pub async fn list_mine(&self, user: &User) -> Result<Vec<MyAppointment>, AppointmentError> {
        let appointments = self.store.list(&AppointmentFilter::for_user(caller_id(user)?)).await?;
        let providers = self.provider_summaries(&appointments).await?;

        Ok(appointments
            .into_iter()
            .map(|appointment| MyAppointment {
                provider: providers.get(&appointment.provider_id).cloned(),
                appointment,
            })
            .collect())
    }

    pub async fn list_admin(&self, filter: AppointmentFilter) -> Result<Vec<AdminAppointment>, AppointmentError> {
        let appointments = self.store.list(&filter).await?;
        let (providers, users) = try_join(
            self.provider_summaries(&appointments),
            self.user_summaries(&appointments),
        ).await?;

        Ok(appointments
            .into_iter()
            .map(|appointment| AdminAppointment {
                provider: providers.get(&appointment.provider_id).cloned(),
                user: users.get(&appointment.user_id).cloned(),
                appointment,
            })
            .collect())
    }

    async fn provider_summaries(
        &self,
        appointments: &[Appointment],
    ) -> Result<HashMap<Uuid, ProviderSummary>, AppointmentError> {
        let ids: Vec<Uuid> = distinct(appointments.iter().map(|a| a.provider_id));
        Ok(self.providers
            .find_providers(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, ProviderSummary { id: p.id, name: p.name }))
            .collect())
    }

    async fn user_summaries(
        &self,
        appointments: &[Appointment],
    ) -> Result<HashMap<Uuid, UserSummary>, AppointmentError> {
        let ids: Vec<Uuid> = distinct(appointments.iter().map(|a| a.user_id));
        Ok(self.users
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, UserSummary { id: u.id, name: u.name, email: u.email }))
            .collect())
    }
}

fn distinct(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}
