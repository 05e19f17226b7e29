use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::{AppConfig, StorageBackend};
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentError, AppointmentFilter, AppointmentStatus, SlotKey};

const APPOINTMENTS_TABLE: &str = "appointments";

/// Authoritative appointment storage.
///
/// `insert_confirmed` is the only place the one-CONFIRMED-per-slot rule is
/// enforced, and each implementation enforces it atomically: the in-memory
/// store under a single write guard, PostgREST through the partial unique
/// index on `(provider_id, date, time) where status = 'CONFIRMED'`.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Fails with `SlotUnavailable` when the slot already has a CONFIRMED booking.
    async fn insert_confirmed(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    /// CONFIRMED appointments for one provider on one date.
    async fn confirmed_for(&self, provider_id: Uuid, date: &str) -> Result<Vec<Appointment>, AppointmentError>;

    /// Sets CANCELLED. Re-cancelling rewrites the same state.
    async fn mark_cancelled(&self, id: Uuid) -> Result<Appointment, AppointmentError>;

    /// Matching appointments sorted by (date, time).
    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError>;
}

pub fn appointment_store(config: &AppConfig) -> Arc<dyn AppointmentStore> {
    match config.storage_backend {
        StorageBackend::Memory => Arc::new(InMemoryAppointmentStore::new()),
        StorageBackend::Supabase => Arc::new(SupabaseAppointmentStore::new(config)),
    }
}

fn sort_by_slot(appointments: &mut [Appointment]) {
    appointments.sort_by(|a, b| {
        (a.date.as_str(), a.time.as_str(), a.created_at)
            .cmp(&(b.date.as_str(), b.time.as_str(), b.created_at))
    });
}

#[derive(Default)]
struct Ledger {
    appointments: HashMap<Uuid, Appointment>,
    confirmed: HashMap<SlotKey, Uuid>,
}

/// Appointments and the confirmed-slot index share one lock, so claiming a
/// slot and storing the record happen in the same critical section.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    ledger: RwLock<Ledger>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn insert_confirmed(&self, mut appointment: Appointment) -> Result<Appointment, AppointmentError> {
        appointment.status = AppointmentStatus::Confirmed;
        let key = appointment.slot_key();

        let mut ledger = self.ledger.write().await;
        if ledger.confirmed.contains_key(&key) {
            warn!("Slot {} {} already confirmed for provider {}", key.date, key.time, key.provider_id);
            return Err(AppointmentError::SlotUnavailable);
        }

        ledger.confirmed.insert(key, appointment.id);
        ledger.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.ledger.read().await.appointments.get(&id).cloned())
    }

    async fn confirmed_for(&self, provider_id: Uuid, date: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let ledger = self.ledger.read().await;
        let mut booked: Vec<Appointment> = ledger
            .appointments
            .values()
            .filter(|a| a.is_confirmed() && a.provider_id == provider_id && a.date == date)
            .cloned()
            .collect();
        sort_by_slot(&mut booked);
        Ok(booked)
    }

    async fn mark_cancelled(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        let mut guard = self.ledger.write().await;
        let ledger = &mut *guard;

        let appointment = ledger.appointments.get_mut(&id).ok_or(AppointmentError::NotFound)?;
        if appointment.is_confirmed() {
            let key = appointment.slot_key();
            if ledger.confirmed.get(&key) == Some(&id) {
                ledger.confirmed.remove(&key);
            }
        }

        appointment.status = AppointmentStatus::Cancelled;
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError> {
        let ledger = self.ledger.read().await;
        let mut appointments: Vec<Appointment> = ledger
            .appointments
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        sort_by_slot(&mut appointments);
        Ok(appointments)
    }
}

pub struct SupabaseAppointmentStore {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

fn eq(column: &str, value: &str) -> String {
    format!("{}=eq.{}", column, urlencoding::encode(value))
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn insert_confirmed(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let row = json!({
            "id": appointment.id,
            "provider_id": appointment.provider_id,
            "user_id": appointment.user_id,
            "date": appointment.date,
            "time": appointment.time,
            "service_type": appointment.service_type,
            "status": AppointmentStatus::Confirmed.as_str(),
            "created_at": appointment.created_at.to_rfc3339(),
            "updated_at": appointment.updated_at.to_rfc3339()
        });

        match self.supabase.insert::<Appointment>(APPOINTMENTS_TABLE, row).await {
            Ok(stored) => {
                debug!("Appointment stored with ID: {}", stored.id);
                Ok(stored)
            }
            Err(e) if e.is_conflict() => {
                warn!("Slot {} {} already confirmed for provider {}",
                      appointment.date, appointment.time, appointment.provider_id);
                Err(AppointmentError::SlotUnavailable)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let rows: Vec<Appointment> = self.supabase
            .select(APPOINTMENTS_TABLE, &format!("id=eq.{}", id))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn confirmed_for(&self, provider_id: Uuid, date: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let query = [
            format!("provider_id=eq.{}", provider_id),
            eq("date", date),
            eq("status", AppointmentStatus::Confirmed.as_str()),
            "order=time.asc".to_string(),
        ].join("&");

        Ok(self.supabase.select(APPOINTMENTS_TABLE, &query).await?)
    }

    async fn mark_cancelled(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        let patch = json!({
            "status": AppointmentStatus::Cancelled.as_str(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let rows: Vec<Appointment> = self.supabase
            .update(APPOINTMENTS_TABLE, &format!("id=eq.{}", id), patch)
            .await?;
        rows.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError> {
        let mut query = Vec::new();
        if let Some(provider_id) = filter.provider_id {
            query.push(format!("provider_id=eq.{}", provider_id));
        }
        if let Some(user_id) = filter.user_id {
            query.push(format!("user_id=eq.{}", user_id));
        }
        if let Some(date) = &filter.date {
            query.push(eq("date", date));
        }
        query.push("order=date.asc,time.asc,created_at.asc".to_string());

        let mut appointments: Vec<Appointment> = self.supabase
            .select(APPOINTMENTS_TABLE, &query.join("&"))
            .await?;
        sort_by_slot(&mut appointments);
        Ok(appointments)
    }
}
