use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use auth_cell::AuthError;
use provider_cell::ProviderError;
use shared_database::DatabaseError;
use shared_models::error::AppError;

// ==============================================================================
// APPOINTMENT
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booked slot. Serialized camelCase; PostgREST rows arrive snake_case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    #[serde(alias = "provider_id")]
    pub provider_id: Uuid,
    #[serde(alias = "user_id")]
    pub user_id: Uuid,
    pub date: String,
    pub time: String,
    #[serde(alias = "service_type")]
    pub service_type: String,
    pub status: AppointmentStatus,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updated_at")]
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn confirmed(request: NewAppointment, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            provider_id: request.provider_id,
            user_id,
            date: request.date,
            time: request.time,
            service_type: request.service_type,
            status: AppointmentStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == AppointmentStatus::Confirmed
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.to_string() == user_id
    }

    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            provider_id: self.provider_id,
            date: self.date.clone(),
            time: self.time.clone(),
        }
    }
}

/// At most one CONFIRMED appointment exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub provider_id: Uuid,
    pub date: String,
    pub time: String,
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub provider_id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub service_type: Option<String>,
}

/// A booking request with every required field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub provider_id: Uuid,
    pub date: String,
    pub time: String,
    pub service_type: String,
}

/// `None` for missing or blank request fields.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl BookAppointmentRequest {
    pub fn into_new_appointment(self) -> Result<NewAppointment, AppointmentError> {
        let (Some(provider_id), Some(date), Some(time), Some(service_type)) = (
            present(self.provider_id),
            present(self.date),
            present(self.time),
            present(self.service_type),
        ) else {
            return Err(AppointmentError::InvalidInput(
                "providerId, date, time, serviceType required".to_string(),
            ));
        };

        let provider_id = Uuid::parse_str(&provider_id).map_err(|_| {
            AppointmentError::InvalidInput("providerId must be a valid UUID".to_string())
        })?;

        Ok(NewAppointment { provider_id, date, time, service_type })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub provider_id: Option<String>,
    pub date: Option<String>,
    pub service_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub available_slots: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminListQuery {
    pub provider_id: Option<String>,
    pub date: Option<String>,
}

/// Exact-match filter over the ledger. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub provider_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub date: Option<String>,
}

impl AppointmentFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self { user_id: Some(user_id), ..Self::default() }
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.provider_id.map_or(true, |id| appointment.provider_id == id)
            && self.user_id.map_or(true, |id| appointment.user_id == id)
            && self.date.as_deref().map_or(true, |date| appointment.date == date)
    }
}

impl TryFrom<AdminListQuery> for AppointmentFilter {
    type Error = AppointmentError;

    fn try_from(query: AdminListQuery) -> Result<Self, Self::Error> {
        let provider_id = present(query.provider_id)
            .map(|id| Uuid::parse_str(&id))
            .transpose()
            .map_err(|_| AppointmentError::InvalidInput("providerId must be a valid UUID".to_string()))?;

        Ok(Self {
            provider_id,
            user_id: None,
            date: present(query.date),
        })
    }
}

pub fn is_calendar_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

// ==============================================================================
// ENRICHED VIEWS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// An appointment as its owner sees it. `provider` is null when the provider
/// no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyAppointment {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub provider: Option<ProviderSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAppointment {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub provider: Option<ProviderSummary>,
    pub user: Option<UserSummary>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Provider not found")]
    ProviderNotFound,

    #[error("Service type not found for this provider")]
    ServiceNotFound,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Slot already booked")]
    SlotUnavailable,

    #[error("Not allowed to cancel this appointment")]
    Forbidden,

    #[error("Directory lookup failed: {0}")]
    Directory(String),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

impl From<ProviderError> for AppointmentError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound => AppointmentError::ProviderNotFound,
            ProviderError::ServiceNotFound(_) => AppointmentError::ServiceNotFound,
            ProviderError::Validation(msg) => AppointmentError::InvalidInput(msg),
            ProviderError::Storage(e) => AppointmentError::Storage(e),
        }
    }
}

impl From<AuthError> for AppointmentError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Storage(e) => AppointmentError::Storage(e),
            other => AppointmentError::Directory(other.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound | AppointmentError::ProviderNotFound => {
                AppError::NotFound(err.to_string())
            }
            AppointmentError::ServiceNotFound | AppointmentError::InvalidInput(_) => {
                AppError::BadRequest(err.to_string())
            }
            AppointmentError::SlotUnavailable => AppError::Conflict(err.to_string()),
            AppointmentError::Forbidden => AppError::Forbidden(err.to_string()),
            AppointmentError::Directory(msg) => AppError::Internal(msg),
            AppointmentError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}
