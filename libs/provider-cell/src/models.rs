use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::error::AppError;

use crate::services::slots::parse_time_of_day;

pub const DEFAULT_DAY_START: &str = "09:00";
pub const DEFAULT_DAY_END: &str = "17:00";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: String,
    pub end: String,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: DEFAULT_DAY_START.to_string(),
            end: DEFAULT_DAY_END.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceType {
    pub name: String,
    #[serde(alias = "duration_minutes")]
    pub duration_minutes: u32,
}

/// A bookable provider. Serialized camelCase for clients; PostgREST rows use
/// snake_case and are accepted through the aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: Uuid,
    pub name: String,
    #[serde(default, alias = "default_working_hours")]
    pub default_working_hours: WorkingHours,
    #[serde(default, alias = "service_types")]
    pub service_types: Vec<ServiceType>,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updated_at")]
    pub updated_at: DateTime<Utc>,
}

impl Provider {
    /// Exact, case-sensitive lookup in the provider's catalog.
    pub fn find_service(&self, name: &str) -> Option<&ServiceType> {
        self.service_types.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProviderRequest {
    pub name: String,
    pub default_working_hours: Option<WorkingHours>,
    #[serde(default)]
    pub service_types: Vec<ServiceType>,
}

impl CreateProviderRequest {
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.name.trim().is_empty() {
            return Err(ProviderError::Validation("Provider name is required".to_string()));
        }

        if let Some(hours) = &self.default_working_hours {
            let start = parse_time_of_day(&hours.start).ok_or_else(|| {
                ProviderError::Validation(format!("Invalid start time '{}', expected HH:mm", hours.start))
            })?;
            let end = parse_time_of_day(&hours.end).ok_or_else(|| {
                ProviderError::Validation(format!("Invalid end time '{}', expected HH:mm", hours.end))
            })?;
            if start >= end {
                return Err(ProviderError::Validation("Working hours must start before they end".to_string()));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for service in &self.service_types {
            if service.name.trim().is_empty() {
                return Err(ProviderError::Validation("Service type name is required".to_string()));
            }
            if service.duration_minutes == 0 {
                return Err(ProviderError::Validation(format!(
                    "Service type '{}' must have a positive duration", service.name
                )));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(ProviderError::Validation(format!(
                    "Duplicate service type '{}'", service.name
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedResponse {
    pub seeded: bool,
    pub message: String,
    pub provider: Provider,
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not found")]
    NotFound,

    #[error("Service type not found for this provider: {0}")]
    ServiceNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound => AppError::NotFound("Provider not found".to_string()),
            ProviderError::ServiceNotFound(_) => {
                AppError::BadRequest("Service type not found for this provider".to_string())
            }
            ProviderError::Validation(msg) => AppError::ValidationError(msg),
            ProviderError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}
