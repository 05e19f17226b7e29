use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    CreateProviderRequest, Provider, ProviderError, SeedResponse, ServiceType, WorkingHours,
};
use crate::services::directory::ProviderDirectory;

pub const SEED_PROVIDER_NAME: &str = "Hydro Expert - Central Farm";

pub struct ProviderService {
    directory: Arc<dyn ProviderDirectory>,
}

impl ProviderService {
    pub fn new(directory: Arc<dyn ProviderDirectory>) -> Self {
        Self { directory }
    }

    pub async fn list_providers(&self) -> Result<Vec<Provider>, ProviderError> {
        self.directory.list_providers().await
    }

    /// Unknown and malformed ids are both reported as `NotFound`.
    pub async fn get_provider(&self, provider_id: &str) -> Result<Provider, ProviderError> {
        let id = Uuid::parse_str(provider_id).map_err(|_| ProviderError::NotFound)?;
        self.directory
            .find_provider(id)
            .await?
            .ok_or(ProviderError::NotFound)
    }

    pub async fn create_provider(&self, request: CreateProviderRequest) -> Result<Provider, ProviderError> {
        request.validate()?;
        debug!("Creating provider: {}", request.name);

        let now = Utc::now();
        let provider = Provider {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            default_working_hours: request.default_working_hours.unwrap_or_default(),
            service_types: request.service_types,
            created_at: now,
            updated_at: now,
        };

        let provider = self.directory.insert_provider(provider).await?;
        info!("Provider {} created with {} service types", provider.id, provider.service_types.len());
        Ok(provider)
    }

    /// Creates the default provider unless the catalog already has one.
    pub async fn seed_default(&self) -> Result<SeedResponse, ProviderError> {
        if let Some(existing) = self.directory.list_providers().await?.into_iter().next() {
            return Ok(SeedResponse {
                seeded: false,
                message: "Provider already seeded".to_string(),
                provider: existing,
            });
        }

        let provider = self.create_provider(CreateProviderRequest {
            name: SEED_PROVIDER_NAME.to_string(),
            default_working_hours: Some(WorkingHours::default()),
            service_types: vec![
                ServiceType { name: "Consultation".to_string(), duration_minutes: 30 },
                ServiceType { name: "Site Visit".to_string(), duration_minutes: 60 },
            ],
        }).await?;

        Ok(SeedResponse {
            seeded: true,
            message: "Seeded provider".to_string(),
            provider,
        })
    }
}
