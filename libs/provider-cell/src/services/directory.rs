use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_config::{AppConfig, StorageBackend};
use shared_database::supabase::{in_list, SupabaseClient};

use crate::models::{Provider, ProviderError};

const PROVIDERS_TABLE: &str = "providers";

/// Read/write access to the provider catalog.
#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    async fn find_provider(&self, id: Uuid) -> Result<Option<Provider>, ProviderError>;

    /// Providers with the given ids; unknown ids are skipped.
    async fn find_providers(&self, ids: &[Uuid]) -> Result<Vec<Provider>, ProviderError>;

    /// All providers ordered by name.
    async fn list_providers(&self) -> Result<Vec<Provider>, ProviderError>;

    async fn insert_provider(&self, provider: Provider) -> Result<Provider, ProviderError>;
}

pub fn provider_directory(config: &AppConfig) -> Arc<dyn ProviderDirectory> {
    match config.storage_backend {
        StorageBackend::Memory => Arc::new(InMemoryProviderDirectory::new()),
        StorageBackend::Supabase => Arc::new(SupabaseProviderDirectory::new(config)),
    }
}

#[derive(Default)]
pub struct InMemoryProviderDirectory {
    providers: RwLock<HashMap<Uuid, Provider>>,
}

impl InMemoryProviderDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProviderDirectory for InMemoryProviderDirectory {
    async fn find_provider(&self, id: Uuid) -> Result<Option<Provider>, ProviderError> {
        Ok(self.providers.read().await.get(&id).cloned())
    }

    async fn find_providers(&self, ids: &[Uuid]) -> Result<Vec<Provider>, ProviderError> {
        let providers = self.providers.read().await;
        Ok(ids.iter().filter_map(|id| providers.get(id).cloned()).collect())
    }

    async fn list_providers(&self) -> Result<Vec<Provider>, ProviderError> {
        let mut providers: Vec<Provider> = self.providers.read().await.values().cloned().collect();
        providers.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(providers)
    }

    async fn insert_provider(&self, provider: Provider) -> Result<Provider, ProviderError> {
        self.providers.write().await.insert(provider.id, provider.clone());
        Ok(provider)
    }
}

pub struct SupabaseProviderDirectory {
    supabase: SupabaseClient,
}

impl SupabaseProviderDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl ProviderDirectory for SupabaseProviderDirectory {
    async fn find_provider(&self, id: Uuid) -> Result<Option<Provider>, ProviderError> {
        debug!("Fetching provider {}", id);
        let rows: Vec<Provider> = self.supabase
            .select(PROVIDERS_TABLE, &format!("id=eq.{}", id))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_providers(&self, ids: &[Uuid]) -> Result<Vec<Provider>, ProviderError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = format!("id={}", in_list(ids.iter().map(Uuid::to_string)));
        Ok(self.supabase.select(PROVIDERS_TABLE, &filter).await?)
    }

    async fn list_providers(&self) -> Result<Vec<Provider>, ProviderError> {
        Ok(self.supabase.select(PROVIDERS_TABLE, "order=name.asc").await?)
    }

    async fn insert_provider(&self, provider: Provider) -> Result<Provider, ProviderError> {
        let row = json!({
            "id": provider.id,
            "name": provider.name,
            "default_working_hours": {
                "start": provider.default_working_hours.start,
                "end": provider.default_working_hours.end
            },
            "service_types": provider.service_types.iter().map(|s| json!({
                "name": s.name,
                "duration_minutes": s.duration_minutes
            })).collect::<Vec<_>>(),
            "created_at": provider.created_at.to_rfc3339(),
            "updated_at": provider.updated_at.to_rfc3339()
        });

        let stored: Provider = self.supabase.insert(PROVIDERS_TABLE, row).await?;
        debug!("Provider stored with ID: {}", stored.id);
        Ok(stored)
    }
}
