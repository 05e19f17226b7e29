use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_config::{AppConfig, StorageBackend};
use shared_database::supabase::{in_list, SupabaseClient};

use crate::models::{normalize_email, AuthError, UserAccount};

const USERS_TABLE: &str = "users";

/// Account storage. Emails are unique, compared after normalization.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAccount>, AuthError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AuthError>;

    /// Accounts with the given ids; unknown ids are skipped.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<UserAccount>, AuthError>;

    /// Fails with `EmailTaken` when the email is already registered.
    async fn insert(&self, account: UserAccount) -> Result<UserAccount, AuthError>;
}

pub fn user_directory(config: &AppConfig) -> Arc<dyn UserDirectory> {
    match config.storage_backend {
        StorageBackend::Memory => Arc::new(InMemoryUserDirectory::new()),
        StorageBackend::Supabase => Arc::new(SupabaseUserDirectory::new(config)),
    }
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, UserAccount>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAccount>, AuthError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AuthError> {
        let email = normalize_email(email);
        Ok(self.users.read().await.values().find(|u| u.email == email).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<UserAccount>, AuthError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn insert(&self, mut account: UserAccount) -> Result<UserAccount, AuthError> {
        account.email = normalize_email(&account.email);

        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == account.email) {
            return Err(AuthError::EmailTaken);
        }
        users.insert(account.id, account.clone());
        Ok(account)
    }
}

pub struct SupabaseUserDirectory {
    supabase: SupabaseClient,
}

impl SupabaseUserDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl UserDirectory for SupabaseUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAccount>, AuthError> {
        let rows: Vec<UserAccount> = self.supabase
            .select(USERS_TABLE, &format!("id=eq.{}", id))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AuthError> {
        let rows: Vec<UserAccount> = self.supabase
            .select(USERS_TABLE, &format!("email=eq.{}", urlencoding::encode(&normalize_email(email))))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<UserAccount>, AuthError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = format!("id={}", in_list(ids.iter().map(Uuid::to_string)));
        Ok(self.supabase.select(USERS_TABLE, &filter).await?)
    }

    async fn insert(&self, account: UserAccount) -> Result<UserAccount, AuthError> {
        let row = json!({
            "id": account.id,
            "name": account.name,
            "email": normalize_email(&account.email),
            "role": account.role,
            "password_hash": account.password_hash,
            "created_at": account.created_at.to_rfc3339()
        });

        match self.supabase.insert::<UserAccount>(USERS_TABLE, row).await {
            Ok(stored) => {
                debug!("User stored with ID: {}", stored.id);
                Ok(stored)
            }
            Err(e) if e.is_conflict() => Err(AuthError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }
}
