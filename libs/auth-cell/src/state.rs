use std::sync::Arc;

use shared_config::AppConfig;

use crate::services::account::AccountService;
use crate::services::users::{user_directory, UserDirectory};

#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserDirectory>,
}

impl AuthState {
    pub fn new(config: Arc<AppConfig>, users: Arc<dyn UserDirectory>) -> Self {
        Self { config, users }
    }

    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let users = user_directory(&config);
        Self::new(config, users)
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.users.clone(), self.config.clone())
    }
}
