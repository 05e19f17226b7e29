use std::sync::Arc;

use shared_config::AppConfig;

use crate::services::directory::{provider_directory, ProviderDirectory};

#[derive(Clone)]
pub struct ProviderState {
    pub config: Arc<AppConfig>,
    pub directory: Arc<dyn ProviderDirectory>,
}

impl ProviderState {
    pub fn new(config: Arc<AppConfig>, directory: Arc<dyn ProviderDirectory>) -> Self {
        Self { config, directory }
    }

    /// State backed by whichever store the config selects.
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let directory = provider_directory(&config);
        Self::new(config, directory)
    }
}
