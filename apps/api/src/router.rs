use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use appointment_cell::{appointment_store, AppointmentState};
use auth_cell::router::auth_routes;
use auth_cell::{user_directory, AuthState};
use provider_cell::router::provider_routes;
use provider_cell::{provider_directory, ProviderState};
use shared_config::AppConfig;

/// Per-cell router states built over one set of stores.
pub struct AppStates {
    pub auth: AuthState,
    pub providers: ProviderState,
    pub appointments: AppointmentState,
}

impl AppStates {
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let users = user_directory(&config);
        let providers = provider_directory(&config);
        let store = appointment_store(&config);

        Self {
            auth: AuthState::new(config.clone(), users.clone()),
            providers: ProviderState::new(config.clone(), providers.clone()),
            appointments: AppointmentState::new(config, store, providers, users),
        }
    }
}

pub fn create_router(states: AppStates) -> Router {
    Router::new()
        .route("/", get(|| async { "Booking API is running!" }))
        .nest("/auth", auth_routes(states.auth))
        .nest("/providers", provider_routes(states.providers))
        .nest("/appointments", appointment_routes(states.appointments))
}
