use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::ProviderState;

pub fn provider_routes(state: ProviderState) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_providers))
        .route("/{provider_id}", get(handlers::get_provider));

    // Catalog changes are admin-only
    let protected_routes = Router::new()
        .route("/", post(handlers::create_provider))
        .route("/seed", post(handlers::seed_providers))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
